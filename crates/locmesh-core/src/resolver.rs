//! Exact-path variant resolution.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::store::{StoreReader, VariantStore};
use crate::{Result, Variant};

/// Resolves a URL path to its stored variant.
///
/// Paths are matched byte for byte. `/US/en/city/miami` and
/// `/us/en/city/miami/` are different paths; callers canonicalize first.
pub struct VariantResolver<S: ?Sized> {
    reader: StoreReader<S>,
}

impl<S: ?Sized> Clone for VariantResolver<S> {
    fn clone(&self) -> Self {
        Self {
            reader: self.reader.clone(),
        }
    }
}

impl<S: VariantStore + ?Sized> VariantResolver<S> {
    /// Create a resolver over a shared store.
    pub const fn new(store: Arc<S>) -> Self {
        Self::from_reader(StoreReader::new(store))
    }

    /// Create a resolver sharing an existing reader.
    pub const fn from_reader(reader: StoreReader<S>) -> Self {
        Self { reader }
    }

    /// Resolve `path` to its variant.
    ///
    /// Returns `Ok(None)` when no row matches or the row fails validation.
    ///
    /// # Errors
    ///
    /// Only [`crate::Error::StoreUnavailable`] is returned.
    #[instrument(level = "debug", skip(self))]
    pub async fn resolve(&self, path: &str) -> Result<Option<Variant>> {
        let variant = self.reader.variant_by_path(path).await?;
        if variant.is_none() {
            debug!(path, "No variant for path");
        }
        Ok(variant)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::testing::{DownStore, row};
    use crate::store::{Snapshot, SnapshotStore};
    use crate::{ConceptId, Error};

    fn resolver() -> VariantResolver<SnapshotStore> {
        VariantResolver::new(Arc::new(SnapshotStore::new(Snapshot {
            variants: vec![
                row(4, "US", "en", "/us/en/corridor/i-75"),
                row(4, "US", "es", "/us/es/corridor/i-75"),
            ],
            ..Snapshot::default()
        })))
    }

    #[tokio::test]
    async fn resolves_exact_path() {
        let variant = resolver()
            .resolve("/us/es/corridor/i-75")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(variant.concept_id, ConceptId(4));
        assert_eq!(variant.hreflang, "es-US");
    }

    #[tokio::test]
    async fn does_not_normalize() {
        let resolver = resolver();
        for path in [
            "/us/en/corridor/i-75/",
            "/US/en/corridor/i-75",
            "us/en/corridor/i-75",
            "",
        ] {
            assert!(resolver.resolve(path).await.unwrap().is_none(), "{path}");
        }
    }

    #[tokio::test]
    async fn resolves_numeric_region_tag() {
        let mut latam = row(7, "MX", "es", "/mx/es/city/monterrey");
        latam.hreflang = Some("es-419".into());
        let resolver = VariantResolver::new(Arc::new(SnapshotStore::new(Snapshot {
            variants: vec![latam],
            ..Snapshot::default()
        })));

        let variant = resolver
            .resolve("/mx/es/city/monterrey")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(variant.hreflang, "es-419");
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let resolver = VariantResolver::new(Arc::new(DownStore));
        let err = resolver.resolve("/us/en/city/miami").await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }
}
