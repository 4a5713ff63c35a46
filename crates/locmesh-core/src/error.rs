//! Error types and handling for locmesh-core operations.
//!
//! Errors are categorized so callers can decide how to degrade:
//!
//! - **Store errors**: the backing store could not be reached or queried
//! - **I/O errors**: reading or publishing sitemap files
//! - **XML errors**: writing or reading sitemap documents
//! - **Configuration errors**: invalid settings or config files
//! - **Cancellation**: a batch run was stopped between locale/template boundaries
//!
//! Absent rows are never errors. A missing variant resolves to `None` and a
//! missing concept yields an empty mesh; only transport failures surface here.
//!
//! ```rust
//! use locmesh_core::Error;
//!
//! let err = Error::StoreUnavailable("connection reset".to_string());
//! assert!(err.is_recoverable());
//! assert_eq!(err.category(), "store");
//! ```

use thiserror::Error;

/// The main error type for locmesh-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The backing store failed to answer a query.
    ///
    /// Request-time callers degrade to a minimal metadata contract; batch
    /// callers abort the affected partition without publishing it.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing or reading sitemap XML failed.
    #[error("XML error: {0}")]
    Xml(String),

    /// Serialization or deserialization failed (snapshots, manifests).
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller supplied a value that cannot be used (bad base URL, bad locale).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Moving staged documents into place failed.
    #[error("Publish error: {0}")]
    Publish(String),

    /// A batch run observed its cancellation flag.
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Check if retrying the whole operation might succeed.
    ///
    /// This layer never retries on its own; the flag is a hint for the caller
    /// deciding between a rerun and serving the last-good artifact.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::StoreUnavailable(_) | Self::Cancelled => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a string identifier for logs.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::StoreUnavailable(_) => "store",
            Self::Io(_) => "io",
            Self::Xml(_) => "xml",
            Self::Serialization(_) => "serialization",
            Self::Config(_) => "config",
            Self::InvalidInput(_) => "invalid_input",
            Self::Publish(_) => "publish",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display_formatting() {
        let cases = [
            (
                Error::StoreUnavailable("timeout".into()),
                "Store unavailable: timeout",
            ),
            (Error::Xml("bad tag".into()), "XML error: bad tag"),
            (Error::Cancelled, "Operation cancelled"),
            (
                Error::InvalidInput("base url".into()),
                "Invalid input: base url",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_recoverability() {
        assert!(Error::StoreUnavailable("down".into()).is_recoverable());
        assert!(Error::Cancelled.is_recoverable());
        assert!(Error::Io(io::Error::new(io::ErrorKind::Interrupted, "eintr")).is_recoverable());

        assert!(!Error::Io(io::Error::new(io::ErrorKind::PermissionDenied, "no")).is_recoverable());
        assert!(!Error::Config("missing".into()).is_recoverable());
        assert!(!Error::Xml("broken".into()).is_recoverable());
    }

    #[test]
    fn test_categories_are_distinct() {
        let errors = [
            Error::StoreUnavailable(String::new()),
            Error::Io(io::Error::other("x")),
            Error::Xml(String::new()),
            Error::Serialization(String::new()),
            Error::Config(String::new()),
            Error::InvalidInput(String::new()),
            Error::Publish(String::new()),
            Error::Cancelled,
        ];
        let mut categories: Vec<_> = errors.iter().map(Error::category).collect();
        categories.sort_unstable();
        categories.dedup();
        assert_eq!(categories.len(), errors.len());
    }

    #[test]
    fn test_json_error_converts_to_serialization() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.category(), "serialization");
    }
}
