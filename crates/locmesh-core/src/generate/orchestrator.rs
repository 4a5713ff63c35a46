//! Batch sitemap generation with bounded fan-out over locales.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{error, info, instrument, warn};

use super::manifest::PublishManifest;
use super::publisher::{
    CommittedDocument, PublishStatus, SitemapPublisher, StagedDocument, StagingArea,
};
use crate::sitemap::{SitemapLocation, SitemapPartitioner};
use crate::store::VariantStore;
use crate::{Error, Locale, Result};

/// Cooperative cancellation shared between a run and its controller.
///
/// Checked before each locale and each template; work already in flight for
/// a template finishes, but nothing from a cancelled run is committed.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A flag that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A document that could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationFailure {
    /// Document that was skipped.
    pub location: SitemapLocation,
    /// Why.
    pub error: String,
}

/// Summary of a generation run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    /// Run identifier.
    pub run_id: String,
    /// Date used for `<lastmod>`.
    pub generated_on: NaiveDate,
    /// Active locales covered.
    pub locales: usize,
    /// Documents committed, in commit order.
    pub documents: Vec<CommittedDocument>,
    /// Documents that failed; their last-good versions stay live.
    pub failures: Vec<GenerationFailure>,
}

impl GenerationReport {
    /// Whether every document, master index included, was published.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Documents whose bytes changed.
    pub fn written(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| d.status == PublishStatus::Written)
            .count()
    }

    /// Documents left untouched because nothing changed.
    pub fn unchanged(&self) -> usize {
        self.documents.len() - self.written()
    }

    /// Total `<url>` entries across published partitions.
    pub fn url_count(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| matches!(d.location, SitemapLocation::Partition { .. }))
            .map(|d| d.entry_count)
            .sum()
    }
}

/// Staged output of one locale.
struct LocaleOutcome {
    locale: Locale,
    partitions: Vec<StagedDocument>,
    index: Option<StagedDocument>,
    failures: Vec<GenerationFailure>,
}

/// Runs the partitioner over every active locale and publishes the result.
///
/// ## Publish protocol
///
/// 1. Render and stage every document of every locale (bounded fan-out).
/// 2. If cancelled, return [`Error::Cancelled`] without committing anything.
/// 3. Per locale: commit successful partitions, then the locale index only if
///    all its partitions succeeded.
/// 4. Commit the master index only if every locale succeeded.
/// 5. Save the manifest.
pub struct SitemapGenerator<S: ?Sized> {
    partitioner: SitemapPartitioner<S>,
    publisher: SitemapPublisher,
    concurrency: usize,
    cancel: CancelFlag,
}

impl<S: VariantStore + ?Sized> SitemapGenerator<S> {
    /// Default number of locales rendered concurrently.
    pub const DEFAULT_CONCURRENCY: usize = 4;

    /// Upper bound on concurrent locales.
    pub const MAX_CONCURRENCY: usize = 32;

    /// Create a generator with default concurrency.
    pub fn new(partitioner: SitemapPartitioner<S>, publisher: SitemapPublisher) -> Self {
        Self {
            partitioner,
            publisher,
            concurrency: Self::DEFAULT_CONCURRENCY,
            cancel: CancelFlag::new(),
        }
    }

    /// Set locale concurrency (clamped to 1..=32).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, Self::MAX_CONCURRENCY);
        self
    }

    /// Share a cancellation flag with the caller.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Effective concurrency.
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// The cancellation flag observed by this generator.
    pub const fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Generate and publish the full sitemap tree.
    ///
    /// Partition and locale failures are recorded in the report; the run
    /// itself only fails on cancellation, on failure to list locales, or on
    /// publishing errors.
    #[instrument(skip(self), fields(generated_on = %self.partitioner.generated_on()))]
    pub async fn run(&self) -> Result<GenerationReport> {
        self.cancel.check()?;

        let run_id = format!(
            "{}-{}",
            Utc::now().format("%Y%m%dT%H%M%S%3f"),
            std::process::id()
        );
        let staging = self.publisher.begin(&run_id)?;
        let locales = self.partitioner.active_locales().await?;
        info!(run_id = %run_id, locales = locales.len(), concurrency = self.concurrency, "Starting sitemap generation");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let outcomes: Vec<Result<LocaleOutcome>> = stream::iter(locales.iter().cloned())
            .map(|locale| {
                let semaphore = Arc::clone(&semaphore);
                let staging = &staging;
                async move {
                    let _permit = semaphore.acquire().await;
                    self.render_locale(locale, staging).await
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut staged_locales = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            staged_locales.push(outcome?);
        }
        // A locale may have finished after cancellation was requested.
        self.cancel.check()?;

        staged_locales.sort_by(|a, b| a.locale.code.cmp(&b.locale.code));
        let report = self.commit(&staging, &locales, staged_locales, run_id)?;

        PublishManifest::from_report(&report).save(self.publisher.root())?;
        info!(
            written = report.written(),
            unchanged = report.unchanged(),
            failures = report.failures.len(),
            urls = report.url_count(),
            "Sitemap generation finished"
        );
        Ok(report)
    }

    #[instrument(skip_all, fields(locale = %locale.code))]
    async fn render_locale(&self, locale: Locale, staging: &StagingArea) -> Result<LocaleOutcome> {
        self.cancel.check()?;

        let mut outcome = LocaleOutcome {
            locale,
            partitions: Vec::new(),
            index: None,
            failures: Vec::new(),
        };
        let code = outcome.locale.code.clone();

        let templates = match self.partitioner.template_keys(&code).await {
            Ok(templates) => templates,
            Err(e) => {
                error!(error = %e, "Failed to list templates; keeping last-good locale index");
                outcome.failures.push(GenerationFailure {
                    location: SitemapLocation::locale_index(&code),
                    error: e.to_string(),
                });
                return Ok(outcome);
            },
        };

        for template in &templates {
            self.cancel.check()?;
            let staged = self
                .partitioner
                .template_partition(&code, template)
                .await
                .and_then(|doc| staging.stage(&doc));
            match staged {
                Ok(staged) => outcome.partitions.push(staged),
                Err(e) => {
                    error!(template = %template, error = %e, "Partition failed; keeping last-good file");
                    outcome.failures.push(GenerationFailure {
                        location: SitemapLocation::partition(&code, template),
                        error: e.to_string(),
                    });
                },
            }
        }

        if outcome.failures.is_empty() {
            let index = self
                .partitioner
                .locale_index_for(&code, &templates)
                .and_then(|doc| staging.stage(&doc));
            match index {
                Ok(index) => outcome.index = Some(index),
                Err(e) => outcome.failures.push(GenerationFailure {
                    location: SitemapLocation::locale_index(&code),
                    error: e.to_string(),
                }),
            }
        } else {
            warn!(
                failed = outcome.failures.len(),
                "Locale incomplete; locale index not republished"
            );
        }

        Ok(outcome)
    }

    fn commit(
        &self,
        staging: &StagingArea,
        locales: &[Locale],
        staged_locales: Vec<LocaleOutcome>,
        run_id: String,
    ) -> Result<GenerationReport> {
        let mut report = GenerationReport {
            run_id,
            generated_on: self.partitioner.generated_on(),
            locales: locales.len(),
            documents: Vec::new(),
            failures: Vec::new(),
        };

        for outcome in staged_locales {
            let mut staged = outcome.partitions;
            staged.extend(outcome.index);
            report.documents.extend(self.publisher.commit_all(&staged)?);
            report.failures.extend(outcome.failures);
        }

        if report.failures.is_empty() {
            let master = self
                .partitioner
                .master_index_for(locales)
                .and_then(|doc| staging.stage(&doc))?;
            report.documents.push(self.publisher.commit(&master)?);
        } else {
            warn!(
                failures = report.failures.len(),
                "Run incomplete; master index not republished"
            );
            report.failures.push(GenerationFailure {
                location: SitemapLocation::Master,
                error: "skipped: not every locale was published".to_string(),
            });
        }

        Ok(report)
    }
}
