//! The poll loop
//!
//! Each cycle crawls the listing, diffs it against the link store, records the
//! new links and then hands them to the notifiers. Links are recorded before
//! anyone is notified, so a notifier failure never causes a link to be
//! reported twice, and a crash between the two steps drops that notification.

use crate::crawler::{Crawler, FetchError};
use crate::notify::{dispatch, timestamp_now, DispatchReport, Notifier};
use crate::storage::{LinkStore, StorageError};
use futures::FutureExt;
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// A poll cycle that was abandoned, tagged with the phase that failed
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("crawl of {source_link} failed: {error}")]
    Crawl {
        source_link: String,
        #[source]
        error: FetchError,
    },

    #[error("looking up seen links failed: {0}")]
    Filter(#[source] StorageError),

    #[error("recording new links failed: {0}")]
    Record(#[source] StorageError),
}

impl CycleError {
    /// Name of the phase that failed, for logs
    pub fn phase(&self) -> &'static str {
        match self {
            Self::Crawl { .. } => "crawl",
            Self::Filter(_) => "filter",
            Self::Record(_) => "record",
        }
    }
}

/// What one successful poll cycle did
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// When the cycle started, in the notification timestamp format
    pub timestamp: String,

    /// Number of distinct item links the crawl found
    pub candidates: usize,

    /// Links not seen before, in lexicographic order
    pub new_links: Vec<String>,

    /// Rows actually inserted into the store
    pub recorded: usize,

    /// Notifier outcome; `None` when the empty batch was not dispatched
    pub dispatch: Option<DispatchReport>,
}

/// Drives crawl → diff → record → notify for one listing
pub struct Watcher {
    source: String,
    interval: Duration,
    notify_empty: bool,
    crawler: Crawler,
    store: Arc<dyn LinkStore>,
    notifiers: Vec<Box<dyn Notifier>>,
}

impl Watcher {
    /// Creates a watcher for `source`
    ///
    /// # Arguments
    ///
    /// * `source` - Listing page URL
    /// * `interval` - Pause between the end of a cycle and the start of the next
    /// * `crawler` - Page crawler
    /// * `store` - Seen-link store
    /// * `notifiers` - Sinks for new links, run in order
    pub fn new(
        source: impl Into<String>,
        interval: Duration,
        crawler: Crawler,
        store: Arc<dyn LinkStore>,
        notifiers: Vec<Box<dyn Notifier>>,
    ) -> Self {
        Self {
            source: source.into(),
            interval,
            notify_empty: true,
            crawler,
            store,
            notifiers,
        }
    }

    /// Whether a cycle without new links still notifies (default `true`)
    pub fn with_notify_empty(mut self, notify_empty: bool) -> Self {
        self.notify_empty = notify_empty;
        self
    }

    /// The watched listing URL
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Ensures the store schema exists
    ///
    /// Called once before the first cycle. A failure here means the store is
    /// unusable and is returned to the caller instead of being retried.
    pub fn prepare(&self) -> Result<(), StorageError> {
        self.store.ensure_schema()
    }

    /// Runs exactly one poll cycle
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let timestamp = timestamp_now();

        let candidates: BTreeSet<String> =
            self.crawler
                .crawl(&self.source)
                .await
                .map_err(|error| CycleError::Crawl {
                    source_link: self.source.clone(),
                    error,
                })?;

        let new_links = self
            .store
            .filter_unseen(&self.source, &candidates)
            .map_err(CycleError::Filter)?;

        let recorded = self
            .store
            .record_seen(&self.source, &new_links)
            .map_err(CycleError::Record)?;

        let new_links: Vec<String> = new_links.into_iter().collect();
        let message = new_links.join("\n");

        let dispatch = if message.is_empty() && !self.notify_empty {
            None
        } else {
            Some(dispatch(&self.notifiers, &message, &timestamp).await)
        };

        Ok(CycleReport {
            timestamp,
            candidates: candidates.len(),
            new_links,
            recorded,
            dispatch,
        })
    }

    /// Polls until `shutdown` is cancelled
    ///
    /// The schema is ensured once up front; that is the only error this
    /// returns. Per-cycle failures, including panics, are logged and the next
    /// cycle starts after the usual interval. Cancellation interrupts both the
    /// sleep and an in-flight cycle.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), StorageError> {
        self.prepare()?;

        tracing::info!(
            "Watching {} every {}s",
            self.source,
            self.interval.as_secs()
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutdown requested, abandoning current cycle");
                    break;
                }
                outcome = AssertUnwindSafe(self.run_cycle()).catch_unwind() => {
                    self.log_outcome(outcome);
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!("Watcher for {} stopped", self.source);
        Ok(())
    }

    fn log_outcome(&self, outcome: std::thread::Result<Result<CycleReport, CycleError>>) {
        match outcome {
            Ok(Ok(report)) => {
                tracing::info!(
                    "{}: {} links, {} new",
                    self.source,
                    report.candidates,
                    report.new_links.len()
                );
                if let Some(dispatch) = report.dispatch.filter(|d| !d.all_delivered()) {
                    tracing::warn!(
                        "{} of {} notifiers failed this cycle",
                        dispatch.failed.len(),
                        dispatch.failed.len() + dispatch.delivered.len()
                    );
                }
            }
            Ok(Err(e)) => {
                tracing::error!(
                    phase = e.phase(),
                    source_link = %self.source,
                    "Poll cycle failed: {}",
                    e
                );
            }
            Err(_) => {
                tracing::error!(source_link = %self.source, "Poll cycle panicked");
            }
        }
    }
}
