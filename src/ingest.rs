use std::sync::Arc;
use std::time::Instant;

use crate::app::Result;
use crate::domain::{Feed, NewPost};
use crate::fetcher::{FetchResult, Fetcher};
use crate::normalizer::Normalizer;
use crate::store::Store;

/// Outcome of one ingestion cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub feeds_total: usize,
    pub feeds_failed: usize,
    pub posts_created: usize,
    pub entries_failed: usize,
}

/// Per-feed result, folded into the cycle report.
#[derive(Debug, Default)]
struct FeedOutcome {
    created: usize,
    failed_entries: usize,
}

/// Pulls every enabled feed and turns its entries into posts.
///
/// Feeds are processed one after another. There is no cursor between runs,
/// so an unchanged feed is re-imported in full on every cycle.
#[derive(Clone)]
pub struct Ingestor {
    store: Arc<dyn Store + Send + Sync>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
}

impl Ingestor {
    pub fn new(
        store: Arc<dyn Store + Send + Sync>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            store,
            fetcher,
            normalizer,
        }
    }

    /// Runs a single cycle. Failures are logged and counted, never returned.
    pub async fn run_once(&self) -> IngestReport {
        let started = Instant::now();
        let mut report = IngestReport::default();

        let feeds = match self.store.list_enabled_feeds() {
            Ok(feeds) => feeds,
            Err(e) => {
                tracing::error!("Failed to list enabled feeds: {}", e);
                return report;
            }
        };
        report.feeds_total = feeds.len();

        for feed in &feeds {
            match self.ingest_feed(feed).await {
                Ok(outcome) => {
                    report.posts_created += outcome.created;
                    report.entries_failed += outcome.failed_entries;
                }
                Err(e) => {
                    report.feeds_failed += 1;
                    tracing::warn!("Feed fetch error for {}: {}", feed.url, e);
                }
            }
        }

        tracing::info!(
            feeds = report.feeds_total,
            feeds_failed = report.feeds_failed,
            posts_created = report.posts_created,
            entries_failed = report.entries_failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Ingestion cycle complete"
        );

        report
    }

    async fn ingest_feed(&self, feed: &Feed) -> Result<FeedOutcome> {
        let body = match self.fetcher.fetch(&feed.url).await? {
            FetchResult::Content { body } => body,
            FetchResult::Skipped { status } => {
                tracing::debug!("Skipping {} (HTTP {})", feed.url, status);
                return Ok(FeedOutcome::default());
            }
        };

        let entries = self.normalizer.parse(&body)?;
        let mut outcome = FeedOutcome::default();

        for entry in entries {
            let post = NewPost::ingested(entry.title, entry.body, &feed.url);
            match self.store.add_post(&post) {
                Ok(_) => outcome.created += 1,
                Err(e) => {
                    outcome.failed_entries += 1;
                    tracing::warn!("Failed to store entry from {}: {}", feed.url, e);
                }
            }
        }

        tracing::debug!("Ingested {} posts from {}", outcome.created, feed.url);
        Ok(outcome)
    }
}
