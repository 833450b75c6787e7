//! Background scheduler for periodic feed ingestion.
//!
//! Runs inside the server process as a single tokio task. Shutdown is
//! cooperative through a shared [`CancellationToken`].

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::{format_interval, IngestConfig};
use crate::ingest::Ingestor;

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between cycles (default: 10 minutes)
    pub interval: Duration,
    /// Whether to run a cycle immediately on start
    pub run_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(600),
            run_on_start: false,
        }
    }
}

impl From<&IngestConfig> for SchedulerConfig {
    fn from(config: &IngestConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs),
            run_on_start: config.run_on_start,
        }
    }
}

/// Drives one [`Ingestor`] on a fixed interval.
///
/// At most one cycle is in flight. A cycle that overruns the interval delays
/// the next tick instead of queueing extra ones.
pub struct Scheduler {
    ingestor: Ingestor,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(ingestor: Ingestor, config: SchedulerConfig) -> Self {
        Self { ingestor, config }
    }

    /// Run until `shutdown` is cancelled. An in-flight cycle is abandoned
    /// on cancellation.
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!(
            "Scheduler started (interval: {})",
            format_interval(self.config.interval.as_secs())
        );

        let mut timer = interval(self.config.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first tick completes immediately.
        if !self.config.run_on_start {
            timer.tick().await;
        }

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }

            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::warn!("Shutdown requested during an ingestion cycle");
                    break;
                }
                _ = self.ingestor.run_once() => {}
            }
        }

        tracing::info!("Scheduler stopped");
    }
}

/// Resolve once SIGINT or SIGTERM arrives, then cancel `token`.
pub async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to set up SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = token.cancelled() => {},
    }

    tracing::info!("Shutdown signal received");
    token.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Result;
    use crate::fetcher::{FetchResult, Fetcher};
    use crate::normalizer::Normalizer;
    use crate::store::{SqliteStore, Store};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingFetcher {
        calls: Arc<AtomicUsize>,
        delay: Duration,
    }

    #[async_trait]
    impl Fetcher for CountingFetcher {
        async fn fetch(&self, _url: &str) -> Result<FetchResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(FetchResult::Skipped { status: 304 })
        }
    }

    fn scheduler(calls: Arc<AtomicUsize>, delay: Duration, config: SchedulerConfig) -> Scheduler {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        store.add_feed("http://a.test/feed").unwrap();
        let fetcher = Arc::new(CountingFetcher { calls, delay });
        Scheduler::new(Ingestor::new(store, fetcher, Normalizer::new()), config)
    }

    #[test]
    fn test_config_from_ingest_config() {
        let config = SchedulerConfig::from(&IngestConfig::default());
        assert_eq!(config.interval, Duration::from_secs(600));
        assert!(!config.run_on_start);
    }

    #[tokio::test]
    async fn test_runs_on_each_tick_until_cancelled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = scheduler(
            calls.clone(),
            Duration::ZERO,
            SchedulerConfig {
                interval: Duration::from_millis(40),
                run_on_start: true,
            },
        );
        let token = CancellationToken::new();

        let handle = {
            let token = token.clone();
            tokio::spawn(async move { scheduler.run(token).await })
        };

        tokio::time::sleep(Duration::from_millis(150)).await;
        token.cancel();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("scheduler should stop after cancellation")
            .unwrap();

        assert!(calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_first_tick_skipped_without_run_on_start() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = scheduler(
            calls.clone(),
            Duration::ZERO,
            SchedulerConfig {
                interval: Duration::from_secs(3600),
                run_on_start: false,
            },
        );
        let token = CancellationToken::new();

        let handle = {
            let token = token.clone();
            tokio::spawn(async move { scheduler.run(token).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
        handle.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancellation_abandons_slow_cycle() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = scheduler(
            calls.clone(),
            Duration::from_secs(3600),
            SchedulerConfig {
                interval: Duration::from_secs(3600),
                run_on_start: true,
            },
        );
        let token = CancellationToken::new();

        let handle = {
            let token = token.clone();
            tokio::spawn(async move { scheduler.run(token).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        token.cancel();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("scheduler should not wait for the slow fetch")
            .unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_signal_returns_when_token_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), shutdown_signal(token.clone()))
            .await
            .unwrap();
        assert!(token.is_cancelled());
    }
}
