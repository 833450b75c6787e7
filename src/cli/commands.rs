use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::api;
use crate::app::{AppContext, Result};
use crate::auth::PasswordHasher;
use crate::config::Config;
use crate::daemon::{shutdown_signal, Scheduler, SchedulerConfig};
use crate::ingest::IngestReport;

/// How long in-flight requests may take to drain after a shutdown signal.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Run the HTTP server and the ingestion scheduler until SIGINT/SIGTERM.
pub async fn serve(ctx: AppContext) -> Result<()> {
    ctx.ensure_default_admin()?;

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let scheduler = Scheduler::new(ctx.ingestor(), SchedulerConfig::from(&ctx.config.ingest));
    let scheduler_handle = {
        let token = shutdown.clone();
        tokio::spawn(async move { scheduler.run(token).await })
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], ctx.config.server.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    let server = {
        let token = shutdown.clone();
        axum::serve(listener, api::router(ctx))
            .with_graceful_shutdown(async move { token.cancelled().await })
            .into_future()
    };
    let grace = async {
        shutdown.cancelled().await;
        tokio::time::sleep(SHUTDOWN_GRACE).await;
    };

    tokio::select! {
        result = server => result?,
        _ = grace => tracing::warn!("Connections still open after {:?}; exiting", SHUTDOWN_GRACE),
    }

    shutdown.cancel();
    if let Err(e) = scheduler_handle.await {
        tracing::error!("Scheduler task failed: {}", e);
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Run a single ingestion cycle and print the outcome.
pub async fn ingest(ctx: &AppContext) -> IngestReport {
    let report = ctx.ingestor().run_once().await;

    println!(
        "Ingested {} posts from {} feeds ({} feeds failed, {} entries failed)",
        report.posts_created, report.feeds_total, report.feeds_failed, report.entries_failed
    );
    report
}

/// Print a credential digest for `plaintext`.
pub fn hash_password(config: &Config, plaintext: &str) -> Result<()> {
    let hasher = PasswordHasher::with_iterations(config.auth.password_iterations);
    println!("{}", hasher.hash(plaintext)?);
    Ok(())
}
