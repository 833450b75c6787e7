use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use quire::app::AppContext;
use quire::cli::{commands, Cli, Commands};
use quire::config::Config;

const DEFAULT_LOG_FILTER: &str = "quire=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command() {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let ctx = AppContext::new(config)?;
            commands::serve(ctx).await?;
        }
        Commands::Ingest => {
            let ctx = AppContext::new(config)?;
            commands::ingest(&ctx).await;
        }
        Commands::HashPassword { plaintext } => {
            commands::hash_password(&config, &plaintext)?;
        }
    }

    Ok(())
}
