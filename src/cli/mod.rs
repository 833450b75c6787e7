pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "A small blog backend that also republishes RSS/Atom feeds", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file (default: ~/.config/quire/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP API and the feed scheduler
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run one ingestion cycle over all enabled feeds and exit
    Ingest,
    /// Print a password digest suitable for the users table
    HashPassword {
        /// Password to hash
        plaintext: String,
    },
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Serve { port: None })
    }
}
