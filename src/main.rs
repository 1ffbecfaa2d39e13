//! Chatty API
//!
//! # Architecture Overview
//!
//! ```text
//!   Invocation ──▶ request id / trace ──▶ CORS ──▶ body limit ──▶ error envelope
//!                                                                      │
//!                        ┌─────────────────────────────────────────────┤
//!                        ▼                                             ▼
//!                  /api/health                                    dispatcher
//!              (reads cache state)                      ensure_connected() ──▶ MongoDB
//!                                                                      │      (single-flight)
//!                                                                      ▼
//!                                                    /api, /api/auth/*, /api/messages/*
//! ```
//!
//! Runs either as a local server (`serve`) or under the Lambda HTTP runtime
//! (`lambda`); both share the same router and the same connection cache.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use chatty_api::http::RouteGroups;
use chatty_api::lifecycle::startup;

#[derive(Parser)]
#[command(name = "chatty-api")]
#[command(about = "HTTP entrypoint for the Chatty API", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a local HTTP server (default)
    Serve {
        /// Override the configured bind address
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Run as a Lambda HTTP function
    Lambda,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = startup::prepare(cli.config.as_deref())?;
    tracing::info!("chatty-api v{} starting", env!("CARGO_PKG_VERSION"));

    let server = startup::build_server(config, RouteGroups::new());

    match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Serve { bind } => startup::serve(server, bind).await?,
        Commands::Lambda => startup::lambda(server).await?,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
