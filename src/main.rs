//! # StartupMate CLI (`startupmate`)
//!
//! ## Usage
//!
//! ```bash
//! startupmate [--config ./config/startupmate.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `startupmate serve` | Start the HTTP API |
//! | `startupmate init` | Create the SQLite database and run schema migrations |
//! | `startupmate reports` | Print recent idea analyses and deck scorecards |
//!
//! The config file is optional; `DATABASE_URL`, `DATABASE_NAME`, `PORT` and
//! `STORE_TIMEOUT_SECS` override it.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use startupmate::{config, migrate, reports, server, telemetry};

/// StartupMate backend: scores startup ideas and pitch decks and keeps the
/// results in a document store.
#[derive(Parser)]
#[command(name = "startupmate", version)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Runs without a document store when the database is not configured;
    /// store-backed endpoints then answer 503.
    Serve,

    /// Initialize the database schema. Idempotent.
    Init,

    /// Print the most recent ideas and decks.
    Reports {
        /// Documents per kind (defaults to `[reports].default_limit`).
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing("info");

    let cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Init => {
            if !cfg.db.is_configured() {
                anyhow::bail!("set DATABASE_URL and DATABASE_NAME (or [db] url and name) first");
            }
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Reports { limit } => {
            reports::run_reports(&cfg, limit).await?;
        }
    }

    Ok(())
}
