#![forbid(unsafe_code)]
//! HTTP server exposing per-identity ledgers

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use proofledger::api::run_api_server;
use proofledger::config::{load_config, load_config_from};
use proofledger::node::LedgerNode;
use proofledger::persistence::{Database, InMemoryPersistence, Persistence};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file (defaults to ./config.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides server.port
    #[arg(long)]
    port: Option<u16>,
    /// Overrides database.path
    #[arg(long)]
    db: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(db) = cli.db {
        config.database.path = db;
    }
    config.validate()?;

    let persistence: Arc<dyn Persistence> = match Database::open(&config.database.path) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            warn!(
                "Failed to open DB at {}: {}. Falling back to in-memory persistence.",
                config.database.path, e
            );
            Arc::new(InMemoryPersistence::new())
        }
    };

    let pow = config.proof_of_work();
    info!(
        "Starting ledger server (db = {}, difficulty = {})",
        config.database.path,
        pow.difficulty()
    );

    let node = Arc::new(LedgerNode::new(persistence, pow));
    run_api_server(node, config.server.port).await
}
