#![forbid(unsafe_code)]
//! Inspect stored ledgers: balances, chains and validity.

use clap::{Parser, Subcommand};

use proofledger::blockchain::validate_chain;
use proofledger::config::load_config;
use proofledger::persistence::Database;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database path (defaults to database.path from config.toml)
    #[arg(long)]
    db: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints an identity's balance and chain summary
    Show {
        identity: String,
        /// Print the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Lists every stored identity
    List,
    /// Validates an identity's chain end to end
    Verify { identity: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let config = load_config()?;
    let db_path = cli.db.unwrap_or(config.database.path.clone());
    let db = Database::open(&db_path)?;

    match cli.command {
        Commands::Show { identity, json } => {
            let ledger = db
                .load_ledger(&identity)?
                .ok_or_else(|| format!("no ledger stored for {}", identity))?;
            let snapshot = ledger.snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                println!("Identity: {}", snapshot.identity);
                println!("Blocks:   {}", snapshot.chain.len());
                println!("Tip:      {}", ledger.last_block().fingerprint());
                println!("Pending:  {}", snapshot.pending.len());
                println!("Peers:    {}", snapshot.peers.join(", "));
                println!("Balance:  {}", snapshot.balance);
            }
        }
        Commands::List => {
            for identity in db.list_identities()? {
                println!("{}", identity);
            }
        }
        Commands::Verify { identity } => {
            let ledger = db
                .load_ledger(&identity)?
                .ok_or_else(|| format!("no ledger stored for {}", identity))?;
            match validate_chain(ledger.chain(), &config.proof_of_work()) {
                Ok(()) => println!("{}: chain of {} blocks is valid", identity, ledger.len()),
                Err(e) => {
                    println!("{}: chain is invalid: {}", identity, e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
