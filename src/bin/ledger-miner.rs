#![forbid(unsafe_code)]
//! Client-side proof search. Finds a proof for a ledger's current tip so it
//! can be submitted to the server's mine endpoint.

use clap::Parser;
use std::time::Instant;

use proofledger::pow::{ProofOfWork, DEFAULT_DIFFICULTY};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Proof of the ledger's last block
    last_proof: String,
    /// Number of leading zero hex digits required
    #[arg(long, default_value_t = DEFAULT_DIFFICULTY)]
    difficulty: u32,
    /// First candidate to try
    #[arg(long, default_value_t = 0)]
    start: u64,
    /// Give up after this many candidates
    #[arg(long)]
    limit: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let pow = ProofOfWork::new(cli.difficulty);
    let end = cli
        .limit
        .map(|limit| cli.start.saturating_add(limit))
        .unwrap_or(u64::MAX);

    println!(
        "Searching proofs for last proof {:?} at difficulty {}...",
        cli.last_proof,
        pow.difficulty()
    );
    let started = Instant::now();

    match pow.search_from(&cli.last_proof, cli.start, end) {
        Some(proof) => {
            let digest = ProofOfWork::digest(&cli.last_proof, &proof).unwrap_or_default();
            println!("proof:   {}", proof);
            println!("digest:  {}", digest);
            println!("elapsed: {:.2?}", started.elapsed());
            Ok(())
        }
        None => Err(format!("no proof found in {}..{}", cli.start, end).into()),
    }
}
