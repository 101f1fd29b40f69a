//! Rhetor CLI
//!
//! Thin batch driver over the pure `rhetor_core::infer` entry point:
//! - `infer`: run every context record of an NDJSON file through the
//!   engine and emit (or rewrite in place) the derived fact lines
//! - `check`: parse + validate a knowledge base and report faults
//! - `explain`: run one context and print provenance and the defeat trail
//!
//! All file handling lives here; the core never sees a path.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod check;
mod explain;
mod infer;
mod load;

#[derive(Parser)]
#[command(name = "rhetor")]
#[command(
    author,
    version,
    about = "Rhetor: defeasible forward-chaining inference"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Infer over newline-delimited JSON context records.
    Infer(infer::InferArgs),

    /// Parse and validate a knowledge base, reporting malformed rules.
    Check(check::CheckArgs),

    /// Run a single context and print held facts, supporters and defeats.
    Explain(explain::ExplainArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Infer(args) => infer::run(args),
        Commands::Check(args) => check::run(args),
        Commands::Explain(args) => explain::run(args),
    }
}
