//! Main entry point for the kegg_matrix application.
//!
//! Resolves the reference data and matrix paths from the command line,
//! builds the reaction matrix and writes it, plus group averages when a
//! sample grouping is given.

use anyhow::Result;
use clap::Parser;
use kegg_matrix::cli::{run_cli, Cli};

/// Main function: parses arguments and runs the conversion.
fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over -v
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level()))
        .init();

    run_cli(cli)
}
