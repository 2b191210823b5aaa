//! certsweep CLI — certification-evidence crawler for organization catalogues.
//!
//! Reads a CSV of organizations, crawls each listed website for
//! certification keywords, and writes the enriched CSV back out.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
