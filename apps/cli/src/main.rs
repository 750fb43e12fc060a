//! shopgraph CLI: crawled shop pages into knowledge-graph entities.
//!
//! Classifies crawled e-commerce pages, maps products and category
//! listings to JSON-LD entities, and submits them to a graph store.

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
