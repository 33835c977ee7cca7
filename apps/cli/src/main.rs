//! NewsLens CLI: search the web and see the results grouped along a scale.
//!
//! Runs a query through the search, enrichment and model grouping pipeline
//! and renders the groups as columns of articles.

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
