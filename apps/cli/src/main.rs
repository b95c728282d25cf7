//! Curator CLI: daily content curation and static-site publishing.
//!
//! Picks one trending entry from the configured feeds, turns it into an
//! original article, and rebuilds the static site around it.

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
