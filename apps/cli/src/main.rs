//! RosterLink CLI: match a Slack workspace roster to public LinkedIn profiles.
//!
//! Records are written to an Airtable table and exported to CSV.

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
