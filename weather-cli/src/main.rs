//! Binary crate for the `weather` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration and the text menu
//! - Human-friendly output formatting

use clap::Parser;

mod cli;
mod display;
mod logger;
mod menu;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    logger::init(cmd.verbose)?;
    cmd.run().await
}
