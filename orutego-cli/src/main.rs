//! Binary crate for the `orutego` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive sessions and configuration prompts
//! - Human-friendly output formatting

use clap::Parser;

mod cli;
mod interactive;
mod logging;
mod render;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    logging::init(cmd.verbose);
    cmd.run().await
}
