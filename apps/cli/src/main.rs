//! Harmonizer CLI: merges the publisher and archival biography corpora.
//!
//! Builds an identity index over the secondary corpus, merges every primary
//! record against it, and writes harmonized records plus print siblings.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
