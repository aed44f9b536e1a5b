//! docbinder CLI: assemble documentation content into pages and navigation.
//!
//! Reads a content snapshot, merges collections into single pages, builds
//! the sidebar tree, and writes the site.

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
