//! # anchor_cli
//!
//! Command-line front end for `anchor_core`: evaluate an interchange file,
//! edit its anchors, and run the stand-alone rebar, micropile and bond
//! length checks.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
