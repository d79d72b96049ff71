//! # CLI Behavior
//!
//! This is **one possible front end** for mdvault, not the application itself.
//! The CLI is the only place that knows about terminal I/O, exit codes, and output formatting.
//!
//! Every invocation opens the vault (`--vault`, or the current directory), runs a
//! full load, then executes one command against the published snapshot. Running
//! `mdv` with no subcommand lists notes.
//!
//! ## Output
//!
//! - Styled text on stdout by default, plain when stdout is not a terminal.
//! - `--json` prints the underlying data (notes, tree) as JSON instead.
//! - Entries skipped during the load are reported on stderr, never stdout.
//! - Logs go to stderr; `-v` enables debug logs, `-vv` trace. `RUST_LOG` wins.
//!
//! ## Module Structure
//!
//! - `setup`: Argument parsing via clap
//! - `commands`: Per-command handlers that call the index and print
//! - `render`: Output formatting (lists, tree, note view)
//! - `styles`: Semantic terminal styles

mod commands;
mod render;
pub mod setup;
mod styles;

use anyhow::Result;
use clap::Parser;
use setup::Cli;
use tracing_subscriber::EnvFilter;

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    commands::run(cli).await
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "mdvault=debug,mdvault_cli=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
