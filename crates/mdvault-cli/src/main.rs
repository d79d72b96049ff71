//! # Mdvault CLI
//!
//! `mdv` is a thin terminal client over the `mdvault` library: the CLI lives in
//! `src/cli/`, while this file only starts the runtime, invokes `cli::run()` and
//! handles process termination.
//!
//! ## Workspace Structure
//!
//! - `crates/mdvault/`: the vault index library (scanner, aggregator, index, storage)
//! - `crates/mdvault-cli/`: this binary, depends on `mdvault`
//!
//! Everything in the library is UI agnostic: functions take normal Rust values,
//! return normal Rust types, and never touch stdout. The CLI owns argument
//! parsing, logging setup, rendering and exit codes.

mod cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
