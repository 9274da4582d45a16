//! loramux CLI
//!
//! Inspection and validation of multi-adapter run manifests.
//!
//! # Usage
//!
//! ```bash
//! # Validate a manifest
//! loramux validate run.yaml
//!
//! # Validate and print every adapter's settings
//! loramux validate run.yaml --detailed
//!
//! # Show manifest info as JSON
//! loramux info run.yaml --format json
//! ```

use clap::Parser;
use loramux::cli::{init_tracing, run_command, Cli, LogLevel};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(LogLevel::from_flags(cli.verbose, cli.quiet));

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
