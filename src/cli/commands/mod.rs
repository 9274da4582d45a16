//! Command handlers

mod info;
mod validate;

use super::{Cli, Command, LogLevel};

pub use info::{render_info, run_info};
pub use validate::{format_adapter_info, run_validate};

/// Dispatch a parsed command line
pub fn run_command(cli: Cli) -> Result<(), String> {
    let level = LogLevel::from_flags(cli.verbose, cli.quiet);
    match cli.command {
        Command::Validate(args) => run_validate(args, level),
        Command::Info(args) => run_info(args),
    }
}
