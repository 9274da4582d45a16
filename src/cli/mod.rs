//! CLI module for loramux
//!
//! Argument types, command handlers and log setup for the `loramux` binary.

mod args;
mod commands;
mod logging;

pub use args::{Cli, Command, InfoArgs, OutputFormat, ValidateArgs};
pub use commands::{format_adapter_info, render_info, run_command};
pub use logging::{init_tracing, LogLevel};
