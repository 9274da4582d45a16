//! Command-line argument types

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// loramux: joint training of many LoRA adapters over one base model
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "loramux")]
#[command(author = "PAIML")]
#[command(version)]
#[command(about = "Multiplex LoRA fine-tuning jobs over a shared base model")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Validate a run manifest without training
    Validate(ValidateArgs),

    /// Display the adapters and settings of a run manifest
    Info(InfoArgs),
}

/// Arguments for the validate command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to the YAML run manifest
    #[arg(value_name = "FILE")]
    pub config: PathBuf,

    /// Print a per-adapter summary after validation
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for the info command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Path to the YAML run manifest
    #[arg(value_name = "FILE")]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Output format for the info command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}
