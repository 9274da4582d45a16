//! Validate command implementation

use crate::cli::{LogLevel, ValidateArgs};
use crate::config::{load_spec, AdapterSpec, RunSpec};

/// Format one adapter's settings as an indented block
pub fn format_adapter_info(adapter: &AdapterSpec) -> String {
    let train = &adapter.train;
    let mut lines = vec![
        format!("  Adapter: {}", adapter.name()),
        format!("    Rank: {}  Alpha: {}", adapter.lora.r, adapter.lora.lora_alpha),
        format!(
            "    Batch size: {} (micro {}, accumulate {})",
            train.batch_size,
            train.micro_batch_size(),
            train.batch_size / train.micro_batch_size().max(1)
        ),
        format!("    Optimizer: {} (lr={})", train.optim, train.lr),
        format!("    Scheduler: {} (warmup {})", train.scheduler_type, train.warmup_ratio),
        format!("    Task: {}", train.task_name),
    ];
    if train.loraplus_lr_ratio != 1.0 {
        lines.push(format!("    LoRA+ ratio: {}", train.loraplus_lr_ratio));
    }
    if let Some(validation) = &adapter.validation {
        lines.push(format!(
            "    Validation: {} (batch {})",
            validation.task_name, validation.batch_size
        ));
    }
    lines.join("\n")
}

/// Format run-wide settings
pub fn format_run_info(spec: &RunSpec) -> String {
    [
        format!("  Base model: {}", spec.base_model),
        format!("  Save dir: {}", spec.save_dir.display()),
        format!("  Save step: {}", spec.save_step),
        format!("  Max sequence length: {}", spec.max_seq_len),
    ]
    .join("\n")
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    let spec = load_spec(&args.config).map_err(|e| format!("Config error: {e}"))?;

    if level != LogLevel::Quiet {
        println!("Configuration is valid: {}", args.config.display());
        println!("  Adapters: {}", spec.adapters.len());
    }

    if args.detailed && level != LogLevel::Quiet {
        println!();
        println!("{}", format_run_info(&spec));
        for adapter in &spec.adapters {
            println!("{}", format_adapter_info(adapter));
        }
    }
    Ok(())
}
