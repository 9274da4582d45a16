//! Info command implementation

use crate::cli::{InfoArgs, OutputFormat};
use crate::config::{load_spec, RunSpec};

/// Render a run manifest in the requested format
pub fn render_info(spec: &RunSpec, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Text => {
            let mut lines = vec![
                format!("Base model: {}", spec.base_model),
                format!("Save dir: {}", spec.save_dir.display()),
                format!("Save step: {}", spec.save_step),
                format!("Adapters: {}", spec.adapters.len()),
            ];
            for adapter in &spec.adapters {
                let validation = adapter
                    .validation
                    .as_ref()
                    .map_or_else(|| "none".to_string(), |v| v.task_name.clone());
                lines.push(format!(
                    "  {} task={} optim={} lr={} validation={}",
                    adapter.name(),
                    adapter.train.task_name,
                    adapter.train.optim,
                    adapter.train.lr,
                    validation
                ));
            }
            Ok(lines.join("\n"))
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(spec).map_err(|e| format!("JSON serialization error: {e}"))
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(spec).map_err(|e| format!("YAML serialization error: {e}"))
        }
    }
}

pub fn run_info(args: InfoArgs) -> Result<(), String> {
    let spec = load_spec(&args.config).map_err(|e| format!("Config error: {e}"))?;
    println!("{}", render_info(&spec, args.format)?);
    Ok(())
}
