//! Loading a run manifest and building the adapter registry from it

use super::schema::RunSpec;
use super::validate::validate_spec;
use crate::error::{Error, Result};
use crate::task::TaskRegistry;
use crate::train::{AdapterRegistry, AdapterSlot, TrainState, ValidationState};
use std::fs;
use std::path::Path;
use tracing::info;

/// Read, parse and validate a YAML run manifest
pub fn load_spec<P: AsRef<Path>>(path: P) -> Result<RunSpec> {
    let path = path.as_ref();
    let yaml = fs::read_to_string(path).map_err(|e| {
        Error::ConfigError(format!("Failed to read config file {}: {e}", path.display()))
    })?;

    let spec: RunSpec = serde_yaml::from_str(&yaml)
        .map_err(|e| Error::ConfigError(format!("Failed to parse YAML config: {e}")))?;

    validate_spec(&spec).map_err(|e| Error::ConfigError(format!("Invalid config: {e}")))?;
    Ok(spec)
}

/// One slot per configured adapter, tasks resolved through `tasks`
pub fn build_adapters(spec: &RunSpec, tasks: &TaskRegistry) -> Result<AdapterRegistry> {
    let mut registry = AdapterRegistry::new();
    for adapter in &spec.adapters {
        let name = adapter.name();
        let train = TrainState::from_registry(name, adapter.train.clone(), tasks)?;
        let validation = adapter
            .validation
            .as_ref()
            .map(|v| ValidationState::from_registry(name, &v.task_name, v.batch_size, tasks))
            .transpose()?;

        info!(
            adapter = name,
            task = train.task().name(),
            validation = validation.as_ref().map(ValidationState::task_name).unwrap_or("none"),
            "adapter configured"
        );
        registry.insert(AdapterSlot::new(train, validation))?;
    }
    Ok(registry)
}
