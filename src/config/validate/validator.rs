//! Static checks of a run manifest
//!
//! Everything that would otherwise only fail once an adapter's task becomes
//! active is checked up front.

use super::error::SpecError;
use crate::config::schema::{AdapterSpec, RunSpec};
use crate::optim::{OptimizerKind, SchedulerKind};
use std::collections::HashSet;

/// Validate a run manifest
///
/// Checks:
/// - At least one adapter, with unique non-empty names
/// - Positive save step and sequence length
/// - Per adapter: batch ratio, learning rates, optimizer and scheduler names,
///   LoRA hyperparameters, task selection and validation batch size
pub fn validate_spec(spec: &RunSpec) -> Result<(), SpecError> {
    if spec.adapters.is_empty() {
        return Err(SpecError::NoAdapters);
    }
    if spec.save_step == 0 {
        return Err(SpecError::InvalidSaveStep(spec.save_step));
    }
    if spec.max_seq_len == 0 {
        return Err(SpecError::InvalidSeqLen(spec.max_seq_len));
    }

    let mut seen = HashSet::new();
    for adapter in &spec.adapters {
        if adapter.name().is_empty() {
            return Err(SpecError::EmptyAdapterName);
        }
        if !seen.insert(adapter.name()) {
            return Err(SpecError::DuplicateAdapter(adapter.name().to_string()));
        }
        validate_adapter(adapter)?;
    }
    Ok(())
}

fn validate_adapter(adapter: &AdapterSpec) -> Result<(), SpecError> {
    let name = || adapter.name().to_string();
    let train = &adapter.train;

    let micro_batch_size = train.micro_batch_size();
    if train.batch_size == 0
        || micro_batch_size == 0
        || train.batch_size < micro_batch_size
        || train.batch_size % micro_batch_size != 0
    {
        return Err(SpecError::InvalidBatchSize {
            adapter: name(),
            batch_size: train.batch_size,
            micro_batch_size,
        });
    }

    if train.lr.is_nan() || train.lr <= 0.0 {
        return Err(SpecError::InvalidLearningRate { adapter: name(), lr: train.lr });
    }

    if train.loraplus_lr_ratio < 1.0 {
        return Err(SpecError::InvalidLrRatio { adapter: name(), ratio: train.loraplus_lr_ratio });
    }

    if !(0.0..=1.0).contains(&train.warmup_ratio) {
        return Err(SpecError::InvalidWarmupRatio { adapter: name(), ratio: train.warmup_ratio });
    }

    if train.optim.parse::<OptimizerKind>().is_err() {
        return Err(SpecError::InvalidOptimizer { adapter: name(), name: train.optim.clone() });
    }

    if train.scheduler_type.parse::<SchedulerKind>().is_err() {
        return Err(SpecError::InvalidLRScheduler {
            adapter: name(),
            name: train.scheduler_type.clone(),
        });
    }

    if adapter.lora.r == 0 {
        return Err(SpecError::InvalidLoRARank { adapter: name(), r: adapter.lora.r });
    }

    if !(0.0..1.0).contains(&adapter.lora.lora_dropout) {
        return Err(SpecError::InvalidLoRADropout {
            adapter: name(),
            dropout: adapter.lora.lora_dropout,
        });
    }

    if let Err(e) = train.task_spec() {
        return Err(SpecError::InvalidTask { adapter: name(), reason: e.to_string() });
    }

    if let Some(validation) = &adapter.validation {
        if validation.batch_size == 0 {
            return Err(SpecError::InvalidValidationBatchSize {
                adapter: name(),
                batch_size: validation.batch_size,
            });
        }
    }

    Ok(())
}
