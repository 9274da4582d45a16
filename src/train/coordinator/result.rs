//! Training run summary

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Outcome of a multi-adapter training run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainSummary {
    /// Fused batches processed
    pub global_steps: u64,
    /// Best validation accuracy of every adapter with a validation set
    pub best_accuracy: BTreeMap<String, f32>,
    /// Optimizer updates per adapter, final flush included
    pub optimizer_steps: BTreeMap<String, u64>,
    /// Checkpoint directories in the order they were written
    pub checkpoints: Vec<PathBuf>,
}

impl TrainSummary {
    /// Best accuracy of one adapter, if it was validated
    pub fn best(&self, adapter_name: &str) -> Option<f32> {
        self.best_accuracy.get(adapter_name).copied()
    }
}
