//! YAML schema of a multi-adapter training run
//!
//! ```yaml
//! base_model: meta-llama/Llama-2-7b-hf
//! save_dir: checkpoints
//! save_step: 500
//! adapters:
//!   - lora:
//!       name: arc_adapter
//!       r: 8
//!       lora_alpha: 16
//!       target_modules: [q_proj, v_proj]
//!     train:
//!       batch_size: 16
//!       micro_batch_size: 4
//!       lr: 0.0003
//!       task_name: arc-c
//!     validation:
//!       task_name: arc-c
//! ```

use super::TrainConfig;
use crate::lora::LoraConfig;
use crate::train::validation::DEFAULT_VALIDATION_BATCH_SIZE;
use crate::train::{TrainerOptions, DEFAULT_MAX_SEQ_LEN, DEFAULT_SAVE_STEP};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_save_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_save_step() -> u64 {
    DEFAULT_SAVE_STEP
}

fn default_max_seq_len() -> usize {
    DEFAULT_MAX_SEQ_LEN
}

fn default_validation_batch_size() -> usize {
    DEFAULT_VALIDATION_BATCH_SIZE
}

/// Complete run manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSpec {
    /// Base model name or path, recorded in every checkpoint
    pub base_model: String,

    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,

    /// Micro-batch interval between validation passes of an adapter
    #[serde(default = "default_save_step")]
    pub save_step: u64,

    #[serde(default = "default_max_seq_len")]
    pub max_seq_len: usize,

    pub adapters: Vec<AdapterSpec>,
}

impl RunSpec {
    pub fn trainer_options(&self) -> TrainerOptions {
        TrainerOptions::new(self.save_dir.clone())
            .with_save_step(self.save_step)
            .with_max_seq_len(self.max_seq_len)
    }

    pub fn adapter(&self, name: &str) -> Option<&AdapterSpec> {
        self.adapters.iter().find(|adapter| adapter.name() == name)
    }
}

/// One adapter: LoRA hyperparameters, training setup and optional validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterSpec {
    pub lora: LoraConfig,
    pub train: TrainConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationConfig>,
}

impl AdapterSpec {
    pub fn name(&self) -> &str {
        &self.lora.name
    }
}

/// Held-out evaluation of one adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub task_name: String,
    #[serde(default = "default_validation_batch_size")]
    pub batch_size: usize,
}
