//! Per-adapter training configuration
//!
//! Deserialized from the per-adapter mapping of a run manifest. Keys and
//! defaults:
//!
//! | key | default |
//! |-----|---------|
//! | `batch_size` | required |
//! | `micro_batch_size` | `batch_size` |
//! | `optim` | `"adamw"` |
//! | `lr` | required |
//! | `loraplus_lr_ratio` | `1.0` |
//! | `momentum` | `0.0` |
//! | `weight_decay` | `0.01` |
//! | `scheduler_type` | `"constant"` |
//! | `warmup_ratio` | `0.0` |
//! | `task_name` | `"casual"` |

use crate::error::Result;
use crate::task::TaskSpec;
use serde::{Deserialize, Serialize};

fn default_optim() -> String {
    "adamw".to_string()
}

fn default_lr_ratio() -> f32 {
    1.0
}

fn default_weight_decay() -> f32 {
    0.01
}

fn default_scheduler() -> String {
    "constant".to_string()
}

fn default_task_name() -> String {
    "casual".to_string()
}

/// Training hyperparameters of one adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub batch_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub micro_batch_size: Option<usize>,
    #[serde(default = "default_optim")]
    pub optim: String,
    pub lr: f32,
    /// LoRA+ learning rate ratio lr_B / lr_A
    #[serde(default = "default_lr_ratio")]
    pub loraplus_lr_ratio: f32,
    #[serde(default)]
    pub momentum: f32,
    #[serde(default = "default_weight_decay")]
    pub weight_decay: f32,
    #[serde(default = "default_scheduler")]
    pub scheduler_type: String,
    #[serde(default)]
    pub warmup_ratio: f32,
    #[serde(default = "default_task_name")]
    pub task_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val_set_size: Option<usize>,
}

impl TrainConfig {
    /// Minimal configuration with every optional key at its default
    pub fn new(batch_size: usize, lr: f32) -> Self {
        Self {
            batch_size,
            micro_batch_size: None,
            optim: default_optim(),
            lr,
            loraplus_lr_ratio: default_lr_ratio(),
            momentum: 0.0,
            weight_decay: default_weight_decay(),
            scheduler_type: default_scheduler(),
            warmup_ratio: 0.0,
            task_name: default_task_name(),
            data: None,
            prompt: None,
            val_set_size: None,
        }
    }

    /// Parse from a raw configuration mapping
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Micro-batch size, defaulting to the full batch
    pub fn micro_batch_size(&self) -> usize {
        self.micro_batch_size.unwrap_or(self.batch_size)
    }

    /// Parsed `task_name`
    pub fn task_spec(&self) -> Result<TaskSpec> {
        TaskSpec::from_parts(
            &self.task_name,
            self.data.as_deref(),
            self.prompt.as_deref(),
            self.val_set_size,
        )
    }

    pub fn with_micro_batch_size(mut self, micro_batch_size: usize) -> Self {
        self.micro_batch_size = Some(micro_batch_size);
        self
    }

    pub fn with_optim(mut self, optim: impl Into<String>) -> Self {
        self.optim = optim.into();
        self
    }

    pub fn with_lr_ratio(mut self, ratio: f32) -> Self {
        self.loraplus_lr_ratio = ratio;
        self
    }

    pub fn with_scheduler(mut self, scheduler_type: impl Into<String>, warmup_ratio: f32) -> Self {
        self.scheduler_type = scheduler_type.into();
        self.warmup_ratio = warmup_ratio;
        self
    }

    pub fn with_task(mut self, task_name: impl Into<String>) -> Self {
        self.task_name = task_name.into();
        self
    }
}
