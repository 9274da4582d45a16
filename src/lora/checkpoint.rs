//! Adapter checkpoints (adapter_model.bin + adapter_config.json)
//!
//! Layout under the save directory:
//!
//! ```text
//! <save_dir>/<adapter>/adapter_model.bin
//! <save_dir>/<adapter>/adapter_config.json
//! <save_dir>/<adapter>/<adapter>_best/adapter_model.bin
//! <save_dir>/<adapter>/<adapter>_best/adapter_config.json
//! ```
//!
//! `adapter_model.bin` holds the adapter's named weights as F32 safetensors.

use crate::error::{Error, Result};
use crate::model::MultiLoraModel;
use crate::train::TrainState;
use safetensors::tensor::{Dtype, TensorView};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Weight file name inside a checkpoint directory
pub const WEIGHTS_FILE: &str = "adapter_model.bin";

/// Config file name inside a checkpoint directory
pub const CONFIG_FILE: &str = "adapter_config.json";

/// Which snapshot of an adapter is being written
#[derive(Debug, Clone, PartialEq)]
pub enum CheckpointTag {
    /// End-of-training weights
    Latest,
    /// New best validation accuracy after `steps` steps of this adapter
    Best { steps: u64, accuracy: f32 },
}

impl CheckpointTag {
    /// `cnt` value recorded in the config of best checkpoints
    pub fn label(&self) -> Option<String> {
        match self {
            Self::Latest => None,
            Self::Best { steps, .. } => Some(format!("best{steps}")),
        }
    }
}

/// Destination of adapter checkpoints
pub trait CheckpointWriter {
    /// Persist one adapter's weights and config, returning the checkpoint directory
    fn save(
        &mut self,
        model: &dyn MultiLoraModel,
        state: &TrainState,
        tag: &CheckpointTag,
    ) -> Result<PathBuf>;
}

/// Writes checkpoints into per-adapter directories under `save_dir`
#[derive(Debug, Clone)]
pub struct AdapterCheckpointWriter {
    save_dir: PathBuf,
}

impl AdapterCheckpointWriter {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self { save_dir: save_dir.into() }
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Directory receiving `adapter_name`'s checkpoint for `tag`
    pub fn checkpoint_dir(&self, adapter_name: &str, tag: &CheckpointTag) -> PathBuf {
        let dir = self.save_dir.join(adapter_name);
        match tag {
            CheckpointTag::Latest => dir,
            CheckpointTag::Best { .. } => dir.join(format!("{adapter_name}_best")),
        }
    }
}

impl CheckpointWriter for AdapterCheckpointWriter {
    fn save(
        &mut self,
        model: &dyn MultiLoraModel,
        state: &TrainState,
        tag: &CheckpointTag,
    ) -> Result<PathBuf> {
        let dir = self.checkpoint_dir(state.adapter_name(), tag);
        save_adapter_weight(model, state, &dir, tag)?;
        info!(adapter = state.adapter_name(), path = %dir.display(), "checkpoint saved");
        Ok(dir)
    }
}

/// Write one adapter's weights and config into `dir`
pub fn save_adapter_weight(
    model: &dyn MultiLoraModel,
    state: &TrainState,
    dir: &Path,
    tag: &CheckpointTag,
) -> Result<()> {
    let adapter_name = state.adapter_name();
    std::fs::create_dir_all(dir)?;

    let weights = model.lora_weights(adapter_name)?;
    let tensor_data: Vec<(String, Vec<u8>, Vec<usize>)> = weights
        .iter()
        .map(|(name, param)| {
            let bytes: Vec<u8> = bytemuck::cast_slice(param.data().as_slice().unwrap_or(&[])).to_vec();
            (name.clone(), bytes, param.shape().to_vec())
        })
        .collect();

    let views = tensor_data
        .iter()
        .map(|(name, bytes, shape)| {
            TensorView::new(Dtype::F32, shape.clone(), bytes)
                .map(|view| (name.as_str(), view))
                .map_err(|e| Error::SafeTensors(format!("tensor {name}: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut metadata = HashMap::new();
    metadata.insert("format".to_string(), "pt".to_string());

    let bytes = safetensors::serialize(views, Some(metadata))
        .map_err(|e| Error::SafeTensors(format!("SafeTensors serialization failed: {e}")))?;
    std::fs::write(dir.join(WEIGHTS_FILE), bytes)?;

    let lora_config = model
        .adapter_config(adapter_name)
        .ok_or_else(|| Error::UnknownAdapter(adapter_name.to_string()))?;
    let mut config = lora_config.export();
    config.insert("base_model_name_or_path".to_string(), Value::from(model.name_or_path()));
    config.insert("task_type".to_string(), Value::from(state.task().peft_task_type()));
    if let CheckpointTag::Best { accuracy, .. } = tag {
        config.insert("cnt".to_string(), Value::from(tag.label()));
        config.insert("best_acc".to_string(), Value::from(*accuracy));
    }

    let json = serde_json::to_string_pretty(&Value::Object(config))?;
    std::fs::write(dir.join(CONFIG_FILE), json)?;
    Ok(())
}
