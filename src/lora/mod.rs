//! LoRA adapter configuration and checkpoints
//!
//! Each adapter trained over the shared base model carries its own
//! [`LoraConfig`]. Checkpoints are written in the PEFT directory layout.

mod checkpoint;
mod config;

pub use checkpoint::{
    save_adapter_weight, AdapterCheckpointWriter, CheckpointTag, CheckpointWriter, CONFIG_FILE,
    WEIGHTS_FILE,
};
pub use config::LoraConfig;
