//! Error types for multi-adapter training

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Training, validation and checkpoint errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("SafeTensors error: {0}")]
    SafeTensors(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("error batch_size {batch_size} and micro batch size {micro_batch_size}")]
    InvalidBatchSize { batch_size: usize, micro_batch_size: usize },

    #[error("Invalid LoRA+ learning rate ratio: {0} (must be >= 1.0)")]
    InvalidLrRatio(f32),

    #[error("unknown optimizer {0}")]
    UnknownOptimizer(String),

    #[error("unknown scheduler {0}")]
    UnknownScheduler(String),

    #[error("unknown task {0}")]
    UnknownTask(String),

    #[error("unknown task type {0}")]
    UnsupportedTaskType(String),

    #[error("unknown adapter {0}")]
    UnknownAdapter(String),

    #[error("adapter {adapter} is not prepared: {what}")]
    NotPrepared { adapter: String, what: &'static str },

    #[error("adapter {0} produced no training loss")]
    MissingLoss(String),

    #[error("Invalid fused batch: {0}")]
    InvalidBatch(String),

    #[error("Model error: {0}")]
    Model(String),
}
