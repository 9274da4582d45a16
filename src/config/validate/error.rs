//! Manifest validation errors

/// Reason a run manifest was rejected
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SpecError {
    #[error("No adapters configured")]
    NoAdapters,

    #[error("Adapter name cannot be empty")]
    EmptyAdapterName,

    #[error("Duplicate adapter name: {0}")]
    DuplicateAdapter(String),

    #[error("Invalid save step: {0} (must be > 0)")]
    InvalidSaveStep(u64),

    #[error("Invalid max sequence length: {0} (must be > 0)")]
    InvalidSeqLen(usize),

    #[error("{adapter}: batch size {batch_size} is not a positive multiple of micro batch size {micro_batch_size}")]
    InvalidBatchSize { adapter: String, batch_size: usize, micro_batch_size: usize },

    #[error("{adapter}: invalid learning rate {lr} (must be > 0.0)")]
    InvalidLearningRate { adapter: String, lr: f32 },

    #[error("{adapter}: invalid LoRA+ ratio {ratio} (must be >= 1.0)")]
    InvalidLrRatio { adapter: String, ratio: f32 },

    #[error("{adapter}: invalid warmup ratio {ratio} (must be in [0.0, 1.0])")]
    InvalidWarmupRatio { adapter: String, ratio: f32 },

    #[error("{adapter}: invalid optimizer {name} (must be one of: sgd, adamw)")]
    InvalidOptimizer { adapter: String, name: String },

    #[error("{adapter}: invalid LR scheduler {name}")]
    InvalidLRScheduler { adapter: String, name: String },

    #[error("{adapter}: invalid LoRA rank {r} (must be > 0)")]
    InvalidLoRARank { adapter: String, r: usize },

    #[error("{adapter}: invalid LoRA dropout {dropout} (must be in [0.0, 1.0))")]
    InvalidLoRADropout { adapter: String, dropout: f32 },

    #[error("{adapter}: invalid task: {reason}")]
    InvalidTask { adapter: String, reason: String },

    #[error("{adapter}: invalid validation batch size {batch_size} (must be > 0)")]
    InvalidValidationBatchSize { adapter: String, batch_size: usize },
}
