//! Fine-tuning task descriptors
//!
//! Tasks and tokenizers are supplied by the caller. This module defines the
//! capabilities the trainer consumes and resolves configured task names into
//! shared task handles.

mod registry;

pub use registry::{CasualTaskSpec, MultiTask, TaskRegistry, TaskSpec, CASUAL_TASK, MULTI_TASK_SEPARATOR};

use crate::error::Result;
use std::fmt;

/// Token ids produced by a tokenizer
pub type TokenId = u32;

/// Tokenizer capability used for label encoding and padding
pub trait Tokenizer {
    /// Encode text into token ids
    fn encode(&self, text: &str) -> Vec<TokenId>;

    /// Padding token id
    fn pad_id(&self) -> TokenId;

    /// Attention mask for a padded sequence (true for real tokens)
    fn mask_from(&self, tokens: &[TokenId]) -> Vec<bool> {
        let pad = self.pad_id();
        tokens.iter().map(|&t| t != pad).collect()
    }
}

/// Dataset split requested from a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Validation,
}

/// One tokenized example
#[derive(Debug, Clone, PartialEq)]
pub struct DataItem {
    pub tokens: Vec<TokenId>,
    /// Integer class labels; single-label tasks carry exactly one
    pub labels: Vec<i64>,
}

impl DataItem {
    pub fn new(tokens: Vec<TokenId>, labels: Vec<i64>) -> Self {
        Self { tokens, labels }
    }
}

/// How a task's predictions are scored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    /// Causal language modeling (no classification labels)
    Casual,
    /// Multiple-choice tasks scored over label tokens
    CommonSense,
    SingleLabelClassification,
    MultiLabelClassification,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::CommonSense => "common_sense",
            Self::SingleLabelClassification => "single_label_classification",
            Self::MultiLabelClassification => "multi_label_classification",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fine-tuning objective: data source, prompt template and label schema
pub trait Task {
    /// Task name as used in configuration
    fn name(&self) -> &str;

    fn task_type(&self) -> TaskType;

    /// PEFT task type written into `adapter_config.json` (e.g. "CAUSAL_LM")
    fn peft_task_type(&self) -> &str;

    /// Label strings, in class-index order
    fn label_list(&self) -> Vec<String> {
        Vec::new()
    }

    /// Load and tokenize one split
    fn load_data(&self, tokenizer: &dyn Tokenizer, split: Split) -> Result<Vec<DataItem>>;
}
