//! Shared base model contract
//!
//! The base model and its forward/backward mechanics are supplied by the caller.
//! The trainer only needs per-adapter outputs of one fused forward pass and a way
//! to run a single backward pass for the combined loss.

use crate::batch::FusedBatch;
use crate::error::{Error, Result};
use crate::lora::LoraConfig;
use crate::Tensor;
use ndarray::{Array2, Array3};
use std::collections::BTreeMap;

/// Forward output of one adapter's segment
#[derive(Debug, Clone)]
pub struct ModelOutput {
    pub adapter_name: String,
    /// Task loss (absent in inference mode)
    pub loss: Option<f32>,
    /// Auxiliary loss such as MoE load balancing
    pub aux_loss: Option<f32>,
    /// `[segment rows, seq_len, vocab]`
    pub logits: Array3<f32>,
    pub batch_start: usize,
    pub batch_end: usize,
}

impl ModelOutput {
    /// Logit vector at one position of every row
    ///
    /// `positions[i]` indexes the sequence axis of row `i`. Fails when a row or
    /// position lies outside the logits.
    pub fn gather_rows(&self, positions: &[usize]) -> Result<Array2<f32>> {
        let (rows, seq_len, vocab) = self.logits.dim();
        if positions.len() > rows {
            return Err(Error::Model(format!(
                "adapter {} returned {rows} logit rows, {} requested",
                self.adapter_name,
                positions.len()
            )));
        }

        let mut pooled = Array2::zeros((positions.len(), vocab));
        for (row, &pos) in positions.iter().enumerate() {
            if pos >= seq_len {
                return Err(Error::Model(format!(
                    "adapter {}: position {pos} of row {row} outside sequence length {seq_len}",
                    self.adapter_name
                )));
            }
            pooled.row_mut(row).assign(&self.logits.slice(ndarray::s![row, pos, ..]));
        }
        Ok(pooled)
    }
}

/// One adapter's contribution to the combined loss
#[derive(Debug, Clone, PartialEq)]
pub struct LossTerm {
    pub adapter_name: String,
    /// `1 / accumulation_target`
    pub scale: f32,
    pub loss: f32,
    pub aux_loss: Option<f32>,
}

impl LossTerm {
    /// Normalized task loss
    pub fn scaled_loss(&self) -> f32 {
        self.loss * self.scale
    }

    /// Normalized auxiliary loss
    pub fn scaled_aux_loss(&self) -> Option<f32> {
        self.aux_loss.map(|aux| aux * self.scale)
    }

    /// Normalized total contribution
    pub fn scaled(&self) -> f32 {
        self.scaled_loss() + self.scaled_aux_loss().unwrap_or(0.0)
    }
}

/// Sum of normalized per-adapter losses driving one backward pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedLoss {
    terms: Vec<LossTerm>,
}

impl CombinedLoss {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, term: LossTerm) {
        self.terms.push(term);
    }

    pub fn terms(&self) -> &[LossTerm] {
        &self.terms
    }

    pub fn term(&self, adapter_name: &str) -> Option<&LossTerm> {
        self.terms.iter().find(|t| t.adapter_name == adapter_name)
    }

    /// Scalar combined loss
    pub fn total(&self) -> f32 {
        self.terms.iter().map(LossTerm::scaled).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// A base model carrying several LoRA adapters
pub trait MultiLoraModel {
    /// Run one fused forward pass, one output per segment in segment order
    fn forward(&mut self, batch: &FusedBatch) -> Result<Vec<ModelOutput>>;

    /// Backpropagate the combined loss of the last training forward pass
    ///
    /// Gradients accumulate into the adapters' parameters; each term's scale
    /// weights its adapter's share.
    fn backward(&mut self, loss: &CombinedLoss) -> Result<()>;

    /// Named trainable parameters of one adapter
    ///
    /// Returned handles share storage with the model.
    fn lora_weights(&self, adapter_name: &str) -> Result<BTreeMap<String, Tensor>>;

    /// Hyperparameters of one adapter
    fn adapter_config(&self, adapter_name: &str) -> Option<&LoraConfig>;

    /// Switch to training mode
    fn train(&mut self);

    /// Switch to evaluation mode
    fn eval(&mut self);

    /// Base model name or path recorded in checkpoints
    fn name_or_path(&self) -> &str;
}
