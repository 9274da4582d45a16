//! Multiplexed multi-LoRA fine-tuning over a shared base model.
//!
//! Several LoRA adapters train at once: every fused batch carries one
//! segment per active adapter and runs a single forward and backward pass.
//! Each adapter keeps its own:
//! - Gradient accumulation counter and LoRA+ optimizer
//! - Learning rate schedule, bound when its task becomes active
//! - Held-out validation cadence and best-accuracy checkpoint
//!
//! The base model, data dispatcher and tasks are supplied by the caller
//! through the [`model::MultiLoraModel`], [`dispatcher::Dispatcher`] and
//! [`task::Task`] traits.

pub mod batch;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod lora;
pub mod model;
pub mod optim;
pub mod task;
pub mod train;

mod tensor;

pub use error::{Error, Result};
pub use tensor::Tensor;
pub use train::{MultiLoraTrainer, TrainSummary, TrainerOptions};
