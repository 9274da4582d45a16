//! Multi-adapter training
//!
//! This module provides:
//! - Per-adapter optimizer, schedule and gradient accumulation state
//! - Per-adapter held-out validation
//! - The joint training loop fusing all adapters into one forward/backward pass
//!
//! # Example
//!
//! ```no_run
//! use loramux::config::TrainConfig;
//! use loramux::task::TaskRegistry;
//! use loramux::train::{AdapterRegistry, AdapterSlot, MultiLoraTrainer, TrainState, TrainerOptions};
//!
//! # fn run(tasks: &TaskRegistry) -> loramux::Result<()> {
//! let config = TrainConfig::new(16, 3e-4).with_micro_batch_size(4).with_task("arc-c");
//! let state = TrainState::from_registry("arc_adapter", config, tasks)?;
//!
//! let mut adapters = AdapterRegistry::new();
//! adapters.insert(AdapterSlot::new(state, None))?;
//!
//! let trainer = MultiLoraTrainer::new(adapters, TrainerOptions::new("checkpoints"))?;
//! // trainer.train(&mut dispatcher, &mut model)?;
//! # Ok(())
//! # }
//! ```

mod coordinator;
mod state;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_utils;

pub use coordinator::{
    AdapterRegistry, AdapterSlot, MultiLoraTrainer, TrainSummary, TrainerOptions, DEFAULT_MAX_SEQ_LEN,
    DEFAULT_SAVE_STEP,
};
pub use state::TrainState;
pub use validation::{run_validation, MultiLabelScorer, Tally, ValidationRunner, ValidationState};
