//! Held-out validation of individual adapters

mod runner;
mod state;

pub use runner::{run_validation, MultiLabelScorer, Tally, ValidationRunner};
pub use state::{ValidationState, COMPOSITE_FALLBACK_TASK, DEFAULT_VALIDATION_BATCH_SIZE};
