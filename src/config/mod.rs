//! Run configuration
//!
//! A YAML manifest names the base model, checkpoint settings and every adapter
//! with its LoRA hyperparameters, training setup and optional validation task.

mod loader;
mod schema;
mod train;
mod validate;

pub use loader::{build_adapters, load_spec};
pub use schema::{AdapterSpec, RunSpec, ValidationConfig};
pub use train::TrainConfig;
pub use validate::{validate_spec, SpecError};
