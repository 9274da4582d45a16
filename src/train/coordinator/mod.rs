//! Multi-adapter training coordinator

mod core;
mod registry;
mod result;


pub use self::core::{MultiLoraTrainer, TrainerOptions, DEFAULT_MAX_SEQ_LEN, DEFAULT_SAVE_STEP};
pub use registry::{AdapterRegistry, AdapterSlot};
pub use result::TrainSummary;
