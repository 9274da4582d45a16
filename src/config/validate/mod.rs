//! Run manifest validation
//!
//! Validates run manifests for correctness before any adapter is trained.

mod error;
mod validator;

#[cfg(test)]
mod proptests;

pub use error::SpecError;
pub use validator::validate_spec;
