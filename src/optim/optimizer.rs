//! Optimizer trait

use crate::Tensor;

/// Trait for optimization algorithms
///
/// Parameters are shared handles, so an optimizer updates the same storage the
/// model reads during its forward pass.
pub trait Optimizer {
    /// Perform a single optimization step over `params`
    ///
    /// `params` must be passed in the same order on every call; per-parameter
    /// state is kept by index.
    fn step(&mut self, params: &[Tensor]);

    /// Zero out all gradients
    fn zero_grad(&mut self, params: &[Tensor]) {
        for param in params {
            param.zero_grad();
        }
    }

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);
}
