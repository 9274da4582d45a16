//! Constant learning rate with optional linear warmup

use super::{warmup_factor, LRScheduler};

/// Constant Learning Rate Scheduler
///
/// Linearly increases the factor from 0 to 1 over `warmup_steps`, then holds 1.
/// With `warmup_steps == 0` the factor is always 1.
pub struct ConstantLR {
    warmup_steps: usize,
    current_step: usize,
}

impl ConstantLR {
    pub fn new(warmup_steps: usize) -> Self {
        Self { warmup_steps, current_step: 0 }
    }
}

impl LRScheduler for ConstantLR {
    fn factor(&self) -> f32 {
        if self.current_step < self.warmup_steps {
            return warmup_factor(self.current_step, self.warmup_steps);
        }
        1.0
    }

    fn step(&mut self) {
        self.current_step += 1;
    }
}
