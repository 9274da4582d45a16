//! Linear warmup + linear decay learning rate scheduler

use super::{warmup_factor, LRScheduler};

/// Linear Decay Learning Rate Scheduler
///
/// - Phase 1 (warmup): factor rises linearly from 0 to 1
/// - Phase 2 (decay): factor falls linearly to 0 at `total_steps`
pub struct LinearDecayLR {
    warmup_steps: usize,
    total_steps: usize,
    current_step: usize,
}

impl LinearDecayLR {
    /// # Arguments
    /// * `warmup_steps` - Number of warmup steps
    /// * `total_steps` - Total training steps (including warmup)
    pub fn new(warmup_steps: usize, total_steps: usize) -> Self {
        Self { warmup_steps, total_steps, current_step: 0 }
    }
}

impl LRScheduler for LinearDecayLR {
    fn factor(&self) -> f32 {
        if self.current_step < self.warmup_steps {
            return warmup_factor(self.current_step, self.warmup_steps);
        }
        let remaining = self.total_steps.saturating_sub(self.current_step) as f32;
        let decay_steps = self.total_steps.saturating_sub(self.warmup_steps).max(1) as f32;
        (remaining / decay_steps).max(0.0)
    }

    fn step(&mut self) {
        self.current_step += 1;
    }
}
