//! Inverse square-root learning rate scheduler

use super::{warmup_factor, LRScheduler};

const DEFAULT_TIMESCALE: usize = 10_000;

/// Inverse Square-Root Learning Rate Scheduler
///
/// Linear warmup, then `1 / sqrt((step + shift) / timescale)` where the timescale
/// is the warmup length (or 10000 without warmup) and `shift` makes the curve
/// continuous at the end of warmup.
pub struct InverseSqrtLR {
    warmup_steps: usize,
    timescale: usize,
    current_step: usize,
}

impl InverseSqrtLR {
    pub fn new(warmup_steps: usize) -> Self {
        let timescale = if warmup_steps > 0 { warmup_steps } else { DEFAULT_TIMESCALE };
        Self { warmup_steps, timescale, current_step: 0 }
    }
}

impl LRScheduler for InverseSqrtLR {
    fn factor(&self) -> f32 {
        if self.current_step < self.warmup_steps {
            return warmup_factor(self.current_step, self.warmup_steps);
        }
        let shift = self.timescale - self.warmup_steps;
        let scaled = (self.current_step + shift) as f32 / self.timescale as f32;
        1.0 / scaled.sqrt()
    }

    fn step(&mut self) {
        self.current_step += 1;
    }
}
