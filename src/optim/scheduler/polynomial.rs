//! Polynomial decay learning rate scheduler

use super::{warmup_factor, LRScheduler};

/// Polynomial Decay Learning Rate Scheduler
///
/// After warmup the rate decays from `lr_init` to `lr_end` following
/// `(lr_init - lr_end) * (1 - progress)^power + lr_end`, then stays at `lr_end`.
/// The factor is that rate divided by `lr_init`.
pub struct PolynomialDecayLR {
    warmup_steps: usize,
    total_steps: usize,
    lr_init: f32,
    lr_end: f32,
    power: f32,
    current_step: usize,
}

impl PolynomialDecayLR {
    pub fn new(warmup_steps: usize, total_steps: usize, lr_init: f32, lr_end: f32, power: f32) -> Self {
        Self { warmup_steps, total_steps, lr_init, lr_end: lr_end.min(lr_init), power, current_step: 0 }
    }
}

impl LRScheduler for PolynomialDecayLR {
    fn factor(&self) -> f32 {
        if self.current_step < self.warmup_steps {
            return warmup_factor(self.current_step, self.warmup_steps);
        }
        if self.lr_init <= 0.0 {
            return 1.0;
        }
        if self.current_step > self.total_steps {
            return self.lr_end / self.lr_init;
        }

        let decay_steps = self.total_steps.saturating_sub(self.warmup_steps).max(1) as f32;
        let pct_remaining = 1.0 - (self.current_step - self.warmup_steps) as f32 / decay_steps;
        let lr = (self.lr_init - self.lr_end) * pct_remaining.max(0.0).powf(self.power) + self.lr_end;
        lr / self.lr_init
    }

    fn step(&mut self) {
        self.current_step += 1;
    }
}
