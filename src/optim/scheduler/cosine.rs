//! Warmup + cosine decay learning rate scheduler

use super::{warmup_factor, LRScheduler};
use std::f32::consts::PI;

/// Warmup + Cosine Decay Learning Rate Scheduler
///
/// Combines linear warmup with cosine annealing decay.
/// - Phase 1 (warmup): Linear increase from 0 to 1
/// - Phase 2 (decay): Cosine decay from 1 to 0
///
/// With hard restarts the decay phase is split into `cycles` cosine segments, each
/// jumping back to 1 at its start.
pub struct WarmupCosineLR {
    warmup_steps: usize,
    total_steps: usize,
    hard_restart_cycles: Option<usize>,
    current_step: usize,
}

impl WarmupCosineLR {
    /// Half-cosine decay to zero over the post-warmup steps
    pub fn new(warmup_steps: usize, total_steps: usize) -> Self {
        Self { warmup_steps, total_steps, hard_restart_cycles: None, current_step: 0 }
    }

    /// Cosine decay with `cycles` hard restarts
    pub fn with_hard_restarts(warmup_steps: usize, total_steps: usize, cycles: usize) -> Self {
        Self { warmup_steps, total_steps, hard_restart_cycles: Some(cycles), current_step: 0 }
    }

    fn progress(&self) -> f32 {
        let decay_steps = self.total_steps.saturating_sub(self.warmup_steps).max(1);
        (self.current_step - self.warmup_steps) as f32 / decay_steps as f32
    }
}

impl LRScheduler for WarmupCosineLR {
    fn factor(&self) -> f32 {
        if self.current_step < self.warmup_steps {
            return warmup_factor(self.current_step, self.warmup_steps);
        }

        let progress = self.progress();
        match self.hard_restart_cycles {
            None => (0.5 * (1.0 + (PI * progress).cos())).max(0.0),
            Some(cycles) => {
                if progress >= 1.0 {
                    return 0.0;
                }
                let cycle_progress = (cycles as f32 * progress) % 1.0;
                (0.5 * (1.0 + (PI * cycle_progress).cos())).max(0.0)
            }
        }
    }

    fn step(&mut self) {
        self.current_step += 1;
    }
}
