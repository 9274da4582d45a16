//! Metric-driven learning rate reduction

use super::LRScheduler;

const REL_THRESHOLD: f32 = 1e-4;

/// Reduce-on-plateau scheduler over a higher-is-better metric
///
/// Each reported metric that does not beat the best seen by a relative margin
/// counts as a bad epoch; after more than `patience` bad epochs in a row the
/// factor is multiplied by `decay`. Plain `step()` calls leave the factor as is.
pub struct ReduceLROnPlateau {
    decay: f32,
    patience: usize,
    best: Option<f32>,
    bad_epochs: usize,
    current_factor: f32,
}

impl ReduceLROnPlateau {
    pub fn new(decay: f32, patience: usize) -> Self {
        Self { decay, patience, best: None, bad_epochs: 0, current_factor: 1.0 }
    }

    /// Bad reports since the last improvement
    pub fn bad_epochs(&self) -> usize {
        self.bad_epochs
    }
}

impl LRScheduler for ReduceLROnPlateau {
    fn factor(&self) -> f32 {
        self.current_factor
    }

    fn step(&mut self) {}

    fn observe(&mut self, metric: f32) {
        let improved = match self.best {
            None => true,
            Some(best) => metric > best * (1.0 + REL_THRESHOLD),
        };

        if improved {
            self.best = Some(metric);
            self.bad_epochs = 0;
            return;
        }

        self.bad_epochs += 1;
        if self.bad_epochs > self.patience {
            self.current_factor *= self.decay;
            self.bad_epochs = 0;
        }
    }
}
