//! Stochastic Gradient Descent optimizer

use super::Optimizer;
use crate::Tensor;
use ndarray::Array1;

/// SGD optimizer with optional momentum and L2 weight decay
///
/// Update rule:
/// - d = g + λ * θ
/// - v = μ * v + d  (v = d on the first step)
/// - θ = θ - lr * v
pub struct SGD {
    lr: f32,
    momentum: f32,
    weight_decay: f32,
    velocities: Vec<Option<Array1<f32>>>,
}

impl SGD {
    /// Create a new SGD optimizer
    pub fn new(lr: f32, momentum: f32) -> Self {
        Self::with_weight_decay(lr, momentum, 0.0)
    }

    /// Create a new SGD optimizer with weight decay
    pub fn with_weight_decay(lr: f32, momentum: f32, weight_decay: f32) -> Self {
        Self { lr, momentum, weight_decay, velocities: Vec::new() }
    }

    pub fn momentum(&self) -> f32 {
        self.momentum
    }

    pub fn weight_decay(&self) -> f32 {
        self.weight_decay
    }
}

impl Optimizer for SGD {
    fn step(&mut self, params: &[Tensor]) {
        if self.velocities.len() < params.len() {
            self.velocities.resize(params.len(), None);
        }

        for (i, param) in params.iter().enumerate() {
            let Some(grad) = param.grad() else {
                continue;
            };

            let direction = if self.weight_decay != 0.0 {
                grad + &(&*param.data() * self.weight_decay)
            } else {
                grad
            };

            let direction = if self.momentum > 0.0 {
                let velocity = match self.velocities[i].take() {
                    Some(v) => v * self.momentum + &direction,
                    None => direction,
                };
                self.velocities[i] = Some(velocity.clone());
                velocity
            } else {
                direction
            };

            let updated = &*param.data() - &(direction * self.lr);
            *param.data_mut() = updated;
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}
