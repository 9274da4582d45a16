//! Learning rate schedulers
//!
//! Every scheduler yields a multiplicative factor over the optimizer's base
//! learning rates, so one schedule drives all LoRA+ parameter groups:
//! - `ConstantLR` - Constant rate, optionally after a linear warmup
//! - `LinearDecayLR` - Linear warmup, then linear decay to zero
//! - `WarmupCosineLR` - Linear warmup, then cosine decay (optionally with restarts)
//! - `PolynomialDecayLR` - Linear warmup, then polynomial decay to an end rate
//! - `InverseSqrtLR` - Linear warmup, then inverse square-root decay
//! - `ReduceLROnPlateau` - Shrinks the rate when a reported metric stops improving

mod constant;
mod cosine;
mod inverse_sqrt;
mod linear;
mod plateau;
mod polynomial;


pub use constant::ConstantLR;
pub use cosine::WarmupCosineLR;
pub use inverse_sqrt::InverseSqrtLR;
pub use linear::LinearDecayLR;
pub use plateau::ReduceLROnPlateau;
pub use polynomial::PolynomialDecayLR;

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Learning rate scheduler trait
pub trait LRScheduler {
    /// Multiplier applied to every parameter group's base learning rate
    fn factor(&self) -> f32;

    /// Step the scheduler (called once per optimizer step)
    fn step(&mut self);

    /// Report a validation metric; only metric-driven schedules react
    fn observe(&mut self, _metric: f32) {}
}

/// Warmup phase shared by the step-driven schedules
pub(crate) fn warmup_factor(step: usize, warmup_steps: usize) -> f32 {
    step as f32 / warmup_steps.max(1) as f32
}

/// Named schedule kinds accepted in `scheduler_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerKind {
    Constant,
    Linear,
    Cosine,
    CosineWithRestarts,
    Polynomial,
    ConstantWithWarmup,
    InverseSqrt,
    ReduceLrOnPlateau,
}

impl SchedulerKind {
    pub const ALL: [SchedulerKind; 8] = [
        Self::Constant,
        Self::Linear,
        Self::Cosine,
        Self::CosineWithRestarts,
        Self::Polynomial,
        Self::ConstantWithWarmup,
        Self::InverseSqrt,
        Self::ReduceLrOnPlateau,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Linear => "linear",
            Self::Cosine => "cosine",
            Self::CosineWithRestarts => "cosine_with_restarts",
            Self::Polynomial => "polynomial",
            Self::ConstantWithWarmup => "constant_with_warmup",
            Self::InverseSqrt => "inverse_sqrt",
            Self::ReduceLrOnPlateau => "reduce_lr_on_plateau",
        }
    }

    /// Build the schedule
    ///
    /// `base_lr` is only consulted by the polynomial schedule, whose end rate is
    /// absolute.
    pub fn build(self, warmup_steps: usize, total_steps: usize, base_lr: f32) -> Box<dyn LRScheduler> {
        match self {
            // Plain constant ignores warmup
            Self::Constant => Box::new(ConstantLR::new(0)),
            Self::ConstantWithWarmup => Box::new(ConstantLR::new(warmup_steps)),
            Self::Linear => Box::new(LinearDecayLR::new(warmup_steps, total_steps)),
            Self::Cosine => Box::new(WarmupCosineLR::new(warmup_steps, total_steps)),
            Self::CosineWithRestarts => {
                Box::new(WarmupCosineLR::with_hard_restarts(warmup_steps, total_steps, 1))
            }
            Self::Polynomial => {
                Box::new(PolynomialDecayLR::new(warmup_steps, total_steps, base_lr, 1e-7, 1.0))
            }
            Self::InverseSqrt => Box::new(InverseSqrtLR::new(warmup_steps)),
            Self::ReduceLrOnPlateau => Box::new(ReduceLROnPlateau::new(0.1, 10)),
        }
    }
}

impl FromStr for SchedulerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownScheduler(s.to_string()))
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
