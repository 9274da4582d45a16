//! Optimizers and learning rate schedules for adapter training

mod adamw;
mod grouped;
mod optimizer;
mod scheduler;
mod sgd;

pub use adamw::AdamW;
pub use grouped::{OptimizerKind, ParamGroup, ParamGroupOptimizer};
pub use optimizer::Optimizer;
pub use scheduler::{
    ConstantLR, InverseSqrtLR, LRScheduler, LinearDecayLR, PolynomialDecayLR, ReduceLROnPlateau,
    SchedulerKind, WarmupCosineLR,
};
pub use sgd::SGD;
