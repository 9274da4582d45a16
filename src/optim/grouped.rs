//! Parameter-grouped optimizer
//!
//! Each group carries its own base learning rate and its own optimizer instance,
//! which is how LoRA+ trains the B factor faster than the A factor.

use super::{AdamW, Optimizer, SGD};
use crate::error::{Error, Result};
use crate::Tensor;
use std::fmt;
use std::str::FromStr;

/// Supported optimizer kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerKind {
    /// SGD with momentum
    Sgd,
    /// Adam with decoupled weight decay
    AdamW,
}

impl OptimizerKind {
    /// Build an optimizer instance for one parameter group
    pub fn build(self, lr: f32, momentum: f32, weight_decay: f32) -> Box<dyn Optimizer> {
        match self {
            Self::Sgd => Box::new(SGD::with_weight_decay(lr, momentum, weight_decay)),
            Self::AdamW => Box::new(AdamW::default_params(lr, weight_decay)),
        }
    }
}

impl FromStr for OptimizerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sgd" => Ok(Self::Sgd),
            "adamw" => Ok(Self::AdamW),
            other => Err(Error::UnknownOptimizer(other.to_string())),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sgd => write!(f, "sgd"),
            Self::AdamW => write!(f, "adamw"),
        }
    }
}

/// A set of parameters sharing one base learning rate
#[derive(Debug, Clone)]
pub struct ParamGroup {
    pub params: Vec<Tensor>,
    pub lr: f32,
}

impl ParamGroup {
    pub fn new(params: Vec<Tensor>, lr: f32) -> Self {
        Self { params, lr }
    }

    /// Total number of scalar parameters in the group
    pub fn numel(&self) -> usize {
        self.params.iter().map(Tensor::numel).sum()
    }
}

/// Optimizer driving several parameter groups
pub struct ParamGroupOptimizer {
    kind: OptimizerKind,
    groups: Vec<ParamGroup>,
    optimizers: Vec<Box<dyn Optimizer>>,
}

impl ParamGroupOptimizer {
    /// Create one optimizer instance per group
    pub fn new(kind: OptimizerKind, groups: Vec<ParamGroup>, momentum: f32, weight_decay: f32) -> Self {
        let optimizers =
            groups.iter().map(|group| kind.build(group.lr, momentum, weight_decay)).collect();
        Self { kind, groups, optimizers }
    }

    pub fn kind(&self) -> OptimizerKind {
        self.kind
    }

    pub fn groups(&self) -> &[ParamGroup] {
        &self.groups
    }

    /// Current (scheduled) learning rate of every group
    pub fn lrs(&self) -> Vec<f32> {
        self.optimizers.iter().map(|opt| opt.lr()).collect()
    }

    /// Scale every group's base rate by `factor`
    pub fn set_lr_factor(&mut self, factor: f32) {
        for (group, opt) in self.groups.iter().zip(self.optimizers.iter_mut()) {
            opt.set_lr(group.lr * factor);
        }
    }

    pub fn step(&mut self) {
        for (group, opt) in self.groups.iter().zip(self.optimizers.iter_mut()) {
            opt.step(&group.params);
        }
    }

    pub fn zero_grad(&mut self) {
        for (group, opt) in self.groups.iter().zip(self.optimizers.iter_mut()) {
            opt.zero_grad(&group.params);
        }
    }
}
