//! Per-adapter training state
//!
//! Owns one adapter's optimizer, learning rate schedule and gradient
//! accumulation counter. Optimizer and schedule are bound lazily, once the
//! dispatcher reports the adapter's task as active.

use crate::config::TrainConfig;
use crate::error::{Error, Result};
use crate::optim::{LRScheduler, OptimizerKind, ParamGroup, ParamGroupOptimizer, SchedulerKind};
use crate::task::{Task, TaskRegistry};
use crate::Tensor;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{debug, info};

/// Parameter-name marker of the output-side low-rank factor
const LORA_B_MARKER: &str = "lora_B";

/// Training state of one adapter
pub struct TrainState {
    adapter_name: String,
    config: TrainConfig,
    task: Rc<dyn Task>,
    optimizer: Option<ParamGroupOptimizer>,
    scheduler: Option<Box<dyn LRScheduler>>,
    accumulation_target: Option<usize>,
    accumulation_count: u64,
    optimizer_steps: u64,
    total_steps: Option<usize>,
}

impl TrainState {
    pub fn new(adapter_name: impl Into<String>, config: TrainConfig, task: Rc<dyn Task>) -> Self {
        Self {
            adapter_name: adapter_name.into(),
            config,
            task,
            optimizer: None,
            scheduler: None,
            accumulation_target: None,
            accumulation_count: 0,
            optimizer_steps: 0,
            total_steps: None,
        }
    }

    /// Create the state, resolving the configured task through `registry`
    pub fn from_registry(
        adapter_name: impl Into<String>,
        config: TrainConfig,
        registry: &TaskRegistry,
    ) -> Result<Self> {
        let task = registry.resolve(&config.task_spec()?)?;
        Ok(Self::new(adapter_name, config, task))
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn task(&self) -> &Rc<dyn Task> {
        &self.task
    }

    /// Whether the optimizer has been bound
    pub fn is_prepared(&self) -> bool {
        self.optimizer.is_some()
    }

    /// Micro-batches per optimizer step
    pub fn accumulation_target(&self) -> Result<usize> {
        self.accumulation_target.ok_or_else(|| self.not_prepared("optimizer"))
    }

    /// Micro-batches seen so far
    pub fn accumulation_count(&self) -> u64 {
        self.accumulation_count
    }

    /// Optimizer updates applied so far (including the final flush)
    pub fn optimizer_steps(&self) -> u64 {
        self.optimizer_steps
    }

    /// Scheduled optimizer steps, once the schedule is bound
    pub fn total_steps(&self) -> Option<usize> {
        self.total_steps
    }

    /// Current learning rate of every parameter group
    pub fn learning_rates(&self) -> Vec<f32> {
        self.optimizer.as_ref().map(ParamGroupOptimizer::lrs).unwrap_or_default()
    }

    pub fn optimizer(&self) -> Option<&ParamGroupOptimizer> {
        self.optimizer.as_ref()
    }

    fn not_prepared(&self, what: &'static str) -> Error {
        Error::NotPrepared { adapter: self.adapter_name.clone(), what }
    }

    /// Split trainable parameters into LoRA+ learning rate groups
    ///
    /// Group B (`lora_B` factors and every 1-D parameter) trains at
    /// `lr * loraplus_lr_ratio`, group A at `lr`. A ratio of exactly 1.0 yields a
    /// single group.
    fn grouped_parameters(&self, trainable: &BTreeMap<String, Tensor>) -> Result<Vec<ParamGroup>> {
        let ratio = self.config.loraplus_lr_ratio;
        if ratio < 1.0 {
            return Err(Error::InvalidLrRatio(ratio));
        }

        let lr = self.config.lr;
        let params = trainable.iter().filter(|(_, param)| param.requires_grad());

        if ratio == 1.0 {
            return Ok(vec![ParamGroup::new(params.map(|(_, p)| p.clone()).collect(), lr)]);
        }

        info!(adapter = %self.adapter_name, ratio, "initializing for LoRA+");
        let (group_b, group_a): (Vec<_>, Vec<_>) =
            params.partition(|(name, param)| name.contains(LORA_B_MARKER) || param.ndim() == 1);

        Ok(vec![
            ParamGroup::new(group_a.into_iter().map(|(_, p)| p.clone()).collect(), lr),
            ParamGroup::new(group_b.into_iter().map(|(_, p)| p.clone()).collect(), lr * ratio),
        ])
    }

    /// Bind the optimizer over the adapter's trainable parameters
    ///
    /// A second call on a prepared state is a no-op.
    pub fn prepare(&mut self, trainable: &BTreeMap<String, Tensor>) -> Result<()> {
        if self.optimizer.is_some() {
            debug!(adapter = %self.adapter_name, "optimizer already prepared");
            return Ok(());
        }

        let batch_size = self.config.batch_size;
        let micro_batch_size = self.config.micro_batch_size();
        if micro_batch_size == 0 || batch_size < micro_batch_size || batch_size % micro_batch_size != 0 {
            return Err(Error::InvalidBatchSize { batch_size, micro_batch_size });
        }

        let groups = self.grouped_parameters(trainable)?;
        let kind: OptimizerKind = self.config.optim.parse()?;

        let params_count: usize = groups.iter().map(ParamGroup::numel).sum();
        info!(
            adapter = %self.adapter_name,
            trainable_params = params_count,
            optimizer = %kind,
            "total trainable params"
        );

        self.optimizer = Some(ParamGroupOptimizer::new(
            kind,
            groups,
            self.config.momentum,
            self.config.weight_decay,
        ));
        self.accumulation_target = Some(batch_size / micro_batch_size);
        Ok(())
    }

    /// Bind the learning rate schedule
    ///
    /// Total steps are `ceil(dataset_len / batch_size) * total_epochs`; warmup is
    /// `warmup_ratio` of that. A second call is a no-op.
    pub fn prepare_schedule(&mut self, total_epochs: usize, dataset_len: usize) -> Result<()> {
        if self.scheduler.is_some() {
            return Ok(());
        }
        if self.optimizer.is_none() {
            return Err(self.not_prepared("optimizer"));
        }

        let kind: SchedulerKind = self.config.scheduler_type.parse()?;
        let total_steps = dataset_len.div_ceil(self.config.batch_size) * total_epochs;
        let warmup_steps = (self.config.warmup_ratio * total_steps as f32) as usize;
        let scheduler = kind.build(warmup_steps, total_steps, self.config.lr);

        if let Some(optimizer) = self.optimizer.as_mut() {
            optimizer.set_lr_factor(scheduler.factor());
        }
        debug!(
            adapter = %self.adapter_name,
            scheduler = %kind,
            total_steps,
            warmup_steps,
            "learning rate schedule bound"
        );

        self.scheduler = Some(scheduler);
        self.total_steps = Some(total_steps);
        Ok(())
    }

    /// Count one micro-batch; apply an update when the accumulation target is hit
    ///
    /// Returns whether an optimizer update was applied.
    pub fn step(&mut self) -> Result<bool> {
        let target = self.accumulation_target()? as u64;
        let (optimizer, scheduler) = match (self.optimizer.as_mut(), self.scheduler.as_mut()) {
            (Some(optimizer), Some(scheduler)) => (optimizer, scheduler),
            _ => {
                return Err(Error::NotPrepared {
                    adapter: self.adapter_name.clone(),
                    what: "learning rate schedule",
                })
            }
        };

        self.accumulation_count += 1;
        if self.accumulation_count % target != 0 {
            return Ok(false);
        }

        optimizer.step();
        scheduler.step();
        optimizer.set_lr_factor(scheduler.factor());
        optimizer.zero_grad();
        self.optimizer_steps += 1;
        Ok(true)
    }

    /// Report a validation metric to the schedule
    pub fn observe_metric(&mut self, metric: f32) {
        if let (Some(optimizer), Some(scheduler)) = (self.optimizer.as_mut(), self.scheduler.as_mut()) {
            scheduler.observe(metric);
            optimizer.set_lr_factor(scheduler.factor());
        }
    }

    /// Flush any partially accumulated gradient with one final update
    pub fn finish(&mut self) -> Result<()> {
        let Some(optimizer) = self.optimizer.as_mut() else {
            return Err(Error::NotPrepared { adapter: self.adapter_name.clone(), what: "optimizer" });
        };
        optimizer.step();
        optimizer.zero_grad();
        self.optimizer_steps += 1;
        Ok(())
    }
}
