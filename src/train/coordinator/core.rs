//! Joint training loop over several adapters

use super::registry::AdapterRegistry;
use super::result::TrainSummary;
use crate::dispatcher::{Dispatcher, TaskInEvent, TaskInListener};
use crate::error::{Error, Result};
use crate::lora::{AdapterCheckpointWriter, CheckpointTag, CheckpointWriter};
use crate::model::{CombinedLoss, LossTerm, ModelOutput, MultiLoraModel};
use crate::task::Tokenizer;
use crate::train::validation::{MultiLabelScorer, ValidationRunner};
use std::path::PathBuf;
use tracing::{info, warn};

/// Default micro-batch interval between validation passes
pub const DEFAULT_SAVE_STEP: u64 = 2000;

/// Default cap on validation sequence length
pub const DEFAULT_MAX_SEQ_LEN: usize = 4096;

/// Run-wide trainer settings
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerOptions {
    pub save_dir: PathBuf,
    /// Validate an adapter whenever its micro-batch count is a multiple of this
    pub save_step: u64,
    pub max_seq_len: usize,
}

impl Default for TrainerOptions {
    fn default() -> Self {
        Self { save_dir: PathBuf::from("."), save_step: DEFAULT_SAVE_STEP, max_seq_len: DEFAULT_MAX_SEQ_LEN }
    }
}

impl TrainerOptions {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self { save_dir: save_dir.into(), ..Self::default() }
    }

    pub fn with_save_step(mut self, save_step: u64) -> Self {
        self.save_step = save_step;
        self
    }

    pub fn with_max_seq_len(mut self, max_seq_len: usize) -> Self {
        self.max_seq_len = max_seq_len;
        self
    }
}

/// Binds an adapter's optimizer and schedule when its task becomes active
struct TaskActivation<'a, M: ?Sized> {
    registry: &'a mut AdapterRegistry,
    model: &'a M,
}

impl<M: MultiLoraModel + ?Sized> TaskInListener for TaskActivation<'_, M> {
    fn on_task_in(&mut self, event: &TaskInEvent) -> Result<()> {
        info!(adapter = %event.adapter_name, "loading training task");
        let slot = self.registry.get_mut(&event.adapter_name)?;
        let weights = self.model.lora_weights(&event.adapter_name)?;
        slot.train.prepare(&weights)?;
        slot.train.prepare_schedule(event.total_epochs, event.dataset_len)
    }
}

/// Coordinates training of several adapters over one shared model
///
/// Every fused batch runs one forward and one backward pass. Each adapter then
/// advances its own accumulation counter, optimizer and schedule, and is
/// validated and checkpointed on its own cadence.
pub struct MultiLoraTrainer<W: CheckpointWriter = AdapterCheckpointWriter> {
    pub(crate) registry: AdapterRegistry,
    pub(crate) options: TrainerOptions,
    writer: W,
    scorer: Option<Box<dyn MultiLabelScorer>>,
    global_step: u64,
    checkpoints: Vec<PathBuf>,
}

impl MultiLoraTrainer<AdapterCheckpointWriter> {
    /// Trainer writing checkpoints under `options.save_dir`
    pub fn new(registry: AdapterRegistry, options: TrainerOptions) -> Result<Self> {
        let writer = AdapterCheckpointWriter::new(options.save_dir.clone());
        Self::with_writer(registry, options, writer)
    }
}

impl<W: CheckpointWriter> MultiLoraTrainer<W> {
    pub fn with_writer(registry: AdapterRegistry, options: TrainerOptions, writer: W) -> Result<Self> {
        if options.save_step == 0 {
            return Err(Error::ConfigError("save_step must be positive".to_string()));
        }
        Ok(Self { registry, options, writer, scorer: None, global_step: 0, checkpoints: Vec::new() })
    }

    /// Score multi-label classification adapters with `scorer`
    pub fn with_multi_label_scorer(mut self, scorer: impl MultiLabelScorer + 'static) -> Self {
        self.scorer = Some(Box::new(scorer));
        self
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn options(&self) -> &TrainerOptions {
        &self.options
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Fused batches processed so far
    pub fn global_step(&self) -> u64 {
        self.global_step
    }

    /// Train until the dispatcher runs out of tasks, then finalize every adapter
    pub fn train<D, M>(&mut self, dispatcher: &mut D, model: &mut M) -> Result<TrainSummary>
    where
        D: Dispatcher + ?Sized,
        M: MultiLoraModel,
    {
        info!(adapters = self.registry.len(), save_step = self.options.save_step, "training started");
        while !dispatcher.check_task_done() {
            self.train_step(dispatcher, model)?;
        }
        self.finish(model)?;
        info!(global_steps = self.global_step, "training finished");
        Ok(self.summary())
    }

    /// Process one fused batch
    pub fn train_step<D, M>(&mut self, dispatcher: &mut D, model: &mut M) -> Result<()>
    where
        D: Dispatcher + ?Sized,
        M: MultiLoraModel,
    {
        let batch = {
            let mut listener = TaskActivation { registry: &mut self.registry, model: &*model };
            dispatcher.get_train_data(&mut listener)?
        };
        self.global_step += 1;

        let outputs = model.forward(&batch)?;
        let loss = self.combine_losses(&outputs)?;
        model.backward(&loss)?;

        let tokenizer = dispatcher.tokenizer();
        for output in &outputs {
            self.post_step(&output.adapter_name, model, tokenizer)?;
        }
        Ok(())
    }

    /// Normalize every adapter's loss by its accumulation target and sum them
    pub fn combine_losses(&self, outputs: &[ModelOutput]) -> Result<CombinedLoss> {
        let mut combined = CombinedLoss::new();
        for output in outputs {
            let adapter_name = &output.adapter_name;
            let target = self.registry.get(adapter_name)?.train.accumulation_target()?;
            let loss = output.loss.ok_or_else(|| Error::MissingLoss(adapter_name.clone()))?;

            let term = LossTerm {
                adapter_name: adapter_name.clone(),
                scale: 1.0 / target as f32,
                loss,
                aux_loss: output.aux_loss,
            };
            info!(adapter = %adapter_name, loss = term.scaled_loss(), "train loss");
            if let Some(aux) = term.scaled_aux_loss() {
                info!(adapter = %adapter_name, aux, "aux loss");
            }
            combined.push(term);
        }
        Ok(combined)
    }

    /// Advance one adapter after the backward pass, validating on its cadence
    fn post_step<M: MultiLoraModel>(
        &mut self,
        adapter_name: &str,
        model: &mut M,
        tokenizer: &dyn Tokenizer,
    ) -> Result<()> {
        let global_step = self.global_step;
        let save_step = self.options.save_step;
        let runner = ValidationRunner::new(self.options.max_seq_len).with_scorer(self.scorer.as_deref());

        let slot = self.registry.get_mut(adapter_name)?;
        if let Some(validation) = slot.validation.as_mut() {
            validation.mark_started(global_step);
        }
        slot.train.step()?;

        if slot.train.accumulation_count() % save_step != 0 {
            return Ok(());
        }
        let Some(validation) = slot.validation.as_mut() else {
            return Ok(());
        };

        model.eval();
        let result = runner.run(model, validation, tokenizer);
        model.train();
        let accuracy = result?;
        let steps = global_step - validation.start_step().unwrap_or(global_step) + 1;

        info!(adapter = adapter_name, accuracy, "validation acc");
        slot.train.observe_metric(accuracy);

        if slot.record_accuracy(accuracy) {
            info!(adapter = adapter_name, accuracy, steps, "new best validation acc");
            let tag = CheckpointTag::Best { steps, accuracy };
            let path = self.writer.save(&*model, &slot.train, &tag)?;
            self.checkpoints.push(path);
        }
        Ok(())
    }

    /// Flush every active adapter and save its latest weights
    ///
    /// Adapters whose task never became active are skipped.
    pub fn finish<M: MultiLoraModel>(&mut self, model: &M) -> Result<()> {
        for slot in self.registry.iter_mut() {
            if !slot.train.is_prepared() {
                warn!(adapter = slot.adapter_name(), "adapter never trained, skipping final save");
                continue;
            }
            slot.train.finish()?;
            let path = self.writer.save(model, &slot.train, &CheckpointTag::Latest)?;
            self.checkpoints.push(path);
        }
        Ok(())
    }

    /// Snapshot of the run so far
    pub fn summary(&self) -> TrainSummary {
        TrainSummary {
            global_steps: self.global_step,
            best_accuracy: self
                .registry
                .iter()
                .filter(|slot| slot.validation.is_some())
                .map(|slot| (slot.adapter_name().to_string(), slot.best_accuracy()))
                .collect(),
            optimizer_steps: self
                .registry
                .iter()
                .map(|slot| (slot.adapter_name().to_string(), slot.train.optimizer_steps()))
                .collect(),
            checkpoints: self.checkpoints.clone(),
        }
    }
}
