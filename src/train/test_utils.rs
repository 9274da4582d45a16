//! Deterministic collaborators for trainer tests

use crate::batch::{FusedBatch, SegmentConfig};
use crate::dispatcher::{Dispatcher, TaskInEvent, TaskInListener};
use crate::error::{Error, Result};
use crate::lora::{CheckpointTag, CheckpointWriter, LoraConfig};
use crate::model::{CombinedLoss, ModelOutput, MultiLoraModel};
use crate::task::{DataItem, Split, Task, TaskType, TokenId, Tokenizer};
use crate::train::TrainState;
use crate::Tensor;
use ndarray::{Array1, Array3};
use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;

/// Logit width of [`StubModel`]; covers every id [`StubTokenizer`] emits
pub const VOCAB: usize = 260;

/// Byte-level tokenizer: byte `b` encodes as `b + 1`, padding is 0
pub struct StubTokenizer;

impl Tokenizer for StubTokenizer {
    fn encode(&self, text: &str) -> Vec<TokenId> {
        text.bytes().map(|b| TokenId::from(b) + 1).collect()
    }

    fn pad_id(&self) -> TokenId {
        0
    }
}

/// Token id of the last byte of `" " + label`
pub fn label_token(label: &str) -> TokenId {
    StubTokenizer.encode(&format!(" {label}")).last().copied().unwrap_or(0)
}

/// In-memory task with fixed train and validation items
pub struct StubTask {
    pub name: String,
    pub task_type: TaskType,
    pub labels: Vec<String>,
    pub train: Vec<DataItem>,
    pub validation: Vec<DataItem>,
}

impl StubTask {
    /// Items whose class label equals their last token
    pub fn single_label(name: &str, len: usize) -> Self {
        let validation = (0..len)
            .map(|i| {
                let label = 10 + (i % 2) as TokenId;
                DataItem::new(vec![3, 4 + i as TokenId, label], vec![i64::from(label)])
            })
            .collect();
        Self {
            name: name.to_string(),
            task_type: TaskType::SingleLabelClassification,
            labels: Vec::new(),
            train: vec![DataItem::new(vec![1, 2, 3], vec![0]); len],
            validation,
        }
    }

    /// Two-choice items ending in the answer's label token
    pub fn common_sense(name: &str, len: usize) -> Self {
        let labels = vec!["A".to_string(), "B".to_string()];
        let validation = (0..len)
            .map(|i| {
                let answer = i % 2;
                let tokens = vec![5, 6 + i as TokenId, label_token(&labels[answer])];
                DataItem::new(tokens, vec![answer as i64])
            })
            .collect();
        Self {
            name: name.to_string(),
            task_type: TaskType::CommonSense,
            labels,
            train: vec![DataItem::new(vec![1, 2, 3], vec![0]); len],
            validation,
        }
    }

    pub fn multi_label(name: &str, len: usize) -> Self {
        Self {
            task_type: TaskType::MultiLabelClassification,
            labels: vec!["x".into(), "y".into()],
            validation: vec![DataItem::new(vec![7, 8], vec![1, 0]); len],
            ..Self::single_label(name, len)
        }
    }

    pub fn casual(name: &str) -> Self {
        Self {
            task_type: TaskType::Casual,
            validation: vec![DataItem::new(vec![7, 8, 9], Vec::new())],
            ..Self::single_label(name, 1)
        }
    }

    pub fn with_validation(mut self, validation: Vec<DataItem>) -> Self {
        self.validation = validation;
        self
    }
}

impl Task for StubTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn task_type(&self) -> TaskType {
        self.task_type
    }

    fn peft_task_type(&self) -> &str {
        "CAUSAL_LM"
    }

    fn label_list(&self) -> Vec<String> {
        self.labels.clone()
    }

    fn load_data(&self, _tokenizer: &dyn Tokenizer, split: Split) -> Result<Vec<DataItem>> {
        Ok(match split {
            Split::Train => self.train.clone(),
            Split::Validation => self.validation.clone(),
        })
    }
}

/// One LoRA A/B factor pair filled with 0.1
pub fn lora_weights(rank: usize, dim: usize) -> BTreeMap<String, Tensor> {
    let mut weights = BTreeMap::new();
    weights.insert(
        "layers.0.q_proj.lora_A.weight".to_string(),
        Tensor::from_shape_vec(rank, dim, vec![0.1; rank * dim], true),
    );
    weights.insert(
        "layers.0.q_proj.lora_B.weight".to_string(),
        Tensor::from_shape_vec(dim, rank, vec![0.1; rank * dim], true),
    );
    weights
}

/// Model whose logits favour, at every position, the token found there
///
/// Inference passes predict each example's last real token. Entries of
/// `misses` make the next inference pass get that many rows wrong.
pub struct StubModel {
    adapters: BTreeMap<String, (LoraConfig, BTreeMap<String, Tensor>)>,
    losses: BTreeMap<String, (f32, Option<f32>)>,
    pub misses: VecDeque<usize>,
    pub training: bool,
    pub mode_switches: Vec<bool>,
    pub backward_calls: Vec<CombinedLoss>,
    pub inference_passes: usize,
}

impl StubModel {
    pub fn new() -> Self {
        Self {
            adapters: BTreeMap::new(),
            losses: BTreeMap::new(),
            misses: VecDeque::new(),
            training: true,
            mode_switches: Vec::new(),
            backward_calls: Vec::new(),
            inference_passes: 0,
        }
    }

    pub fn with_adapter(mut self, name: &str, loss: f32, aux_loss: Option<f32>) -> Self {
        self.adapters
            .insert(name.to_string(), (LoraConfig::new(name, 2, 4.0), lora_weights(2, 3)));
        self.losses.insert(name.to_string(), (loss, aux_loss));
        self
    }

    pub fn with_misses(mut self, misses: impl IntoIterator<Item = usize>) -> Self {
        self.misses = misses.into_iter().collect();
        self
    }

    pub fn weights(&self, adapter_name: &str) -> &BTreeMap<String, Tensor> {
        &self.adapters[adapter_name].1
    }
}

impl MultiLoraModel for StubModel {
    fn forward(&mut self, batch: &FusedBatch) -> Result<Vec<ModelOutput>> {
        let seq_len = batch.seq_len().unwrap_or(0);
        let mut misses = if batch.inference_mode {
            self.inference_passes += 1;
            self.misses.pop_front().unwrap_or(0)
        } else {
            0
        };

        let mut outputs = Vec::with_capacity(batch.segments.len());
        for segment in &batch.segments {
            let (loss, aux_loss) = *self
                .losses
                .get(&segment.adapter_name)
                .ok_or_else(|| Error::UnknownAdapter(segment.adapter_name.clone()))?;

            let mut logits = Array3::zeros((segment.len(), seq_len, VOCAB));
            for (row, tokens) in batch.tokens[segment.batch_start..segment.batch_end].iter().enumerate() {
                let wrong = misses > 0;
                if wrong {
                    misses -= 1;
                }
                for (pos, &token) in tokens.iter().enumerate() {
                    let favoured = if wrong { token as usize + 1 } else { token as usize };
                    logits[[row, pos, favoured % VOCAB]] = 1.0;
                }
            }

            outputs.push(ModelOutput {
                adapter_name: segment.adapter_name.clone(),
                loss: (!batch.inference_mode).then_some(loss),
                aux_loss: aux_loss.filter(|_| !batch.inference_mode),
                logits,
                batch_start: segment.batch_start,
                batch_end: segment.batch_end,
            });
        }
        Ok(outputs)
    }

    fn backward(&mut self, loss: &CombinedLoss) -> Result<()> {
        for term in loss.terms() {
            let (_, weights) = self
                .adapters
                .get(&term.adapter_name)
                .ok_or_else(|| Error::UnknownAdapter(term.adapter_name.clone()))?;
            for param in weights.values() {
                param.accumulate_grad(&Array1::from_elem(param.numel(), term.scale));
            }
        }
        self.backward_calls.push(loss.clone());
        Ok(())
    }

    fn lora_weights(&self, adapter_name: &str) -> Result<BTreeMap<String, Tensor>> {
        self.adapters
            .get(adapter_name)
            .map(|(_, weights)| weights.clone())
            .ok_or_else(|| Error::UnknownAdapter(adapter_name.to_string()))
    }

    fn adapter_config(&self, adapter_name: &str) -> Option<&LoraConfig> {
        self.adapters.get(adapter_name).map(|(config, _)| config)
    }

    fn train(&mut self) {
        self.training = true;
        self.mode_switches.push(true);
    }

    fn eval(&mut self) {
        self.training = false;
        self.mode_switches.push(false);
    }

    fn name_or_path(&self) -> &str {
        "stub/base-model"
    }
}

/// Replays a fixed sequence of training batches
pub struct ScriptedDispatcher {
    steps: VecDeque<(Vec<TaskInEvent>, FusedBatch)>,
}

impl ScriptedDispatcher {
    pub fn new() -> Self {
        Self { steps: VecDeque::new() }
    }

    /// Queue one batch with `rows` three-token rows per adapter
    pub fn push(&mut self, events: Vec<TaskInEvent>, segments: &[(&str, usize)]) -> &mut Self {
        let mut configs = Vec::new();
        let mut tokens = Vec::new();
        for (name, rows) in segments {
            configs.push(SegmentConfig::new(*name, tokens.len(), tokens.len() + rows));
            tokens.extend((0..*rows).map(|_| vec![1, 2, 3]));
        }
        if let Ok(batch) = FusedBatch::from_segments(configs, tokens, &StubTokenizer, 64, false) {
            self.steps.push_back((events, batch));
        }
        self
    }

    /// Queue `steps` identical batches, announcing each adapter on the first
    pub fn repeat(&mut self, steps: usize, adapters: &[&str], dataset_len: usize) -> &mut Self {
        let segments: Vec<(&str, usize)> = adapters.iter().map(|name| (*name, 1)).collect();
        for step in 0..steps {
            let events = if step == 0 { task_in_events(adapters, 1, dataset_len) } else { Vec::new() };
            self.push(events, &segments);
        }
        self
    }
}

pub fn task_in_events(adapters: &[&str], total_epochs: usize, dataset_len: usize) -> Vec<TaskInEvent> {
    adapters
        .iter()
        .map(|name| TaskInEvent { adapter_name: name.to_string(), total_epochs, dataset_len })
        .collect()
}

impl Dispatcher for ScriptedDispatcher {
    fn check_task_done(&self) -> bool {
        self.steps.is_empty()
    }

    fn get_train_data(&mut self, listener: &mut dyn TaskInListener) -> Result<FusedBatch> {
        let (events, batch) = self
            .steps
            .pop_front()
            .ok_or_else(|| Error::InvalidBatch("dispatcher exhausted".to_string()))?;
        for event in &events {
            listener.on_task_in(event)?;
        }
        Ok(batch)
    }

    fn tokenizer(&self) -> &dyn Tokenizer {
        &StubTokenizer
    }
}

/// Checkpoint writer that only records what it was asked to save
#[derive(Default)]
pub struct RecordingWriter {
    pub saved: Vec<(String, CheckpointTag)>,
}

impl CheckpointWriter for RecordingWriter {
    fn save(
        &mut self,
        _model: &dyn MultiLoraModel,
        state: &TrainState,
        tag: &CheckpointTag,
    ) -> Result<PathBuf> {
        self.saved.push((state.adapter_name().to_string(), tag.clone()));
        Ok(PathBuf::from(state.adapter_name()))
    }
}
