//! Shared fixtures for integration tests
//!
//! A byte tokenizer, classification tasks whose answer is the last token of
//! each example, a model that predicts the token it sees and a dispatcher
//! replaying a fixed schedule of fused batches.

#![allow(dead_code)]

use loramux::batch::{FusedBatch, SegmentConfig};
use loramux::dispatcher::{Dispatcher, TaskInEvent, TaskInListener};
use loramux::lora::LoraConfig;
use loramux::model::{CombinedLoss, ModelOutput, MultiLoraModel};
use loramux::task::{DataItem, Split, Task, TaskRegistry, TaskType, TokenId, Tokenizer};
use loramux::{Error, Result, Tensor};
use ndarray::{Array1, Array3};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

pub const VOCAB: usize = 260;

pub struct ByteTokenizer;

impl Tokenizer for ByteTokenizer {
    fn encode(&self, text: &str) -> Vec<TokenId> {
        text.bytes().map(|b| TokenId::from(b) + 1).collect()
    }

    fn pad_id(&self) -> TokenId {
        0
    }
}

/// Classification task whose items end in their label token
pub struct LastTokenTask {
    name: String,
    task_type: TaskType,
    labels: Vec<String>,
    items: Vec<DataItem>,
}

impl LastTokenTask {
    pub fn single_label(name: &str, len: usize) -> Self {
        let items = (0..len)
            .map(|i| {
                let label = 20 + (i % 3) as TokenId;
                DataItem::new(vec![2, 3 + i as TokenId, label], vec![i64::from(label)])
            })
            .collect();
        Self { name: name.to_string(), task_type: TaskType::SingleLabelClassification, labels: Vec::new(), items }
    }

    pub fn common_sense(name: &str, len: usize) -> Self {
        let labels: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        let items = (0..len)
            .map(|i| {
                let answer = i % labels.len();
                let label_token = ByteTokenizer.encode(&format!(" {}", labels[answer]))[1];
                DataItem::new(vec![4, 5 + i as TokenId, label_token], vec![answer as i64])
            })
            .collect();
        Self { name: name.to_string(), task_type: TaskType::CommonSense, labels, items }
    }
}

impl Task for LastTokenTask {
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

    fn load_data(&self, _tokenizer: &dyn Tokenizer, _split: Split) -> Result<Vec<DataItem>> {
        Ok(self.items.clone())
    }
}

/// Registry with `sst2` (single label) and `arc-c`/`piqa` (common sense)
pub fn task_registry() -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    registry
        .register(Rc::new(LastTokenTask::single_label("sst2", 6)))
        .register(Rc::new(LastTokenTask::common_sense("arc-c", 6)))
        .register(Rc::new(LastTokenTask::common_sense("piqa", 3)));
    registry
}

/// Model predicting, at every position, the token found there
pub struct EchoModel {
    adapters: BTreeMap<String, (LoraConfig, BTreeMap<String, Tensor>)>,
    pub training: bool,
    pub backward_calls: usize,
}

impl EchoModel {
    pub fn new(adapters: &[&str]) -> Self {
        let adapters = adapters
            .iter()
            .map(|name| {
                let config = LoraConfig::new(*name, 2, 4.0).target_attention_projections();
                let mut weights = BTreeMap::new();
                weights.insert(
                    "model.layers.0.self_attn.q_proj.lora_A.weight".to_string(),
                    Tensor::from_shape_vec(2, 4, vec![0.5; 8], true),
                );
                weights.insert(
                    "model.layers.0.self_attn.q_proj.lora_B.weight".to_string(),
                    Tensor::from_shape_vec(4, 2, vec![0.5; 8], true),
                );
                (name.to_string(), (config, weights))
            })
            .collect();
        Self { adapters, training: true, backward_calls: 0 }
    }

    pub fn weights(&self, adapter_name: &str) -> &BTreeMap<String, Tensor> {
        &self.adapters[adapter_name].1
    }
}

impl MultiLoraModel for EchoModel {
    fn forward(&mut self, batch: &FusedBatch) -> Result<Vec<ModelOutput>> {
        let seq_len = batch.seq_len().unwrap_or(0);
        batch
            .segments
            .iter()
            .map(|segment| {
                let mut logits = Array3::zeros((segment.len(), seq_len, VOCAB));
                for (row, tokens) in batch.tokens[segment.batch_start..segment.batch_end].iter().enumerate() {
                    for (pos, &token) in tokens.iter().enumerate() {
                        logits[[row, pos, token as usize % VOCAB]] = 1.0;
                    }
                }
                Ok(ModelOutput {
                    adapter_name: segment.adapter_name.clone(),
                    loss: (!batch.inference_mode).then_some(1.0),
                    aux_loss: None,
                    logits,
                    batch_start: segment.batch_start,
                    batch_end: segment.batch_end,
                })
            })
            .collect()
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
        self.backward_calls += 1;
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
    }

    fn eval(&mut self) {
        self.training = false;
    }

    fn name_or_path(&self) -> &str {
        "test/base-model"
    }
}

/// Replays fused batches of one row per adapter
pub struct ReplayDispatcher {
    steps: VecDeque<(Vec<TaskInEvent>, FusedBatch)>,
}

impl ReplayDispatcher {
    /// `steps` batches over `adapters`, each announced on the first batch
    pub fn new(steps: usize, adapters: &[&str], dataset_len: usize) -> Result<Self> {
        let mut queue = VecDeque::new();
        for step in 0..steps {
            let events = if step == 0 {
                adapters
                    .iter()
                    .map(|name| TaskInEvent {
                        adapter_name: name.to_string(),
                        total_epochs: 1,
                        dataset_len,
                    })
                    .collect()
            } else {
                Vec::new()
            };
            let segments =
                adapters.iter().enumerate().map(|(i, name)| SegmentConfig::new(*name, i, i + 1)).collect();
            let tokens = adapters.iter().map(|_| vec![1, 2, 3, 4, 5]).collect();
            let batch = FusedBatch::from_segments(segments, tokens, &ByteTokenizer, 64, false)?;
            queue.push_back((events, batch));
        }
        Ok(Self { steps: queue })
    }
}

impl Dispatcher for ReplayDispatcher {
    fn check_task_done(&self) -> bool {
        self.steps.is_empty()
    }

    fn get_train_data(&mut self, listener: &mut dyn TaskInListener) -> Result<FusedBatch> {
        let (events, batch) = self
            .steps
            .pop_front()
            .ok_or_else(|| Error::InvalidBatch("no batches left".to_string()))?;
        for event in &events {
            listener.on_task_in(event)?;
        }
        Ok(batch)
    }

    fn tokenizer(&self) -> &dyn Tokenizer {
        &ByteTokenizer
    }
}
