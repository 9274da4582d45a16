//! Inference-only validation passes
//!
//! A pass re-batches the adapter's held-out split, runs forward passes in
//! inference mode and scores the logits at each example's last real token.

use super::ValidationState;
use crate::batch::{FusedBatch, SegmentConfig};
use crate::error::{Error, Result};
use crate::model::{ModelOutput, MultiLoraModel};
use crate::task::{TaskType, Tokenizer};
use ndarray::{Array2, ArrayView1};
use tracing::{info, warn};

/// Running `(correct, total)` count of a validation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub correct: usize,
    pub total: usize,
}

impl Tally {
    pub fn new(correct: usize, total: usize) -> Self {
        Self { correct, total }
    }

    pub fn add(&mut self, other: Tally) {
        self.correct += other.correct;
        self.total += other.total;
    }

    /// `correct / total`, 0.0 when nothing was scored
    pub fn accuracy(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f32 / self.total as f32
        }
    }
}

/// Scoring rule for multi-label classification outputs
pub trait MultiLabelScorer {
    /// Score pooled logits `[rows, vocab]` against each row's label vector
    fn score(&self, pooled_logits: &Array2<f32>, labels: &[Vec<i64>]) -> Tally;
}

/// One dispatched validation slice
struct ValidationBatch {
    batch: FusedBatch,
    last_positions: Vec<usize>,
    labels: Vec<Vec<i64>>,
}

/// Cut the next slice from the working copy into an inference batch
///
/// Returns `None` once the working copy is exhausted.
fn dispatch_validation_batch(
    state: &mut ValidationState,
    tokenizer: &dyn Tokenizer,
    max_seq_len: usize,
) -> Result<Option<ValidationBatch>> {
    let adapter_name = state.adapter_name().to_string();
    let start = state.cursor().1;
    let slice = state.next_slice();
    if slice.is_empty() {
        return Ok(None);
    }

    let mut tokens = Vec::with_capacity(slice.len());
    let mut last_positions = Vec::with_capacity(slice.len());
    let mut labels = Vec::with_capacity(slice.len());
    for (offset, item) in slice.iter().enumerate() {
        if item.tokens.is_empty() {
            return Err(Error::InvalidBatch(format!(
                "adapter {adapter_name}: validation example {} has no tokens",
                start + offset
            )));
        }
        let mut seq = item.tokens.clone();
        seq.truncate(max_seq_len);
        last_positions.push(seq.len().saturating_sub(1));
        tokens.push(seq);
        labels.push(item.labels.clone());
    }

    let segments = vec![SegmentConfig::new(adapter_name, 0, tokens.len())];
    let batch = FusedBatch::from_segments(segments, tokens, tokenizer, max_seq_len, true)?;
    Ok(Some(ValidationBatch { batch, last_positions, labels }))
}

/// Index of the first maximum
fn argmax(values: ArrayView1<'_, f32>) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best, best_value), (idx, &value)| {
            if value > best_value {
                (idx, value)
            } else {
                (best, best_value)
            }
        })
        .0
}

fn label_matches(prediction: usize, labels: &[i64]) -> bool {
    labels.first().is_some_and(|&label| usize::try_from(label).is_ok_and(|label| label == prediction))
}

/// Runs validation passes for single adapters
#[derive(Clone, Copy)]
pub struct ValidationRunner<'a> {
    max_seq_len: usize,
    scorer: Option<&'a dyn MultiLabelScorer>,
}

impl<'a> ValidationRunner<'a> {
    pub fn new(max_seq_len: usize) -> Self {
        Self { max_seq_len, scorer: None }
    }

    /// Use `scorer` for multi-label classification outputs
    pub fn with_scorer(mut self, scorer: Option<&'a dyn MultiLabelScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }

    /// Run one full pass over the adapter's held-out split
    ///
    /// Returns the accuracy over every scored example of the pass.
    pub fn run<M: MultiLoraModel + ?Sized>(
        &self,
        model: &mut M,
        state: &mut ValidationState,
        tokenizer: &dyn Tokenizer,
    ) -> Result<f32> {
        let task_type = state.task().task_type();
        if task_type == TaskType::Casual {
            return Err(Error::UnsupportedTaskType(task_type.to_string()));
        }

        state.prepare(tokenizer)?;
        let mut tally = Tally::default();

        while let Some(next) = dispatch_validation_batch(state, tokenizer, self.max_seq_len)? {
            let outputs = model.forward(&next.batch)?;
            for output in &outputs {
                tally.add(self.score_output(state, output, &next)?);
            }
            info!(
                adapter = state.adapter_name(),
                task = state.task_name(),
                step = state.cursor().1,
                total = state.len(),
                "validation progress"
            );
        }

        Ok(tally.accuracy())
    }

    fn score_output(
        &self,
        state: &ValidationState,
        output: &ModelOutput,
        batch: &ValidationBatch,
    ) -> Result<Tally> {
        let rows = output.batch_start..output.batch_end;
        let (Some(positions), Some(labels)) =
            (batch.last_positions.get(rows.clone()), batch.labels.get(rows.clone()))
        else {
            return Err(Error::Model(format!(
                "adapter {} output covers rows {rows:?} of a {}-row validation batch",
                output.adapter_name,
                batch.labels.len()
            )));
        };
        let pooled = output.gather_rows(positions)?;

        let predictions: Vec<usize> = match state.task().task_type() {
            TaskType::CommonSense => {
                let label_indices = state.label_indices().ok_or_else(|| Error::NotPrepared {
                    adapter: state.adapter_name().to_string(),
                    what: "label indices",
                })?;
                pooled
                    .rows()
                    .into_iter()
                    .map(|row| {
                        let restricted: Vec<f32> = label_indices
                            .iter()
                            .map(|&idx| row.get(idx as usize).copied().unwrap_or(f32::NEG_INFINITY))
                            .collect();
                        argmax(ArrayView1::from(&restricted))
                    })
                    .collect()
            }
            TaskType::SingleLabelClassification => pooled.rows().into_iter().map(argmax).collect(),
            TaskType::MultiLabelClassification => {
                return match self.scorer {
                    Some(scorer) => Ok(scorer.score(&pooled, labels)),
                    None => {
                        warn!(
                            adapter = state.adapter_name(),
                            rows = labels.len(),
                            "no multi-label scorer installed, segment not scored"
                        );
                        Ok(Tally::default())
                    }
                };
            }
            other => return Err(Error::UnsupportedTaskType(other.to_string())),
        };

        let correct = predictions
            .iter()
            .zip(labels)
            .filter(|&(&prediction, labels)| label_matches(prediction, labels))
            .count();
        Ok(Tally::new(correct, predictions.len()))
    }
}

/// Run one validation pass with no multi-label scorer
pub fn run_validation<M: MultiLoraModel + ?Sized>(
    model: &mut M,
    state: &mut ValidationState,
    tokenizer: &dyn Tokenizer,
    max_seq_len: usize,
) -> Result<f32> {
    ValidationRunner::new(max_seq_len).run(model, state, tokenizer)
}
