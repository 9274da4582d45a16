//! Per-adapter validation state

use crate::error::{Error, Result};
use crate::task::{DataItem, Split, Task, TaskRegistry, TaskType, TokenId, Tokenizer, MULTI_TASK_SEPARATOR};
use std::rc::Rc;
use tracing::{debug, warn};

/// Validation task used for adapters trained on a composite task
pub const COMPOSITE_FALLBACK_TASK: &str = "arc-c";

/// Default number of examples per validation batch
pub const DEFAULT_VALIDATION_BATCH_SIZE: usize = 16;

/// Held-out data and cursor of one adapter
///
/// The held-out split is loaded once and kept as the canonical dataset. Every
/// pass works on a fresh copy, so nothing a pass does can leak into the next.
pub struct ValidationState {
    adapter_name: String,
    task: Rc<dyn Task>,
    batch_size: usize,
    canonical: Option<Vec<DataItem>>,
    data: Vec<DataItem>,
    batch_start: usize,
    batch_end: usize,
    start_step: Option<u64>,
    label_indices: Option<Vec<TokenId>>,
}

impl ValidationState {
    pub fn new(adapter_name: impl Into<String>, task: Rc<dyn Task>, batch_size: usize) -> Self {
        Self {
            adapter_name: adapter_name.into(),
            task,
            batch_size,
            canonical: None,
            data: Vec::new(),
            batch_start: 0,
            batch_end: 0,
            start_step: None,
            label_indices: None,
        }
    }

    /// Resolve `task_name` through `registry`
    ///
    /// Composite names (`"arc-c;piqa"`) validate on [`COMPOSITE_FALLBACK_TASK`].
    pub fn from_registry(
        adapter_name: impl Into<String>,
        task_name: &str,
        batch_size: usize,
        registry: &TaskRegistry,
    ) -> Result<Self> {
        let adapter_name = adapter_name.into();
        let task = if task_name.contains(MULTI_TASK_SEPARATOR) {
            warn!(
                adapter = %adapter_name,
                task = task_name,
                fallback = COMPOSITE_FALLBACK_TASK,
                "composite task validates on fallback task"
            );
            registry.get(COMPOSITE_FALLBACK_TASK)?
        } else {
            registry.get(task_name)?
        };
        Ok(Self::new(adapter_name, task, batch_size))
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    pub fn task(&self) -> &Rc<dyn Task> {
        &self.task
    }

    pub fn task_name(&self) -> &str {
        self.task.name()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// `(batch_start, batch_end)` of the last dispatched slice
    pub fn cursor(&self) -> (usize, usize) {
        (self.batch_start, self.batch_end)
    }

    /// Examples in the current working copy
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Last token of `" " + label` for every label, common-sense tasks only
    pub fn label_indices(&self) -> Option<&[TokenId]> {
        self.label_indices.as_deref()
    }

    /// Global step at which the adapter was first trained
    pub fn start_step(&self) -> Option<u64> {
        self.start_step
    }

    /// Record the first training step; later calls keep the first value
    pub fn mark_started(&mut self, global_step: u64) -> u64 {
        *self.start_step.get_or_insert(global_step)
    }

    /// Reset the cursor over a fresh working copy of the held-out split
    ///
    /// The split is loaded from the task on the first call only.
    pub fn prepare(&mut self, tokenizer: &dyn Tokenizer) -> Result<()> {
        self.batch_start = 0;
        self.batch_end = 0;

        let canonical = match self.canonical.take() {
            Some(canonical) => canonical,
            None => {
                let loaded = self.task.load_data(tokenizer, Split::Validation)?;
                debug!(
                    adapter = %self.adapter_name,
                    task = self.task.name(),
                    examples = loaded.len(),
                    "validation data loaded"
                );
                loaded
            }
        };
        self.data = canonical.clone();
        self.canonical = Some(canonical);

        self.label_indices = if self.task.task_type() == TaskType::CommonSense {
            let indices = self
                .task
                .label_list()
                .iter()
                .map(|label| {
                    tokenizer.encode(&format!(" {label}")).last().copied().ok_or_else(|| {
                        Error::ConfigError(format!(
                            "label {label:?} of task {} encodes to no tokens",
                            self.task.name()
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Some(indices)
        } else {
            None
        };
        Ok(())
    }

    /// Take the next slice of at most `batch_size` examples and advance the cursor
    pub(crate) fn next_slice(&mut self) -> &mut [DataItem] {
        let start = self.batch_end.min(self.data.len());
        let end = (start + self.batch_size).min(self.data.len());
        self.batch_start = start;
        self.batch_end = end;
        &mut self.data[start..end]
    }
}
