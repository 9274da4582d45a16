//! Training batch dispatcher contract
//!
//! The dispatcher assembles fused training batches across adapters. Whenever it
//! starts serving a new adapter's task it emits a [`TaskInEvent`] to the listener
//! handed to [`Dispatcher::get_train_data`]. Delivery is synchronous, on the
//! caller's thread, before the batch containing that adapter is returned.

use crate::batch::FusedBatch;
use crate::error::Result;
use crate::task::Tokenizer;

/// A task became active in the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInEvent {
    pub adapter_name: String,
    pub total_epochs: usize,
    /// Number of training examples in the task
    pub dataset_len: usize,
}

/// Receiver of task activation events
pub trait TaskInListener {
    fn on_task_in(&mut self, event: &TaskInEvent) -> Result<()>;
}

/// Source of fused training batches
pub trait Dispatcher {
    /// Whether every task has been exhausted
    fn check_task_done(&self) -> bool;

    /// Next fused training batch
    ///
    /// Task activation events for adapters entering this batch are delivered to
    /// `listener` before returning; a listener error aborts the call.
    fn get_train_data(&mut self, listener: &mut dyn TaskInListener) -> Result<FusedBatch>;

    /// Tokenizer shared by all tasks
    fn tokenizer(&self) -> &dyn Tokenizer;
}
