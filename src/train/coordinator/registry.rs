//! Per-adapter slots owned by the coordinator

use crate::error::{Error, Result};
use crate::train::validation::ValidationState;
use crate::train::TrainState;
use std::collections::BTreeMap;

/// Everything the coordinator tracks for one adapter
pub struct AdapterSlot {
    pub(crate) train: TrainState,
    pub(crate) validation: Option<ValidationState>,
    best_accuracy: f32,
}

impl AdapterSlot {
    pub fn new(train: TrainState, validation: Option<ValidationState>) -> Self {
        Self { train, validation, best_accuracy: 0.0 }
    }

    pub fn adapter_name(&self) -> &str {
        self.train.adapter_name()
    }

    pub fn train_state(&self) -> &TrainState {
        &self.train
    }

    pub fn validation(&self) -> Option<&ValidationState> {
        self.validation.as_ref()
    }

    /// Highest validation accuracy observed so far (starts at 0.0)
    pub fn best_accuracy(&self) -> f32 {
        self.best_accuracy
    }

    /// Record a validation result; returns whether it is a new best
    ///
    /// Only a strictly greater accuracy replaces the best score.
    pub fn record_accuracy(&mut self, accuracy: f32) -> bool {
        if accuracy > self.best_accuracy {
            self.best_accuracy = accuracy;
            true
        } else {
            false
        }
    }
}

/// Adapter name to slot mapping
#[derive(Default)]
pub struct AdapterRegistry {
    slots: BTreeMap<String, AdapterSlot>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slot; adapter names must be unique
    pub fn insert(&mut self, slot: AdapterSlot) -> Result<()> {
        let name = slot.adapter_name().to_string();
        if self.slots.contains_key(&name) {
            return Err(Error::ConfigError(format!("duplicate adapter name `{name}`")));
        }
        self.slots.insert(name, slot);
        Ok(())
    }

    pub fn get(&self, adapter_name: &str) -> Result<&AdapterSlot> {
        self.slots.get(adapter_name).ok_or_else(|| Error::UnknownAdapter(adapter_name.to_string()))
    }

    pub fn get_mut(&mut self, adapter_name: &str) -> Result<&mut AdapterSlot> {
        self.slots
            .get_mut(adapter_name)
            .ok_or_else(|| Error::UnknownAdapter(adapter_name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AdapterSlot> {
        self.slots.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut AdapterSlot> {
        self.slots.values_mut()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
