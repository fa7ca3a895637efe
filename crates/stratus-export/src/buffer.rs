use std::sync::{Mutex, PoisonError};
use stratus_common::types::Stats;
use serde_json::Value;

/// Latest stats per plugin, waiting for the next flush.
///
/// Only the most recent value per plugin is kept. `record` and `take` share
/// one lock, so a flush always sees a batch no writer is touching.
#[derive(Default)]
pub struct ExportBuffer {
    batch: Mutex<Stats>,
}

impl ExportBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` as the latest stats of `name`, replacing any earlier
    /// value.
    pub fn record(&self, name: &str, data: Value) {
        let mut batch = self.batch.lock().unwrap_or_else(PoisonError::into_inner);
        batch.insert(name.to_string(), data);
    }

    /// Removes and returns everything recorded so far, leaving the buffer
    /// empty.
    pub fn take(&self) -> Stats {
        let mut batch = self.batch.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *batch)
    }

    pub fn len(&self) -> usize {
        self.batch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.batch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}
