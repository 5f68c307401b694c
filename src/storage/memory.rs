//! In-memory checkpoint store.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::storage::CheckpointStore;

/// Checkpoint held in memory, keeping every value written.
#[derive(Debug, Default)]
pub struct MemoryStore {
    history: Mutex<Vec<u64>>,
    initial: Option<u64>,
}

impl MemoryStore {
    pub fn new(initial: Option<u64>) -> Self {
        Self {
            history: Mutex::new(Vec::new()),
            initial,
        }
    }

    /// Every value saved so far, in order.
    pub fn history(&self) -> Vec<u64> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<u64>>> {
        self.history
            .lock()
            .map_err(|_| AppError::checkpoint(self.location(), "store lock poisoned"))
    }
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn load(&self) -> Result<Option<u64>> {
        Ok(self.lock()?.last().copied().or(self.initial))
    }

    async fn save(&self, id: u64) -> Result<()> {
        self.lock()?.push(id);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
