//! In-process result store with lazy expiry.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use convoy_core::{JobOutcome, TaskId};

use super::{DEFAULT_RETENTION, ResultStore};
use crate::StoreError;

#[derive(Debug, Clone)]
struct Entry {
    outcome: JobOutcome,
    created_at: Instant,
}

/// [`ResultStore`] holding outcomes in a map.
///
/// Entries older than the retention period are treated as absent and are
/// purged on the next write.
#[derive(Debug)]
pub struct MemoryResultStore {
    entries: Mutex<HashMap<TaskId, Entry>>,
    retention: Duration,
}

impl Default for MemoryResultStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryResultStore {
    /// Create an empty store with the default one-hour retention.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            retention: DEFAULT_RETENTION,
        }
    }

    /// Keep entries for `retention`.
    #[must_use]
    pub const fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Configured retention.
    #[must_use]
    pub const fn retention(&self) -> Duration {
        self.retention
    }

    /// Number of stored entries, expired ones included until purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_live(&self, entry: &Entry) -> bool {
        entry.created_at.elapsed() < self.retention
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn set(&self, task_id: TaskId, outcome: &JobOutcome) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, entry| self.is_live(entry));
        entries.insert(
            task_id,
            Entry {
                outcome: outcome.clone(),
                created_at: Instant::now(),
            },
        );
        Ok(())
    }

    async fn get(&self, task_id: TaskId) -> Result<Option<JobOutcome>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .get(&task_id)
            .filter(|entry| self.is_live(entry))
            .map(|entry| entry.outcome.clone()))
    }
}
