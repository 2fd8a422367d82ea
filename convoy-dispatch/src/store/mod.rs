//! Key-value store of job outcomes with bounded retention.

mod memory;
#[cfg(feature = "redis")]
mod redis;

use std::time::Duration;

use async_trait::async_trait;
use convoy_core::{JobOutcome, TaskId};

use crate::StoreError;

pub use memory::MemoryResultStore;
#[cfg(feature = "redis")]
#[cfg_attr(docsrs, doc(cfg(feature = "redis")))]
pub use self::redis::RedisResultStore;

/// How long outcomes are kept when no retention is configured.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Outcomes keyed by task id.
///
/// Workers write one entry per job; readers may fetch it any number of
/// times until it expires. Writing an existing key replaces it.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Store `outcome` under `task_id`.
    async fn set(&self, task_id: TaskId, outcome: &JobOutcome) -> Result<(), StoreError>;

    /// Fetch the outcome for `task_id`, if present and unexpired.
    async fn get(&self, task_id: TaskId) -> Result<Option<JobOutcome>, StoreError>;
}
