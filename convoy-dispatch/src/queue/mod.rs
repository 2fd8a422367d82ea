//! FIFO job queue shared by submitters and workers.
//!
//! [`MemoryJobQueue`] serves a single process. With the `redis` feature,
//! [`RedisJobQueue`] lets separate processes share one list key.

mod memory;
#[cfg(feature = "redis")]
mod redis;

use std::time::Duration;

use async_trait::async_trait;
use convoy_core::{Job, ProblemInstance, TaskId};

use crate::QueueError;

pub use memory::MemoryJobQueue;
#[cfg(feature = "redis")]
#[cfg_attr(docsrs, doc(cfg(feature = "redis")))]
pub use self::redis::{DEFAULT_QUEUE_KEY, RedisJobQueue};

/// Result of a bounded wait on a [`JobQueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dequeued {
    /// The job at the head of the queue, now owned by the caller.
    Job(Job),
    /// Nothing arrived within the wait.
    Empty,
    /// The queue is closed and drained.
    Closed,
}

/// Durable FIFO channel of jobs.
///
/// Every pushed job is handed to exactly one caller of [`dequeue`], in push
/// order across all producers.
///
/// [`dequeue`]: JobQueue::dequeue
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Append `job` to the tail without waiting for a consumer.
    async fn push(&self, job: Job) -> Result<(), QueueError>;

    /// Wait for the next job.
    ///
    /// Returns `Ok(None)` once the queue has been closed and drained.
    async fn dequeue(&self) -> Result<Option<Job>, QueueError>;

    /// Wait at most `wait` for the next job.
    ///
    /// A job leaves the queue only when this call returns it, so callers
    /// that must stop promptly loop over short waits instead of dropping a
    /// pending [`dequeue`](JobQueue::dequeue).
    async fn dequeue_within(&self, wait: Duration) -> Result<Dequeued, QueueError>;

    /// Wrap `instance` in a fresh job, enqueue it and return its id.
    async fn enqueue(&self, instance: ProblemInstance) -> Result<TaskId, QueueError> {
        let job = Job::new(instance);
        let task_id = job.task_id;
        self.push(job).await?;
        Ok(task_id)
    }
}
