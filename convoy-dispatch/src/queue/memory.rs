//! In-process queue backed by a locked deque.

use std::collections::VecDeque;
use std::pin::pin;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use convoy_core::Job;
use log::debug;
use tokio::sync::Notify;

use super::{Dequeued, JobQueue};
use crate::QueueError;

#[derive(Debug, Default)]
struct State {
    jobs: VecDeque<Job>,
    closed: bool,
}

/// Unbounded in-memory [`JobQueue`].
///
/// Closing the queue rejects further pushes; consumers drain what is left
/// and then receive `None`.
///
/// # Examples
/// ```
/// use convoy_core::{Job, ProblemInstance};
/// use convoy_dispatch::{JobQueue, MemoryJobQueue};
///
/// # tokio::runtime::Builder::new_current_thread().build()?.block_on(async {
/// let queue = MemoryJobQueue::new();
/// let instance = ProblemInstance {
///     distance_matrix: vec![vec![0]],
///     demands: vec![0],
///     vehicle_capacities: vec![1],
///     vehicle_max_distances: vec![1],
///     pickups_deliveries: Vec::new(),
///     num_vehicles: 1,
///     depot: 0,
///     starts: vec![0],
///     ends: vec![0],
/// };
/// let task_id = queue.enqueue(instance).await?;
/// queue.close();
/// let job = queue.dequeue().await?.map(|job: Job| job.task_id);
/// assert_eq!(job, Some(task_id));
/// assert!(queue.dequeue().await?.is_none());
/// # Ok::<(), convoy_dispatch::QueueError>(())
/// # })?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
pub struct MemoryJobQueue {
    state: Mutex<State>,
    available: Notify,
}

impl MemoryJobQueue {
    /// Create an empty, open queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop accepting jobs and wake idle consumers.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_waiters();
    }

    /// Jobs waiting to be taken.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    /// Whether no job is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn push(&self, job: Job) -> Result<(), QueueError> {
        {
            let mut state = self.lock();
            if state.closed {
                return Err(QueueError::Closed);
            }
            debug!("enqueued job {}", job.task_id);
            state.jobs.push_back(job);
        }
        self.available.notify_one();
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<Job>, QueueError> {
        loop {
            let mut notified = pin!(self.available.notified());
            notified.as_mut().enable();
            {
                let mut state = self.lock();
                if let Some(job) = state.jobs.pop_front() {
                    return Ok(Some(job));
                }
                if state.closed {
                    return Ok(None);
                }
            }
            notified.await;
        }
    }

    async fn dequeue_within(&self, wait: Duration) -> Result<Dequeued, QueueError> {
        // The pop happens under the lock, so abandoning the wait loses nothing.
        match tokio::time::timeout(wait, self.dequeue()).await {
            Ok(Ok(Some(job))) => Ok(Dequeued::Job(job)),
            Ok(Ok(None)) => Ok(Dequeued::Closed),
            Ok(Err(err)) => Err(err),
            Err(_elapsed) => Ok(Dequeued::Empty),
        }
    }
}
