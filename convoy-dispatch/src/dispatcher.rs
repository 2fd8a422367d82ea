//! Submission and bounded-wait polling.

use std::sync::Arc;

use convoy_core::{
    Coordinate, DistanceMatrix, DistanceMatrixBuilder, DistanceProvider, JobOutcome,
    SolveRequest, TaskId,
};
use log::{debug, info};
use tokio::time::Instant;

use crate::{DispatchConfig, JobQueue, ResultStore, StoreError, SubmitError};

/// Distance provider shared between submissions and blocking tasks.
pub type SharedDistanceProvider = Arc<dyn DistanceProvider + Send + Sync>;

/// What a submission or status query found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The worker stored an outcome.
    Completed {
        /// Task the outcome belongs to.
        task_id: TaskId,
        /// Stored solution or error.
        outcome: JobOutcome,
    },
    /// No outcome yet; query the task again later.
    Pending {
        /// Task to query.
        task_id: TaskId,
    },
}

impl Submission {
    /// Task this answer refers to.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        match self {
            Self::Completed { task_id, .. } | Self::Pending { task_id } => *task_id,
        }
    }

    /// Whether the task is still running.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// The stored outcome, when there is one.
    #[must_use]
    pub const fn outcome(&self) -> Option<&JobOutcome> {
        match self {
            Self::Completed { outcome, .. } => Some(outcome),
            Self::Pending { .. } => None,
        }
    }
}

/// Front door of the service: validates, prices, enqueues and polls.
///
/// A pending answer does not cancel the job; it keeps running and its
/// outcome can be fetched later with [`Dispatcher::status`].
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use convoy_core::test_support::sample_request;
/// use convoy_core::DistanceMatrixBuilder;
/// # use convoy_core::{Coordinate, DistanceMatrix, DistanceMatrixError, DistanceProvider};
/// use convoy_dispatch::{
///     DispatchConfig, Dispatcher, MemoryJobQueue, MemoryResultStore, SharedDistanceProvider,
/// };
/// # struct Flat;
/// # impl DistanceProvider for Flat {
/// #     fn distance_rows(&self, o: &[Coordinate], d: &[Coordinate])
/// #         -> Result<DistanceMatrix, DistanceMatrixError> {
/// #         Ok(o.iter().map(|_| vec![1; d.len()]).collect())
/// #     }
/// # }
///
/// # tokio::runtime::Builder::new_multi_thread().enable_all().build()?.block_on(async {
/// let provider: SharedDistanceProvider = Arc::new(Flat);
/// let dispatcher = Dispatcher::new(
///     DistanceMatrixBuilder::new(provider),
///     Arc::new(MemoryJobQueue::new()),
///     Arc::new(MemoryResultStore::new()),
/// )
/// .with_config(DispatchConfig::default().with_max_wait(Duration::from_millis(10)));
///
/// // Nothing consumes the queue, so the answer is pending.
/// let answer = dispatcher.submit(sample_request()).await?;
/// assert!(answer.is_pending());
/// # Ok::<(), convoy_dispatch::SubmitError>(())
/// # })?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Dispatcher {
    matrix: Arc<DistanceMatrixBuilder<SharedDistanceProvider>>,
    queue: Arc<dyn JobQueue>,
    store: Arc<dyn ResultStore>,
    config: DispatchConfig,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field(
                "max_elements_per_call",
                &self.matrix.max_elements_per_call(),
            )
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Assemble a dispatcher with default timing.
    #[must_use]
    pub fn new(
        matrix: DistanceMatrixBuilder<SharedDistanceProvider>,
        queue: Arc<dyn JobQueue>,
        store: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            matrix: Arc::new(matrix),
            queue,
            store,
            config: DispatchConfig::default(),
        }
    }

    /// Replace the timing configuration.
    #[must_use]
    pub const fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Submit `request` and wait a bounded time for its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Validation`] or
    /// [`SubmitError::DistanceMatrix`] before anything is enqueued, and
    /// queue or store errors when a backend fails.
    pub async fn submit(&self, request: SolveRequest) -> Result<Submission, SubmitError> {
        let task_id = self.enqueue(request).await?;
        Ok(self.await_result(task_id).await?)
    }

    /// Validate `request`, build its matrix and enqueue it.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::submit`].
    pub async fn enqueue(&self, request: SolveRequest) -> Result<TaskId, SubmitError> {
        request.validate()?;
        let matrix = self.build_matrix(request.coordinates.clone()).await?;
        let instance = request.into_instance(matrix);
        instance.validate()?;
        let task_id = self.queue.enqueue(instance).await?;
        info!("submitted job {task_id}");
        Ok(task_id)
    }

    /// Poll for `task_id` until an outcome appears or the wait runs out.
    ///
    /// # Errors
    ///
    /// Returns the store's error if a read fails.
    pub async fn await_result(&self, task_id: TaskId) -> Result<Submission, StoreError> {
        let deadline = Instant::now().checked_add(self.config.max_wait);
        loop {
            let answer = self.status(task_id).await?;
            if !answer.is_pending() {
                return Ok(answer);
            }
            let remaining = deadline.map_or(self.config.poll_interval, |at| {
                at.saturating_duration_since(Instant::now())
            });
            if remaining.is_zero() {
                debug!("job {task_id} still pending after {:?}", self.config.max_wait);
                return Ok(answer);
            }
            tokio::time::sleep(self.config.poll_interval.min(remaining)).await;
        }
    }

    /// Read the outcome for `task_id` once, without waiting.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the read fails.
    pub async fn status(&self, task_id: TaskId) -> Result<Submission, StoreError> {
        Ok(match self.store.get(task_id).await? {
            Some(outcome) => Submission::Completed { task_id, outcome },
            None => Submission::Pending { task_id },
        })
    }

    async fn build_matrix(
        &self,
        coordinates: Vec<Coordinate>,
    ) -> Result<DistanceMatrix, SubmitError> {
        let matrix = Arc::clone(&self.matrix);
        tokio::task::spawn_blocking(move || matrix.build(&coordinates))
            .await
            .map_err(|err| SubmitError::Internal {
                message: format!("distance matrix task failed: {err}"),
            })?
            .map_err(SubmitError::from)
    }
}
