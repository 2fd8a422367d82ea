//! Workers that drain the queue, run the engine and publish outcomes.

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use convoy_core::{DEFAULT_TIME_BUDGET, Job, JobOutcome, RoutingEngine};
use log::{error, info, warn};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{DEFAULT_QUEUE_WAIT, DispatchConfig, Dequeued, JobQueue, ResultStore};

/// Pause after a queue failure before asking again.
const QUEUE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// A single consumer of the job queue.
///
/// Every job a worker takes ends with exactly one result-store entry: the
/// solution, or `{error}` when the engine fails or panics. Failures never
/// end the loop.
#[derive(Clone)]
pub struct Worker {
    id: usize,
    queue: Arc<dyn JobQueue>,
    store: Arc<dyn ResultStore>,
    engine: Arc<dyn RoutingEngine>,
    time_budget: Duration,
    queue_wait: Duration,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("time_budget", &self.time_budget)
            .field("queue_wait", &self.queue_wait)
            .finish_non_exhaustive()
    }
}

impl Worker {
    /// Create worker `id` with the default search budget.
    #[must_use]
    pub fn new(
        id: usize,
        queue: Arc<dyn JobQueue>,
        store: Arc<dyn ResultStore>,
        engine: Arc<dyn RoutingEngine>,
    ) -> Self {
        Self {
            id,
            queue,
            store,
            engine,
            time_budget: DEFAULT_TIME_BUDGET,
            queue_wait: DEFAULT_QUEUE_WAIT,
        }
    }

    /// Give the engine `time_budget` per job.
    #[must_use]
    pub const fn with_time_budget(mut self, time_budget: Duration) -> Self {
        self.time_budget = time_budget;
        self
    }

    /// Bound each wait on the queue by `queue_wait`.
    #[must_use]
    pub const fn with_queue_wait(mut self, queue_wait: Duration) -> Self {
        self.queue_wait = queue_wait;
        self
    }

    /// Take jobs until `shutdown` fires or the queue is closed and drained.
    ///
    /// Cancellation is checked between bounded queue waits, never during
    /// one, so a job the queue hands over is always processed. An idle
    /// worker therefore stops within one queue wait. A job already being
    /// solved is finished and stored first. Returns the number of jobs
    /// processed.
    pub async fn run(&self, shutdown: CancellationToken) -> usize {
        info!("worker {} started", self.id);
        let mut processed = 0_usize;
        while !shutdown.is_cancelled() {
            match self.queue.dequeue_within(self.queue_wait).await {
                Ok(Dequeued::Job(job)) => {
                    self.process(job).await;
                    processed = processed.saturating_add(1);
                }
                Ok(Dequeued::Empty) => {}
                Ok(Dequeued::Closed) => {
                    info!("worker {}: queue closed", self.id);
                    break;
                }
                Err(err) => {
                    warn!("worker {}: dequeue failed: {err}", self.id);
                    tokio::select! {
                        () = shutdown.cancelled() => break,
                        () = tokio::time::sleep(QUEUE_RETRY_DELAY) => {}
                    }
                }
            }
        }
        info!("worker {} stopped after {processed} jobs", self.id);
        processed
    }

    /// Solve `job` and store its outcome, returning what was stored.
    ///
    /// A store failure is logged; the outcome is still returned.
    pub async fn process(&self, job: Job) -> JobOutcome {
        let task_id = job.task_id;
        let started_at = Instant::now();
        info!("worker {} solving job {task_id}", self.id);
        let outcome = self.solve(job).await;
        match &outcome {
            JobOutcome::Solved(solution) => info!(
                "job {task_id} finished ({:?}, objective {}) in {:?}",
                solution.status,
                solution.objective,
                started_at.elapsed()
            ),
            JobOutcome::Failed { error } => warn!("job {task_id} failed: {error}"),
        }
        if let Err(err) = self.store.set(task_id, &outcome).await {
            error!("cannot store outcome of job {task_id}: {err}");
        }
        outcome
    }

    async fn solve(&self, job: Job) -> JobOutcome {
        let engine = Arc::clone(&self.engine);
        let budget = self.time_budget;
        let solving = tokio::task::spawn_blocking(move || engine.solve(&job.instance, budget));
        match solving.await {
            Ok(Ok(solution)) => JobOutcome::Solved(solution),
            Ok(Err(err)) => JobOutcome::failed(err.to_string()),
            Err(err) => JobOutcome::failed(describe_join_error(err)),
        }
    }
}

fn describe_join_error(err: JoinError) -> String {
    if err.is_panic() {
        let payload = err.into_panic();
        format!("worker panicked: {}", panic_message(&*payload))
    } else {
        format!("solve task ended early: {err}")
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// A set of workers sharing one queue, store and engine.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use convoy_core::{JobOutcome, RoutingEngine};
/// use convoy_core::test_support::{FailingEngine, sample_instance};
/// use convoy_dispatch::{
///     DispatchConfig, JobQueue, MemoryJobQueue, MemoryResultStore, ResultStore, WorkerPool,
/// };
///
/// # tokio::runtime::Builder::new_multi_thread().enable_all().build()?.block_on(async {
/// let queue = Arc::new(MemoryJobQueue::new());
/// let store = Arc::new(MemoryResultStore::new());
/// let engine: Arc<dyn RoutingEngine> = Arc::new(FailingEngine);
/// let pool = WorkerPool::spawn(
///     &DispatchConfig::default().with_workers(2),
///     queue.clone(),
///     store.clone(),
///     engine,
/// );
///
/// let task_id = queue.enqueue(sample_instance(vec![vec![0; 16]; 16])).await?;
/// queue.close();
/// assert_eq!(pool.join().await, 1);
/// assert!(matches!(store.get(task_id).await?, Some(JobOutcome::Failed { .. })));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// # })?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct WorkerPool {
    shutdown: CancellationToken,
    handles: Vec<JoinHandle<usize>>,
}

impl WorkerPool {
    /// Start `config.workers` workers on the current runtime.
    ///
    /// A pool of zero workers is valid when another process drains the queue.
    #[must_use]
    pub fn spawn(
        config: &DispatchConfig,
        queue: Arc<dyn JobQueue>,
        store: Arc<dyn ResultStore>,
        engine: Arc<dyn RoutingEngine>,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let prototype = Worker::new(0, queue, store, engine)
            .with_time_budget(config.solve_time_budget)
            .with_queue_wait(config.queue_wait);
        let handles = (0..config.workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    ..prototype.clone()
                };
                let token = shutdown.child_token();
                tokio::spawn(async move { worker.run(token).await })
            })
            .collect();
        Self { shutdown, handles }
    }

    /// Number of workers started.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether the pool has no workers.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Token that stops every worker when cancelled.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop idle workers, let busy ones finish their job, and wait.
    ///
    /// Returns the total number of jobs processed.
    pub async fn shutdown(self) -> usize {
        self.shutdown.cancel();
        self.join().await
    }

    /// Wait for every worker to stop on its own.
    ///
    /// Returns the total number of jobs processed.
    pub async fn join(self) -> usize {
        let mut processed = 0_usize;
        for handle in self.handles {
            match handle.await {
                Ok(count) => processed = processed.saturating_add(count),
                Err(err) => error!("worker task failed: {err}"),
            }
        }
        processed
    }
}
