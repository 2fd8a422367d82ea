//! Timing and sizing knobs for submission and workers.

use std::time::Duration;

use convoy_core::DEFAULT_TIME_BUDGET;

/// Delay between result-store polls when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Longest a submission waits for its outcome when none is configured.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(10);

/// Longest an idle worker blocks on the queue before checking for shutdown.
pub const DEFAULT_QUEUE_WAIT: Duration = Duration::from_secs(1);

/// Configuration shared by [`Dispatcher`](crate::Dispatcher) and
/// [`WorkerPool`](crate::WorkerPool).
///
/// # Examples
/// ```
/// use std::time::Duration;
///
/// use convoy_dispatch::DispatchConfig;
///
/// let config = DispatchConfig::default()
///     .with_max_wait(Duration::from_secs(2))
///     .with_workers(4);
/// assert_eq!(config.poll_interval, Duration::from_millis(500));
/// assert_eq!(config.workers, 4);
/// assert_eq!(config.queue_wait, Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Delay between result-store reads while a submission waits.
    pub poll_interval: Duration,
    /// Longest a submission waits before answering pending.
    pub max_wait: Duration,
    /// Search budget handed to the engine for each job.
    pub solve_time_budget: Duration,
    /// Number of workers a pool starts.
    pub workers: usize,
    /// Longest a single queue wait lasts; bounds how late an idle worker
    /// sees shutdown.
    pub queue_wait: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
            solve_time_budget: DEFAULT_TIME_BUDGET,
            workers: 1,
            queue_wait: DEFAULT_QUEUE_WAIT,
        }
    }
}

impl DispatchConfig {
    /// Set the poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the maximum wait.
    #[must_use]
    pub const fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Set the per-job search budget.
    #[must_use]
    pub const fn with_solve_time_budget(mut self, budget: Duration) -> Self {
        self.solve_time_budget = budget;
        self
    }

    /// Set the worker count.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the bound on a single queue wait.
    #[must_use]
    pub const fn with_queue_wait(mut self, queue_wait: Duration) -> Self {
        self.queue_wait = queue_wait;
        self
    }
}
