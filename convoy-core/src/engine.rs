//! Seam between job execution and routing optimisation.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::{ProblemInstance, Solution};

/// Search budget used when a caller does not choose one.
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(30);

/// Errors an engine reports instead of a [`Solution`].
///
/// Infeasibility is not an error; engines return
/// [`Solution::infeasible`](crate::Solution::infeasible) for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The instance could not be turned into a model.
    #[error("cannot build routing model: {reason}")]
    ModelConstruction {
        /// Which invariant the instance broke.
        reason: String,
    },
    /// The search failed unexpectedly.
    #[error("routing engine failed: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

/// Solve routing problems within a wall-clock budget.
///
/// Implementations are synchronous and run to completion on the calling
/// thread; async callers should move them onto a blocking pool.
pub trait RoutingEngine: Send + Sync {
    /// Produce the best assignment found within `time_budget`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the instance cannot be modelled or the
    /// search fails.
    fn solve(
        &self,
        instance: &ProblemInstance,
        time_budget: Duration,
    ) -> Result<Solution, EngineError>;
}

impl<E: RoutingEngine + ?Sized> RoutingEngine for Arc<E> {
    fn solve(
        &self,
        instance: &ProblemInstance,
        time_budget: Duration,
    ) -> Result<Solution, EngineError> {
        (**self).solve(instance, time_budget)
    }
}

impl<E: RoutingEngine + ?Sized> RoutingEngine for Box<E> {
    fn solve(
        &self,
        instance: &ProblemInstance,
        time_budget: Duration,
    ) -> Result<Solution, EngineError> {
        (**self).solve(instance, time_budget)
    }
}
