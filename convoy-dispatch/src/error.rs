//! Errors raised by the queue, the store and the submission path.

use convoy_core::{DistanceMatrixError, ValidationError};
use thiserror::Error;

/// Failures of a [`JobQueue`](crate::JobQueue) backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The queue no longer accepts jobs.
    #[error("job queue is closed")]
    Closed,
    /// A job could not be encoded or decoded.
    #[error("cannot encode job: {message}")]
    Encoding {
        /// Serialiser message.
        message: String,
    },
    /// The backing service failed.
    #[error("job queue backend failed: {message}")]
    Backend {
        /// Backend message.
        message: String,
    },
}

/// Failures of a [`ResultStore`](crate::ResultStore) backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An outcome could not be encoded or decoded.
    #[error("cannot encode outcome: {message}")]
    Encoding {
        /// Serialiser message.
        message: String,
    },
    /// The backing service failed.
    #[error("result store backend failed: {message}")]
    Backend {
        /// Backend message.
        message: String,
    },
}

impl From<serde_json::Error> for QueueError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for QueueError {
    fn from(err: redis::RedisError) -> Self {
        Self::Backend {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        Self::Backend {
            message: err.to_string(),
        }
    }
}

/// Reasons a submission fails before a result or pending signal exists.
///
/// Validation and distance-matrix failures happen before anything is
/// enqueued; queue and store failures surface backend trouble.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// The request broke a data-model invariant.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Travel costs could not be acquired.
    #[error(transparent)]
    DistanceMatrix(#[from] DistanceMatrixError),
    /// The job could not be enqueued.
    #[error(transparent)]
    Queue(#[from] QueueError),
    /// The result store could not be read.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A background task stopped unexpectedly.
    #[error("submission task failed: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}
