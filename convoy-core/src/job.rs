//! Queued work items and the outcomes workers publish for them.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ProblemInstance, Solution};

/// Key prefix under which outcomes are stored.
pub const RESULT_KEY_PREFIX: &str = "result:";

/// Opaque, collision-resistant identifier of a submitted job.
///
/// # Examples
/// ```
/// use convoy_core::TaskId;
///
/// let id = TaskId::generate();
/// let parsed: TaskId = id.to_string().parse()?;
/// assert_eq!(parsed, id);
/// assert!(id.result_key().starts_with("result:"));
/// # Ok::<(), uuid::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Store key holding the outcome for this task.
    #[must_use]
    pub fn result_key(&self) -> String {
        format!("{RESULT_KEY_PREFIX}{}", self.0)
    }

    /// Underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for TaskId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A problem instance waiting in, or taken from, the job queue.
///
/// On the wire the instance travels under the `data` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Identifier the outcome will be stored under.
    pub task_id: TaskId,
    /// Problem to solve.
    #[serde(rename = "data")]
    pub instance: ProblemInstance,
    /// Milliseconds since the Unix epoch at enqueue time.
    #[serde(default)]
    pub enqueued_at_ms: u64,
}

impl Job {
    /// Create a job with a fresh task id stamped with the current time.
    #[must_use]
    pub fn new(instance: ProblemInstance) -> Self {
        Self {
            task_id: TaskId::generate(),
            instance,
            enqueued_at_ms: now_ms(),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}

/// Terminal entry a worker writes for every job it takes.
///
/// Serialised untagged: either the [`Solution`] itself or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobOutcome {
    /// The engine failed or the worker caught a panic.
    Failed {
        /// Human-readable failure description.
        error: String,
    },
    /// The engine ran to completion, feasible or not.
    Solved(Solution),
}

impl JobOutcome {
    /// Wrap an error message.
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    /// The solution, when the job did not fail.
    #[must_use]
    pub const fn solution(&self) -> Option<&Solution> {
        match self {
            Self::Solved(solution) => Some(solution),
            Self::Failed { .. } => None,
        }
    }

    /// The failure message, when the job failed.
    #[must_use]
    pub const fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { error } => Some(error.as_str()),
            Self::Solved(_) => None,
        }
    }
}

impl From<Solution> for JobOutcome {
    fn from(value: Solution) -> Self {
        Self::Solved(value)
    }
}
