//! Redis string store: `SET result:<task_id> <json> EX <retention>`.

use std::time::Duration;

use async_trait::async_trait;
use convoy_core::{JobOutcome, TaskId};
use redis::Client;
use redis::aio::MultiplexedConnection;

use super::{DEFAULT_RETENTION, ResultStore};
use crate::StoreError;

/// [`ResultStore`] writing JSON outcomes under `result:<task_id>` keys.
#[derive(Clone)]
pub struct RedisResultStore {
    connection: MultiplexedConnection,
    retention: Duration,
}

impl std::fmt::Debug for RedisResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisResultStore")
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}

impl RedisResultStore {
    /// Connect to `url` with the default one-hour retention.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when the URL is invalid or the server
    /// is unreachable.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url)?;
        let connection = client.get_multiplexed_async_connection().await?;
        Ok(Self {
            connection,
            retention: DEFAULT_RETENTION,
        })
    }

    /// Expire entries after `retention`, rounded up to whole seconds.
    #[must_use]
    pub const fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    fn expiry_secs(&self) -> u64 {
        let whole = self.retention.as_secs();
        let rounded = if self.retention.subsec_nanos() > 0 {
            whole.saturating_add(1)
        } else {
            whole
        };
        rounded.max(1)
    }
}

#[async_trait]
impl ResultStore for RedisResultStore {
    async fn set(&self, task_id: TaskId, outcome: &JobOutcome) -> Result<(), StoreError> {
        let payload = serde_json::to_string(outcome)?;
        let mut connection = self.connection.clone();
        let () = redis::cmd("SET")
            .arg(task_id.result_key())
            .arg(payload)
            .arg("EX")
            .arg(self.expiry_secs())
            .query_async(&mut connection)
            .await?;
        Ok(())
    }

    async fn get(&self, task_id: TaskId) -> Result<Option<JobOutcome>, StoreError> {
        let mut connection = self.connection.clone();
        let payload: Option<String> = redis::cmd("GET")
            .arg(task_id.result_key())
            .query_async(&mut connection)
            .await?;
        payload
            .map(|json| serde_json::from_str(&json).map_err(StoreError::from))
            .transpose()
    }
}
