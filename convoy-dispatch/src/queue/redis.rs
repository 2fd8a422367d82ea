//! Redis list queue: producers `RPUSH`, workers `BLPOP`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use convoy_core::Job;
use log::debug;
use redis::Client;
use redis::aio::MultiplexedConnection;
use tokio::sync::Mutex;

use super::{Dequeued, JobQueue};
use crate::QueueError;

/// List key used when none is configured.
pub const DEFAULT_QUEUE_KEY: &str = "convoy:jobs";

/// [`JobQueue`] on a Redis list holding `{task_id, data}` JSON documents.
///
/// Pushes share one multiplexed connection. A `BLPOP` holds a connection
/// of its own, so a blocked consumer never stalls concurrent pushes. Those
/// blocking connections are parked after each pop and reused by the next
/// one; a connection whose command failed is dropped instead. Clones share
/// the parked connections.
#[derive(Clone)]
pub struct RedisJobQueue {
    client: Client,
    connection: MultiplexedConnection,
    blocking: Arc<Parked<MultiplexedConnection>>,
    key: String,
}

impl std::fmt::Debug for RedisJobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisJobQueue")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl RedisJobQueue {
    /// Connect to `url` and use the default list key.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Backend`] when the URL is invalid or the server
    /// is unreachable.
    pub async fn connect(url: &str) -> Result<Self, QueueError> {
        let client = Client::open(url)?;
        let connection = client.get_multiplexed_async_connection().await?;
        Ok(Self {
            client,
            connection,
            blocking: Arc::new(Parked::default()),
            key: DEFAULT_QUEUE_KEY.to_owned(),
        })
    }

    /// Use `key` for the list.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// List key in use.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// `BLPOP` waiting up to `seconds` on a reused connection; zero blocks
    /// until an element arrives.
    async fn blocking_pop(&self, seconds: u64) -> Result<Option<Job>, QueueError> {
        let mut connection = if let Some(parked) = self.blocking.take().await {
            parked
        } else {
            debug!("opening a blocking connection for {}", self.key);
            self.client.get_multiplexed_async_connection().await?
        };
        let reply: Option<(String, String)> = redis::cmd("BLPOP")
            .arg(&self.key)
            .arg(seconds)
            .query_async(&mut connection)
            .await?;
        self.blocking.park(connection).await;
        reply
            .map(|(_, payload)| serde_json::from_str(&payload).map_err(QueueError::from))
            .transpose()
    }
}

/// Connections waiting for their next blocking command.
#[derive(Debug)]
struct Parked<C> {
    idle: Mutex<Vec<C>>,
}

impl<C> Default for Parked<C> {
    fn default() -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
        }
    }
}

impl<C> Parked<C> {
    async fn take(&self) -> Option<C> {
        self.idle.lock().await.pop()
    }

    async fn park(&self, connection: C) {
        self.idle.lock().await.push(connection);
    }
}

/// Whole seconds covering `wait`, at least one; `BLPOP` reads zero as
/// "block forever".
fn timeout_secs(wait: Duration) -> u64 {
    wait.as_secs()
        .saturating_add(u64::from(wait.subsec_nanos() > 0))
        .max(1)
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn push(&self, job: Job) -> Result<(), QueueError> {
        let payload = serde_json::to_string(&job)?;
        let mut connection = self.connection.clone();
        let _length: i64 = redis::cmd("RPUSH")
            .arg(&self.key)
            .arg(payload)
            .query_async(&mut connection)
            .await?;
        debug!("enqueued job {} on {}", job.task_id, self.key);
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<Job>, QueueError> {
        self.blocking_pop(0).await
    }

    async fn dequeue_within(&self, wait: Duration) -> Result<Dequeued, QueueError> {
        // The server times the wait out itself, so no reply is ever abandoned.
        Ok(self
            .blocking_pop(timeout_secs(wait))
            .await?
            .map_or(Dequeued::Empty, Dequeued::Job))
    }
}
