//! Queue and store selection shared by `serve` and `worker`.

use std::sync::Arc;
use std::time::Duration;

use convoy_dispatch::{JobQueue, MemoryJobQueue, MemoryResultStore, ResultStore};

use crate::CliError;

/// Where jobs and outcomes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Backend {
    /// In-process queue and store; only workers in the same process see jobs.
    Memory,
    /// Redis list and keys shared across processes.
    #[cfg(feature = "redis")]
    Redis {
        /// Connection URL such as `redis://localhost:6379/0`.
        url: String,
    },
}

impl Backend {
    /// Pick a backend from an optional Redis URL.
    pub(crate) fn from_redis_url(url: Option<String>) -> Result<Self, CliError> {
        match url {
            None => Ok(Self::Memory),
            #[cfg(feature = "redis")]
            Some(url) => Ok(Self::Redis { url }),
            #[cfg(not(feature = "redis"))]
            Some(_) => Err(CliError::MissingFeature {
                feature: "redis",
                action: "a Redis backend",
            }),
        }
    }

    /// Whether jobs are visible to worker processes other than this one.
    pub(crate) const fn is_shared(&self) -> bool {
        !matches!(self, Self::Memory)
    }

    /// Connect to the backend.
    #[cfg_attr(
        not(feature = "redis"),
        expect(clippy::unused_async, reason = "only the Redis backend awaits")
    )]
    pub(crate) async fn connect(
        &self,
        retention: Duration,
    ) -> Result<(Arc<dyn JobQueue>, Arc<dyn ResultStore>), CliError> {
        match self {
            Self::Memory => Ok((
                Arc::new(MemoryJobQueue::new()),
                Arc::new(MemoryResultStore::new().with_retention(retention)),
            )),
            #[cfg(feature = "redis")]
            Self::Redis { url } => {
                let queue = convoy_dispatch::RedisJobQueue::connect(url).await?;
                let store = convoy_dispatch::RedisResultStore::connect(url)
                    .await?
                    .with_retention(retention);
                log::info!("connected to the Redis backend");
                Ok((Arc::new(queue), Arc::new(store)))
            }
        }
    }
}
