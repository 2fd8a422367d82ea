//! Job plumbing between the HTTP surface and the routing engine.
//!
//! A [`Dispatcher`] validates a [`SolveRequest`](convoy_core::SolveRequest),
//! builds its distance matrix and pushes a job onto a [`JobQueue`]. Workers
//! in a [`WorkerPool`] pop jobs, solve them with a
//! [`RoutingEngine`](convoy_core::RoutingEngine) and write the outcome to a
//! [`ResultStore`]. The dispatcher polls the store until the outcome appears
//! or its wait expires, in which case the caller receives the task id and
//! collects the result later.
//!
//! In-memory queue and store implementations are always available. The
//! `redis` feature adds list- and key-backed implementations so submitters
//! and workers can run in separate processes.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod dispatcher;
mod error;
pub mod http;
pub mod queue;
pub mod store;
mod worker;

pub use config::{DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL, DEFAULT_QUEUE_WAIT, DispatchConfig};
pub use dispatcher::{Dispatcher, SharedDistanceProvider, Submission};
pub use error::{QueueError, StoreError, SubmitError};
pub use queue::{Dequeued, JobQueue, MemoryJobQueue};
#[cfg(feature = "redis")]
#[cfg_attr(docsrs, doc(cfg(feature = "redis")))]
pub use queue::{DEFAULT_QUEUE_KEY, RedisJobQueue};
pub use store::{DEFAULT_RETENTION, MemoryResultStore, ResultStore};
#[cfg(feature = "redis")]
#[cfg_attr(docsrs, doc(cfg(feature = "redis")))]
pub use store::RedisResultStore;
pub use worker::{Worker, WorkerPool};
