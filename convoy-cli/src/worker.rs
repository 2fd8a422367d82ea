//! Worker command: solve jobs from a queue shared with `serve`.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use convoy_core::{DEFAULT_TIME_BUDGET, RoutingEngine};
use convoy_dispatch::{DEFAULT_RETENTION, DispatchConfig, WorkerPool};
use convoy_solver::CvrpSolver;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::{
    ARG_REDIS_URL, ARG_RETENTION_SECS, ARG_TIME_BUDGET_SECS, ARG_WORKERS, CliError,
    ENV_WORKER_REDIS_URL, build_runtime, cancel_on_ctrl_c, seconds,
};

/// CLI arguments for the `worker` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Pop jobs from the Redis queue a `convoy serve` process \
                 feeds, solve them and store each outcome for the serving \
                 process to return. Stops on Ctrl-C after finishing the jobs \
                 in hand.",
    about = "Run queue workers"
)]
#[ortho_config(prefix = "CONVOY")]
pub(crate) struct WorkerArgs {
    /// Redis connection URL shared with `convoy serve`.
    #[arg(long = ARG_REDIS_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) redis_url: Option<String>,
    /// Number of concurrent workers.
    #[arg(long = ARG_WORKERS, value_name = "count")]
    #[serde(default)]
    pub(crate) workers: Option<usize>,
    /// Search budget per job.
    #[arg(long = ARG_TIME_BUDGET_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) time_budget_secs: Option<u64>,
    /// How long finished outcomes stay readable.
    #[arg(long = ARG_RETENTION_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) retention_secs: Option<u64>,
}

impl WorkerArgs {
    pub(crate) fn into_config(self) -> Result<WorkerConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        WorkerConfig::try_from(merged)
    }
}

/// Resolved `worker` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WorkerConfig {
    pub(crate) backend: Backend,
    pub(crate) dispatch: DispatchConfig,
    pub(crate) retention: Duration,
}

impl TryFrom<WorkerArgs> for WorkerConfig {
    type Error = CliError;

    fn try_from(args: WorkerArgs) -> Result<Self, Self::Error> {
        let redis_url = args.redis_url.ok_or(CliError::MissingArgument {
            field: ARG_REDIS_URL,
            env: ENV_WORKER_REDIS_URL,
        })?;
        let backend = Backend::from_redis_url(Some(redis_url))?;
        let workers = args.workers.unwrap_or(1);
        if workers == 0 {
            return Err(CliError::InvalidArgument {
                field: ARG_WORKERS,
                value: workers.to_string(),
                reason: "must run at least one worker",
            });
        }
        let dispatch = DispatchConfig::default()
            .with_workers(workers)
            .with_solve_time_budget(seconds(
                ARG_TIME_BUDGET_SECS,
                args.time_budget_secs,
                DEFAULT_TIME_BUDGET,
            )?);
        let retention = seconds(ARG_RETENTION_SECS, args.retention_secs, DEFAULT_RETENTION)?;
        Ok(Self {
            backend,
            dispatch,
            retention,
        })
    }
}

pub(crate) fn run_worker(args: WorkerArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    build_runtime()?.block_on(work(config))
}

async fn work(config: WorkerConfig) -> Result<(), CliError> {
    let (queue, store) = config.backend.connect(config.retention).await?;
    let engine: Arc<dyn RoutingEngine> = Arc::new(CvrpSolver::new());
    let pool = WorkerPool::spawn(&config.dispatch, queue, store, engine);
    tokio::spawn(cancel_on_ctrl_c(pool.shutdown_token()));
    info!("started {} workers", pool.len());
    let processed = pool.join().await;
    info!("stopped after {processed} jobs");
    Ok(())
}
