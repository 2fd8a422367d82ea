//! Serve command: HTTP frontend plus in-process workers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use convoy_core::{
    DEFAULT_MAX_ELEMENTS_PER_CALL, DEFAULT_TIME_BUDGET, DistanceMatrixBuilder, RoutingEngine,
};
use convoy_data::routing::{
    DEFAULT_BASE_URL, HaversineDistanceProvider, HttpDistanceProvider, HttpDistanceProviderConfig,
};
use convoy_dispatch::{
    DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL, DEFAULT_RETENTION, DispatchConfig, Dispatcher,
    SharedDistanceProvider, WorkerPool,
};
use convoy_solver::CvrpSolver;
use log::{info, warn};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::backend::Backend;
use crate::{
    ARG_API_KEY, ARG_BIND, ARG_DISTANCE_URL, ARG_MAX_ELEMENTS_PER_CALL, ARG_MAX_WAIT_MS,
    ARG_POLL_INTERVAL_MS, ARG_REDIS_URL, ARG_RETENTION_SECS, ARG_TIME_BUDGET_SECS, ARG_WORKERS,
    CliError, build_runtime, cancel_on_ctrl_c, millis, seconds,
};

/// Address the HTTP listener binds when none is configured.
pub(crate) const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// CLI arguments for the `serve` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Accept routing requests on POST /solve and answer result \
                 polls on GET /result/{task_id}. Without a distance service \
                 URL or API key, distances are great-circle metres. Without \
                 a Redis URL, jobs stay in this process.",
    about = "Run the HTTP service"
)]
#[ortho_config(prefix = "CONVOY")]
pub(crate) struct ServeArgs {
    /// Socket address to listen on, as `ip:port`.
    #[arg(long = ARG_BIND, value_name = "addr")]
    #[serde(default)]
    pub(crate) bind: Option<String>,
    /// Distance-matrix service endpoint.
    #[arg(long = ARG_DISTANCE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) distance_url: Option<String>,
    /// API key sent to the distance-matrix service.
    #[arg(long = ARG_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) api_key: Option<String>,
    /// Largest origins × destinations product per distance call.
    #[arg(long = ARG_MAX_ELEMENTS_PER_CALL, value_name = "count")]
    #[serde(default)]
    pub(crate) max_elements_per_call: Option<usize>,
    /// Number of in-process workers.
    #[arg(long = ARG_WORKERS, value_name = "count")]
    #[serde(default)]
    pub(crate) workers: Option<usize>,
    /// Share jobs through Redis instead of memory.
    #[arg(long = ARG_REDIS_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) redis_url: Option<String>,
    /// Longest a request waits for its solution before answering 202.
    #[arg(long = ARG_MAX_WAIT_MS, value_name = "ms")]
    #[serde(default)]
    pub(crate) max_wait_ms: Option<u64>,
    /// Delay between result polls while a request waits.
    #[arg(long = ARG_POLL_INTERVAL_MS, value_name = "ms")]
    #[serde(default)]
    pub(crate) poll_interval_ms: Option<u64>,
    /// Search budget per job.
    #[arg(long = ARG_TIME_BUDGET_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) time_budget_secs: Option<u64>,
    /// How long finished outcomes stay readable.
    #[arg(long = ARG_RETENTION_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) retention_secs: Option<u64>,
}

impl ServeArgs {
    pub(crate) fn into_config(self) -> Result<ServeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ServeConfig::try_from(merged)
    }
}

/// Source of road distances.
#[derive(Debug, Clone)]
pub(crate) enum DistanceSource {
    /// Great-circle metres computed locally.
    Haversine { max_elements_per_call: usize },
    /// A Distance-Matrix HTTP service.
    Http(HttpDistanceProviderConfig),
}

impl DistanceSource {
    /// Build the matrix builder the dispatcher batches requests through.
    pub(crate) fn matrix_builder(
        &self,
    ) -> Result<DistanceMatrixBuilder<SharedDistanceProvider>, CliError> {
        match self {
            Self::Haversine {
                max_elements_per_call,
            } => {
                let provider: SharedDistanceProvider =
                    Arc::new(HaversineDistanceProvider::default());
                Ok(DistanceMatrixBuilder::new(provider)
                    .with_max_elements_per_call(*max_elements_per_call))
            }
            Self::Http(config) => {
                let provider = HttpDistanceProvider::with_config(config.clone()).map_err(
                    |source| CliError::BuildDistanceProvider {
                        base_url: config.base_url.clone(),
                        source,
                    },
                )?;
                let shared: SharedDistanceProvider = Arc::new(provider);
                Ok(DistanceMatrixBuilder::new(shared)
                    .with_max_elements_per_call(config.max_elements_per_call))
            }
        }
    }
}

/// Resolved `serve` command configuration.
#[derive(Debug, Clone)]
pub(crate) struct ServeConfig {
    pub(crate) bind: SocketAddr,
    pub(crate) distance: DistanceSource,
    pub(crate) backend: Backend,
    pub(crate) dispatch: DispatchConfig,
    pub(crate) retention: Duration,
}

impl TryFrom<ServeArgs> for ServeConfig {
    type Error = CliError;

    fn try_from(args: ServeArgs) -> Result<Self, Self::Error> {
        let raw_bind = args.bind.unwrap_or_else(|| DEFAULT_BIND.to_owned());
        let bind = raw_bind.parse::<SocketAddr>().map_err(|_| CliError::InvalidArgument {
            field: ARG_BIND,
            value: raw_bind,
            reason: "expected an ip:port socket address",
        })?;

        let max_elements_per_call = args
            .max_elements_per_call
            .unwrap_or(DEFAULT_MAX_ELEMENTS_PER_CALL);
        if max_elements_per_call == 0 {
            return Err(CliError::InvalidArgument {
                field: ARG_MAX_ELEMENTS_PER_CALL,
                value: max_elements_per_call.to_string(),
                reason: "must allow at least one element per call",
            });
        }
        let distance = if args.distance_url.is_none() && args.api_key.is_none() {
            DistanceSource::Haversine {
                max_elements_per_call,
            }
        } else {
            let base_url = args
                .distance_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
            let mut config = HttpDistanceProviderConfig::new(base_url)
                .with_max_elements_per_call(max_elements_per_call);
            config.api_key = args.api_key;
            DistanceSource::Http(config)
        };

        let backend = Backend::from_redis_url(args.redis_url)?;
        let workers = args.workers.unwrap_or(1);
        if workers == 0 && !backend.is_shared() {
            return Err(CliError::InvalidArgument {
                field: ARG_WORKERS,
                value: workers.to_string(),
                reason: "jobs in memory need at least one in-process worker",
            });
        }

        let dispatch = DispatchConfig::default()
            .with_workers(workers)
            .with_max_wait(millis(ARG_MAX_WAIT_MS, args.max_wait_ms, DEFAULT_MAX_WAIT)?)
            .with_poll_interval(millis(
                ARG_POLL_INTERVAL_MS,
                args.poll_interval_ms,
                DEFAULT_POLL_INTERVAL,
            )?)
            .with_solve_time_budget(seconds(
                ARG_TIME_BUDGET_SECS,
                args.time_budget_secs,
                DEFAULT_TIME_BUDGET,
            )?);
        let retention = seconds(ARG_RETENTION_SECS, args.retention_secs, DEFAULT_RETENTION)?;

        Ok(Self {
            bind,
            distance,
            backend,
            dispatch,
            retention,
        })
    }
}

pub(crate) fn run_serve(args: ServeArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    build_runtime()?.block_on(serve(config))
}

async fn serve(config: ServeConfig) -> Result<(), CliError> {
    if matches!(config.distance, DistanceSource::Haversine { .. }) {
        warn!("no distance service configured; using great-circle distances");
    }
    let matrix = config.distance.matrix_builder()?;
    let (queue, store) = config.backend.connect(config.retention).await?;
    let engine: Arc<dyn RoutingEngine> = Arc::new(CvrpSolver::new());
    let pool = WorkerPool::spawn(
        &config.dispatch,
        Arc::clone(&queue),
        Arc::clone(&store),
        engine,
    );
    let shutdown = pool.shutdown_token();
    let dispatcher = Arc::new(Dispatcher::new(matrix, queue, store).with_config(config.dispatch));
    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|source| CliError::Bind {
            addr: config.bind,
            source,
        })?;

    tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));
    info!("serving with {} in-process workers", pool.len());
    let served = convoy_dispatch::http::serve(listener, dispatcher, shutdown).await;
    let processed = pool.shutdown().await;
    info!("stopped after {processed} jobs");
    served.map_err(CliError::Serve)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ServeConfig, CliError> {
    let merged = ServeArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ServeConfig::try_from(merged)
}
