//! Command-line interface for the Convoy routing service.
//!
//! `convoy serve` runs the HTTP frontend with in-process workers,
//! `convoy worker` runs workers against a shared Redis queue, and
//! `convoy solve` solves a problem file directly. Every option can also be
//! set through `CONVOY_`-prefixed environment variables or configuration
//! files.
#![forbid(unsafe_code)]

use std::ffi::OsString;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{info, warn};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

mod backend;
mod error;
mod fs;
mod serve;
mod solve;
mod worker;

pub use error::CliError;

use serve::ServeArgs;
use solve::SolveArgs;
use worker::WorkerArgs;

const ARG_BIND: &str = "bind";
const ARG_DISTANCE_URL: &str = "distance-url";
const ARG_API_KEY: &str = "api-key";
const ARG_MAX_ELEMENTS_PER_CALL: &str = "max-elements-per-call";
const ARG_WORKERS: &str = "workers";
const ARG_REDIS_URL: &str = "redis-url";
const ARG_MAX_WAIT_MS: &str = "max-wait-ms";
const ARG_POLL_INTERVAL_MS: &str = "poll-interval-ms";
const ARG_TIME_BUDGET_SECS: &str = "time-budget-secs";
const ARG_RETENTION_SECS: &str = "retention-secs";
const ARG_SOLVE_PROBLEM: &str = "problem";
const ENV_SOLVE_PROBLEM: &str = "CONVOY_CMDS_SOLVE_PROBLEM_PATH";
const ENV_WORKER_REDIS_URL: &str = "CONVOY_CMDS_WORKER_REDIS_URL";

/// Run the Convoy CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns the failing command's error.
pub fn run() -> Result<(), CliError> {
    run_from(std::env::args_os())
}

/// Run the Convoy CLI with explicit arguments, the first being the binary name.
///
/// Help and version requests print and exit the process.
///
/// # Errors
///
/// Returns the failing command's error.
pub fn run_from<I, T>(args: I) -> Result<(), CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => return Err(err.into()),
    };
    match cli.command {
        Command::Serve(args) => serve::run_serve(args),
        Command::Worker(args) => worker::run_worker(args),
        Command::Solve(args) => solve::run_solve(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "convoy",
    about = "Capacitated vehicle routing with pickup and delivery",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Accept routing requests over HTTP.
    Serve(ServeArgs),
    /// Solve queued jobs from a shared Redis queue.
    Worker(WorkerArgs),
    /// Solve a problem file and print the solution.
    Solve(SolveArgs),
}

fn build_runtime() -> Result<Runtime, CliError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)
}

/// Cancel `token` on Ctrl-C; return early if it is cancelled elsewhere.
async fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::select! {
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => {
                info!("interrupt received, shutting down");
                token.cancel();
            }
            Err(err) => warn!("cannot listen for interrupts: {err}"),
        },
        () = token.cancelled() => {}
    }
}

fn positive(field: &'static str, value: u64, reason: &'static str) -> Result<u64, CliError> {
    if value == 0 {
        Err(CliError::InvalidArgument {
            field,
            value: value.to_string(),
            reason,
        })
    } else {
        Ok(value)
    }
}

fn seconds(
    field: &'static str,
    value: Option<u64>,
    default: Duration,
) -> Result<Duration, CliError> {
    value.map_or(Ok(default), |secs| {
        positive(field, secs, "must be at least one second").map(Duration::from_secs)
    })
}

fn millis(
    field: &'static str,
    value: Option<u64>,
    default: Duration,
) -> Result<Duration, CliError> {
    value.map_or(Ok(default), |ms| {
        positive(field, ms, "must be at least one millisecond").map(Duration::from_millis)
    })
}

#[cfg(test)]
mod tests;
