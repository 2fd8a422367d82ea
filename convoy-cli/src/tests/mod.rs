//! Shared test harness modules for the Convoy CLI.

use super::*;
use crate::backend::Backend;
use crate::serve::{DEFAULT_BIND, DistanceSource, ServeConfig};
use crate::solve::{SolveConfig, SolveEngineBuilder, load_problem, run_solve_with};
use crate::worker::WorkerConfig;

mod helpers;
mod serve_unit;
mod solve_steps;
