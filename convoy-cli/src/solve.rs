//! Solve command implementation for the Convoy CLI.

use std::io::{BufReader, Write};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use convoy_core::{DEFAULT_TIME_BUDGET, ProblemInstance, RoutingEngine, Solution};
use convoy_solver::CvrpSolver;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::fs::{file_is_file, open_utf8_file};
use crate::{ARG_SOLVE_PROBLEM, ARG_TIME_BUDGET_SECS, CliError, ENV_SOLVE_PROBLEM, seconds};

/// CLI arguments for the `solve` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Solve a problem instance without the queue. The file holds \
                 a JSON-encoded ProblemInstance with its distance matrix; \
                 the solution is printed to stdout as JSON.",
    about = "Solve a problem file"
)]
#[ortho_config(prefix = "CONVOY")]
pub(crate) struct SolveArgs {
    /// Path to a JSON file containing a ProblemInstance.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) problem_path: Option<Utf8PathBuf>,
    /// Search budget.
    #[arg(long = ARG_TIME_BUDGET_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) time_budget_secs: Option<u64>,
}

impl SolveArgs {
    pub(crate) fn into_config(self) -> Result<SolveConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SolveConfig::try_from(merged)
    }
}

/// Resolved `solve` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SolveConfig {
    /// Path to the JSON problem file.
    pub(crate) problem_path: Utf8PathBuf,
    /// Search budget handed to the engine.
    pub(crate) time_budget: Duration,
}

impl SolveConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        let path = &self.problem_path;
        match file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::SourcePathNotFile {
                field: ARG_SOLVE_PROBLEM,
                path: path.clone(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field: ARG_SOLVE_PROBLEM,
                    path: path.clone(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field: ARG_SOLVE_PROBLEM,
                path: path.clone(),
                source,
            }),
        }
    }
}

impl TryFrom<SolveArgs> for SolveConfig {
    type Error = CliError;

    fn try_from(args: SolveArgs) -> Result<Self, Self::Error> {
        let problem_path = args.problem_path.ok_or(CliError::MissingArgument {
            field: ARG_SOLVE_PROBLEM,
            env: ENV_SOLVE_PROBLEM,
        })?;
        let time_budget = seconds(
            ARG_TIME_BUDGET_SECS,
            args.time_budget_secs,
            DEFAULT_TIME_BUDGET,
        )?;
        Ok(Self {
            problem_path,
            time_budget,
        })
    }
}

/// Builds the engine for a solve invocation.
pub(crate) trait SolveEngineBuilder {
    fn build(&self, config: &SolveConfig) -> Box<dyn RoutingEngine>;
}

pub(crate) struct DefaultSolveEngineBuilder;

impl SolveEngineBuilder for DefaultSolveEngineBuilder {
    fn build(&self, _config: &SolveConfig) -> Box<dyn RoutingEngine> {
        Box::new(CvrpSolver::new())
    }
}

pub(crate) fn run_solve(args: SolveArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_solve_with(args, &DefaultSolveEngineBuilder, &mut stdout)
}

pub(crate) fn run_solve_with(
    args: SolveArgs,
    builder: &dyn SolveEngineBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let solution = execute_solve(args, builder)?;
    write_solution(writer, &solution)
}

fn execute_solve(args: SolveArgs, builder: &dyn SolveEngineBuilder) -> Result<Solution, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let problem = load_problem(&config.problem_path)?;
    problem
        .validate()
        .map_err(|source| CliError::InvalidProblem {
            path: config.problem_path.clone(),
            source,
        })?;
    let engine = builder.build(&config);
    let solution = engine
        .solve(&problem, config.time_budget)
        .map_err(|source| CliError::Solve { source })?;
    info!(
        "solved {} with status {:?} and objective {}",
        config.problem_path, solution.status, solution.objective
    );
    Ok(solution)
}

/// Loads a JSON-encoded [`ProblemInstance`] from disk.
pub(crate) fn load_problem(path: &Utf8Path) -> Result<ProblemInstance, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenProblem {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ParseProblem {
        path: path.to_path_buf(),
        source,
    })
}

fn write_solution(writer: &mut dyn Write, solution: &Solution) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(solution).map_err(CliError::SerialiseSolution)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteSolution)?;
    writer.write_all(b"\n").map_err(CliError::WriteSolution)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SolveConfig, CliError> {
    let merged = SolveArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SolveConfig::try_from(merged)
}
