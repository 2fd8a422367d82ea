//! Behaviour-driven step definitions driving the solve CLI scenarios.

use super::helpers::{triangle_problem, write_problem, write_utf8};
use super::*;
use camino::Utf8PathBuf;
use convoy_core::test_support::StaticEngine;
use convoy_core::{RoutingEngine, Solution, SolveStatus};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use tempfile::TempDir;

#[derive(Debug)]
struct SolveWorld {
    _tmp: TempDir,
    problem_path: Utf8PathBuf,
    include_problem: RefCell<bool>,
    cli_args: RefCell<Vec<String>>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl SolveWorld {
    fn new() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
        Self {
            problem_path: root.join("problem.json"),
            _tmp: tmp,
            include_problem: RefCell::new(true),
            cli_args: RefCell::new(Vec::new()),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn build_command_line(&self) -> Vec<String> {
        let mut argv = vec!["convoy".to_owned(), "solve".to_owned()];
        if *self.include_problem.borrow() {
            argv.push(self.problem_path.as_str().to_owned());
        }
        argv.extend(self.cli_args.borrow().iter().cloned());
        argv
    }

    fn error(&self) -> std::cell::Ref<'_, CliError> {
        std::cell::Ref::map(self.result.borrow(), |result| {
            result
                .as_ref()
                .expect("result recorded")
                .as_ref()
                .expect_err("expected error")
        })
    }
}

#[fixture]
fn world() -> SolveWorld {
    SolveWorld::new()
}

struct StubSolveEngineBuilder;

impl SolveEngineBuilder for StubSolveEngineBuilder {
    fn build(&self, _config: &SolveConfig) -> Box<dyn RoutingEngine> {
        Box::new(StaticEngine::new(Solution::infeasible()))
    }
}

#[given("a valid problem exists on disk")]
fn valid_problem_exists(#[from(world)] world: &SolveWorld) {
    write_problem(&world.problem_path, &triangle_problem());
}

#[given("the problem file contains invalid JSON")]
fn problem_contains_invalid_json(#[from(world)] world: &SolveWorld) {
    write_utf8(&world.problem_path, b"{ not valid json");
}

#[given("the problem names depot {depot}")]
fn problem_names_depot(#[from(world)] world: &SolveWorld, depot: usize) {
    let mut problem = triangle_problem();
    problem.depot = depot;
    write_problem(&world.problem_path, &problem);
}

#[given("I omit the problem path")]
fn omit_problem_path(#[from(world)] world: &SolveWorld) {
    *world.include_problem.borrow_mut() = false;
}

#[given("the time budget is {secs} seconds")]
fn time_budget_is(#[from(world)] world: &SolveWorld, secs: u64) {
    world
        .cli_args
        .borrow_mut()
        .extend([format!("--{ARG_TIME_BUDGET_SECS}"), secs.to_string()]);
}

#[when("I run the solve command")]
fn run_solve_command(#[from(world)] world: &SolveWorld) {
    let invocation = world.build_command_line();
    let parsed = Cli::try_parse_from(invocation).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Solve(args) => {
            let mut buffer = world.stdout.borrow_mut();
            run_solve_with(args, &StubSolveEngineBuilder, &mut *buffer)
        }
        other => panic!("expected solve command, found {other:?}"),
    });

    world.result.replace(Some(outcome));
}

#[then("the command succeeds and prints an infeasible solution")]
fn command_succeeds_and_prints_json(#[from(world)] world: &SolveWorld) {
    let borrowed = world.result.borrow();
    let result = borrowed.as_ref().expect("result recorded");
    result.as_ref().expect("expected success");

    let stdout = String::from_utf8(world.stdout.borrow().clone()).expect("stdout utf-8");
    let solution: Solution = serde_json::from_str(&stdout).expect("output should be a solution");
    assert_eq!(solution.status, SolveStatus::Infeasible);
    assert!(solution.routes.is_empty());
}

#[then("the command fails because the problem JSON is invalid")]
fn command_fails_invalid_json(#[from(world)] world: &SolveWorld) {
    match &*world.error() {
        CliError::ParseProblem { .. } => {}
        other => panic!("expected ParseProblem, found {other:?}"),
    }
}

#[then("the command rejects problem field {field}")]
fn command_fails_invalid_problem(#[from(world)] world: &SolveWorld, field: String) {
    let expected = field.trim_matches('"');
    match &*world.error() {
        CliError::InvalidProblem { source, .. } => assert!(source.fields().contains(&expected)),
        other => panic!("expected InvalidProblem, found {other:?}"),
    }
}

#[then("the command fails because the problem path is missing")]
fn command_fails_missing_problem_path(#[from(world)] world: &SolveWorld) {
    match &*world.error() {
        CliError::MissingArgument { field, .. } => assert_eq!(*field, ARG_SOLVE_PROBLEM),
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[then("the command rejects option {option}")]
fn command_fails_invalid_option(#[from(world)] world: &SolveWorld, option: String) {
    let expected = option.trim_matches('"');
    match &*world.error() {
        CliError::InvalidArgument { field, .. } => assert_eq!(*field, expected),
        other => panic!("expected InvalidArgument, found {other:?}"),
    }
}

macro_rules! register_solve_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/solve_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: SolveWorld) {
            let _ = world;
        }
    };
}

register_solve_scenario!(solve_happy_path, "solving a problem from JSON");
register_solve_scenario!(solve_invalid_json, "rejecting invalid JSON input");
register_solve_scenario!(solve_invalid_problem, "rejecting inconsistent problems");
register_solve_scenario!(solve_missing_problem, "rejecting missing problem paths");
register_solve_scenario!(solve_empty_budget, "rejecting an empty search budget");
