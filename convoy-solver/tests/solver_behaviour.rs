//! Behavioural tests for `CvrpSolver` using rstest-bdd.
//!
//! The reference scenario builds its matrix with the offline great-circle
//! provider so it exercises the same path a deployment without a distance
//! service would take.


use std::cell::RefCell;
use std::time::Duration;

use convoy_core::test_support::sample_request;
use convoy_core::{
    DistanceMatrixBuilder, EngineError, ProblemInstance, RoutingEngine, Solution, SolveStatus,
};
use convoy_data::routing::HaversineDistanceProvider;
use convoy_solver::test_support::check_solution;
use convoy_solver::{CvrpSolver, SolverConfig};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use golden_routes_support::{GoldenRoute, load_golden_route};

#[derive(Debug, Default)]
struct SolverWorld {
    instance: RefCell<Option<ProblemInstance>>,
    golden: RefCell<Option<GoldenRoute>>,
    outcome: RefCell<Option<Result<Solution, EngineError>>>,
}

impl SolverWorld {
    #[expect(
        clippy::expect_used,
        reason = "behaviour tests use expect for readable failures"
    )]
    fn expect_instance(&self) -> ProblemInstance {
        self.instance
            .borrow()
            .clone()
            .expect("instance should be prepared before solving")
    }

    #[expect(
        clippy::expect_used,
        reason = "behaviour tests use expect for readable failures"
    )]
    fn expect_outcome(&self) -> Result<Solution, EngineError> {
        self.outcome
            .borrow()
            .as_ref()
            .cloned()
            .expect("outcome should be recorded before assertions")
    }

    #[expect(
        clippy::expect_used,
        reason = "behaviour tests use expect for readable failures"
    )]
    fn expect_solution(&self) -> Solution {
        self.expect_outcome().expect("expected solve success")
    }

    fn update(&self, change: impl FnOnce(&mut ProblemInstance)) {
        if let Some(instance) = self.instance.borrow_mut().as_mut() {
            change(instance);
        }
    }
}

#[fixture]
fn world() -> SolverWorld {
    SolverWorld::default()
}

#[given("the sixteen-stop reference request with great-circle distances")]
#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
fn given_reference_request(world: &SolverWorld) {
    let request = sample_request();
    let matrix = DistanceMatrixBuilder::new(HaversineDistanceProvider::default())
        .build(&request.coordinates)
        .expect("great-circle distances always resolve");
    world.instance.replace(Some(request.into_instance(matrix)));
}

#[given("the golden route {name:word}")]
fn given_golden_route(world: &SolverWorld, name: String) {
    // Strip surrounding quotes that rstest-bdd may include from Gherkin syntax.
    let golden = load_golden_route(name.trim_matches('"'));
    world.instance.replace(Some(golden.instance.clone()));
    world.golden.replace(Some(golden));
}

#[given("every vehicle's capacity is cut to {capacity}")]
fn given_capacity_cut(world: &SolverWorld, capacity: i64) {
    world.update(|instance| instance.vehicle_capacities.fill(capacity));
}

#[given("vehicle {vehicle} starts at node {node}")]
fn given_start_outside(world: &SolverWorld, vehicle: usize, node: usize) {
    world.update(|instance| {
        if let Some(start) = instance.starts.get_mut(vehicle) {
            *start = node;
        }
    });
}

#[when("the engine solves the instance")]
fn when_engine_solves(world: &SolverWorld) {
    let solver = CvrpSolver::with_config(
        SolverConfig::default().with_max_stalled_iterations(50),
    );
    let outcome = solver.solve(&world.expect_instance(), Duration::from_secs(10));
    world.outcome.replace(Some(outcome));
}

#[then("a feasible assignment with {count} routes is returned")]
fn then_feasible(world: &SolverWorld, count: usize) {
    let solution = world.expect_solution();
    assert_eq!(solution.status, SolveStatus::Found);
    assert_eq!(solution.routes.len(), count);
    assert_eq!(check_solution(&world.expect_instance(), &solution), Ok(()));
}

#[then("node {pickup} is collected before node {delivery} on the same route")]
#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
fn then_pair_in_order(world: &SolverWorld, pickup: usize, delivery: usize) {
    let solution = world.expect_solution();
    let carrier = solution
        .routes
        .iter()
        .find(|route| route.route.contains(&pickup))
        .expect("pickup should be routed");
    let position = |node: usize| carrier.route.iter().position(|visited| *visited == node);
    assert!(
        position(delivery).is_some_and(|dropped| position(pickup) < Some(dropped)),
        "route {:?} does not carry {pickup} before {delivery}",
        carrier.route
    );
}

#[then("the total distance is the sum of the route distances")]
fn then_total_distance(world: &SolverWorld) {
    let solution = world.expect_solution();
    let total: u64 = solution.routes.iter().map(|route| route.distance).sum();
    assert_eq!(solution.total_distance, total);
    assert_eq!(solution.objective, total);
}

#[then("the objective matches the golden optimum")]
#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
fn then_golden_objective(world: &SolverWorld) {
    let solution = world.expect_solution();
    let golden = world.golden.borrow();
    let golden_ref = golden.as_ref().expect("golden route should be loaded");
    assert_eq!(
        solution.objective, golden_ref.expected.objective,
        "{}: objective differs from the optimum",
        golden_ref.name
    );
}

#[then("the instance is reported as infeasible")]
fn then_infeasible(world: &SolverWorld) {
    assert_eq!(world.expect_solution(), Solution::infeasible());
}

#[then("the solve fails while building the model")]
#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
fn then_model_error(world: &SolverWorld) {
    let err = world.expect_outcome().expect_err("expected a model error");
    assert!(matches!(err, EngineError::ModelConstruction { .. }));
}

#[scenario(path = "tests/features/solver.feature", index = 0)]
fn reference_fleet(world: SolverWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/solver.feature", index = 1)]
fn known_optimum(world: SolverWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/solver.feature", index = 2)]
fn excess_demand(world: SolverWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/solver.feature", index = 3)]
fn start_outside_matrix(world: SolverWorld) {
    let _ = world;
}
