#![expect(
    clippy::expect_used,
    reason = "regression tests use expect for readable failures"
)]

//! Golden route regression tests for the CVRP engine.
//!
//! Each test loads a small instance whose optimum was established by
//! enumerating every assignment, solves it, and checks the engine reaches
//! that optimum with a solution that honours every constraint.


use std::time::Duration;

use convoy_core::RoutingEngine;
use convoy_solver::CvrpSolver;
use convoy_solver::test_support::check_solution;
use rstest::rstest;

use golden_routes_support::load_golden_route;

#[rstest]
#[case("square_tour_single_vehicle")]
#[case("capacity_forces_two_routes")]
#[case("pickup_precedes_delivery")]
#[case("pairs_with_tight_capacity")]
#[case("multi_depot_open_routes")]
#[case("distance_cap_splits_sides")]
#[case("pair_exceeds_capacity")]
#[case("greedy_order_strands_a_stop")]
fn golden_route_regression(#[case] name: &str) {
    let golden = load_golden_route(name);

    let solution = CvrpSolver::new()
        .solve(&golden.instance, Duration::from_secs(10))
        .expect("golden instance should solve");

    assert_eq!(
        solution.status, golden.expected.status,
        "{}: unexpected status",
        golden.name
    );
    assert_eq!(
        solution.objective, golden.expected.objective,
        "{}: objective {} differs from the optimum {}",
        golden.name, solution.objective, golden.expected.objective
    );
    if let Err(violation) = check_solution(&golden.instance, &solution) {
        panic!("{}: {violation}", golden.name);
    }
}
