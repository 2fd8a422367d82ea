//! Guided local search over feasible assignments.
//!
//! Each iteration descends to a local minimum of the augmented cost
//! `distance + lambda * penalty`, then penalises the arcs of that minimum with
//! the highest utility so the next descent is pushed elsewhere. The best
//! assignment by true distance seen after any move is kept. The search stops
//! at the deadline or after a run of iterations without a new best.

mod moves;
mod penalties;

use std::time::{Duration, Instant};

use log::trace;

use crate::model::Model;
use crate::route::Route;
use penalties::Penalties;

/// Wall-clock limit; `None` when the budget overflows the clock.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline(Option<Instant>);

impl Deadline {
    pub(crate) fn after(budget: Duration) -> Self {
        Self(Instant::now().checked_add(budget))
    }

    pub(crate) fn expired(self) -> bool {
        self.0.is_some_and(|at| Instant::now() >= at)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SearchLimits {
    pub(crate) deadline: Deadline,
    pub(crate) max_stalled_iterations: usize,
    /// Lambda as a percentage of the mean arc cost of the first local minimum.
    pub(crate) penalty_percent: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct SearchOutcome {
    pub(crate) routes: Vec<Route>,
    pub(crate) cost: i64,
    pub(crate) iterations: usize,
}

/// Improve a feasible assignment until a limit is reached.
pub(crate) fn improve(model: &Model, initial: Vec<Route>, limits: &SearchLimits) -> SearchOutcome {
    let mut best_cost = total_distance(&initial);
    let mut best = initial.clone();
    let mut current = initial;
    let mut penalties = Penalties::new(model.size());
    let mut lambda = 0_i64;
    let mut stalled = 0_usize;
    let mut iterations = 0_usize;

    while !limits.deadline.expired() {
        let before = best_cost;
        let augmented = |from: usize, to: usize| {
            model
                .distance(from, to)
                .saturating_add(lambda.saturating_mul(penalties.get(from, to)))
        };
        descend(model, &mut current, &augmented, limits.deadline, &mut |routes: &[Route]| {
            let cost = total_distance(routes);
            if cost < best_cost {
                best_cost = cost;
                best = routes.to_vec();
            }
        });
        iterations = iterations.saturating_add(1);
        trace!("guided search iteration {iterations}: best distance {best_cost}");

        stalled = if best_cost < before {
            0
        } else {
            stalled.saturating_add(1)
        };
        if stalled > limits.max_stalled_iterations {
            break;
        }
        if lambda == 0 {
            lambda = initial_lambda(&current, limits.penalty_percent);
        }
        if penalties.penalise(model, &current) == 0 {
            break;
        }
    }

    SearchOutcome {
        routes: best,
        cost: best_cost,
        iterations,
    }
}

/// Apply improving moves until none remains or the deadline passes.
fn descend<C, F>(model: &Model, routes: &mut [Route], cost: &C, deadline: Deadline, on_move: &mut F)
where
    C: Fn(usize, usize) -> i64,
    F: FnMut(&[Route]),
{
    while !deadline.expired() {
        let moved = moves::relocate(model, routes, cost)
            || moves::exchange(model, routes, cost)
            || moves::two_opt(model, routes, cost)
            || moves::or_opt(model, routes, cost);
        if !moved {
            break;
        }
        on_move(routes);
    }
}

/// `penalty_percent` of the mean arc distance, at least one.
fn initial_lambda(routes: &[Route], penalty_percent: u32) -> i64 {
    let arcs: usize = routes
        .iter()
        .filter(|route| !route.is_empty())
        .map(|route| route.arcs().count())
        .sum();
    let scaled = total_distance(routes).saturating_mul(i64::from(penalty_percent));
    i64::try_from(arcs)
        .ok()
        .and_then(|count| count.checked_mul(100))
        .and_then(|divisor| scaled.checked_div(divisor))
        .unwrap_or(0)
        .max(1)
}

pub(crate) fn total_distance(routes: &[Route]) -> i64 {
    routes
        .iter()
        .fold(0_i64, |acc, route| acc.saturating_add(route.distance()))
}
