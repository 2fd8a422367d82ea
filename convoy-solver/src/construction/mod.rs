//! Initial assignment by parallel cheapest insertion.
//!
//! Every unrouted unit is priced against every route; the globally cheapest
//! feasible insertion is applied and only the modified route is re-priced.
//! Units the greedy order strands are repaired by ejecting a routed unit to
//! make room. When that still leaves units out, sequential insertion is
//! retried by decreasing demand and then in a few seeded orders. Small
//! instances that defeat every order are settled by a bounded exhaustive
//! walk, so `None` means no assignment exists or the walk ran out of budget.

mod exhaustive;
mod repair;

use std::cmp::Reverse;

use log::debug;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::model::{Model, Unit};
use crate::route::{Insertion, Route};

use repair::{insert_anywhere, repair};

type Priced = Option<(Insertion, i64)>;

/// Shuffled insertion orders tried after the demand-ordered pass.
const SEEDED_ORDERS: u64 = 8;

/// Largest stop count handed to the exhaustive walk.
const EXHAUSTIVE_MAX_VISITS: usize = 10;

/// Routes built so far and the units no route could take.
#[derive(Debug, Clone)]
struct Placement {
    routes: Vec<Route>,
    stranded: Vec<Unit>,
}

impl Placement {
    fn settled(mut self, model: &Model) -> Option<Vec<Route>> {
        repair(model, &mut self);
        self.stranded.is_empty().then_some(self.routes)
    }
}

/// Build a feasible assignment, or `None` when no strategy routes every unit.
pub(crate) fn construct(model: &Model) -> Option<Vec<Route>> {
    let empty = empty_routes(model)?;
    if let Some(routes) = cheapest_insertion(model, empty.clone()).settled(model) {
        return Some(routes);
    }

    debug!("cheapest insertion stranded units; retrying by decreasing demand");
    let mut order: Vec<Unit> = model.units().to_vec();
    order.sort_by_key(|unit| Reverse(unit_weight(model, *unit)));
    if let Some(routes) = sequential(model, empty.clone(), &order).settled(model) {
        return Some(routes);
    }

    for seed in 0..SEEDED_ORDERS {
        order.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
        if let Some(routes) = sequential(model, empty.clone(), &order).settled(model) {
            debug!("insertion order {seed} routed every unit");
            return Some(routes);
        }
    }

    if model.visit_count() > EXHAUSTIVE_MAX_VISITS {
        return None;
    }
    debug!("insertion orders exhausted; enumerating assignments");
    exhaustive::best_assignment(model)
}

fn empty_routes(model: &Model) -> Option<Vec<Route>> {
    let routes = (0..model.vehicles().len())
        .map(|vehicle| Route::new(model, vehicle, Vec::new()))
        .collect::<Option<Vec<_>>>()?;
    if let Some(route) = routes.iter().find(|route| !route.is_feasible(model)) {
        debug!("vehicle {} cannot even travel from start to end", route.vehicle());
        return None;
    }
    Some(routes)
}

fn cheapest_insertion(model: &Model, mut routes: Vec<Route>) -> Placement {
    let distance = |from: usize, to: usize| model.distance(from, to);
    let units = model.units();
    let mut priced: Vec<Vec<Priced>> = units
        .iter()
        .map(|unit| {
            routes
                .iter()
                .map(|route| route.best_insertion(model, *unit, &distance))
                .collect()
        })
        .collect();
    let mut pending: Vec<usize> = (0..units.len()).collect();

    while let Some((position, route_idx, insertion)) = cheapest(&pending, &priced) {
        let unit_idx = pending.remove(position);
        let (Some(unit), Some(route)) = (units.get(unit_idx), routes.get_mut(route_idx)) else {
            continue;
        };
        route.apply(model, *unit, insertion);
        for other in &pending {
            let price = units
                .get(*other)
                .and_then(|candidate| route.best_insertion(model, *candidate, &distance));
            if let Some(slot) = priced.get_mut(*other).and_then(|row| row.get_mut(route_idx)) {
                *slot = price;
            }
        }
    }

    let stranded = pending
        .iter()
        .filter_map(|unit_idx| units.get(*unit_idx).copied())
        .collect();
    Placement { routes, stranded }
}

/// Pending position, route and insertion of the cheapest priced unit.
fn cheapest(pending: &[usize], priced: &[Vec<Priced>]) -> Option<(usize, usize, Insertion)> {
    let mut best: Option<(usize, usize, Insertion, i64)> = None;
    for (position, unit_idx) in pending.iter().enumerate() {
        let Some(row) = priced.get(*unit_idx) else {
            continue;
        };
        for (route_idx, price) in row.iter().enumerate() {
            if let Some((insertion, delta)) = price {
                if best.is_none_or(|(_, _, _, current)| *delta < current) {
                    best = Some((position, route_idx, *insertion, *delta));
                }
            }
        }
    }
    best.map(|(position, route_idx, insertion, _)| (position, route_idx, insertion))
}

/// Insert `order` one unit at a time, each at its cheapest place.
fn sequential(model: &Model, mut routes: Vec<Route>, order: &[Unit]) -> Placement {
    let mut stranded = Vec::new();
    for unit in order {
        if !insert_anywhere(model, &mut routes, *unit) {
            stranded.push(*unit);
        }
    }
    Placement { routes, stranded }
}

/// Largest absolute load the unit places on a vehicle.
fn unit_weight(model: &Model, unit: Unit) -> i64 {
    match unit {
        Unit::Single(node) => model.demand(node).saturating_abs(),
        Unit::Pair { pickup, .. } => model.demand(pickup).saturating_abs(),
    }
}
