//! First-improvement neighbourhoods.
//!
//! Each function scans its neighbourhood under the supplied arc cost, applies
//! the first move that lowers it while keeping every route feasible, and
//! reports whether anything changed.

use crate::model::{Model, Role, Unit};
use crate::route::{Insertion, Route};

/// Move a lone stop or a whole pair to its cheapest place in any route.
pub(crate) fn relocate<C>(model: &Model, routes: &mut [Route], cost: &C) -> bool
where
    C: Fn(usize, usize) -> i64,
{
    for source_idx in 0..routes.len() {
        let Some(source) = routes.get(source_idx) else {
            continue;
        };
        let units: Vec<Unit> = source
            .visits()
            .iter()
            .filter(|node| !matches!(model.role(**node), Role::Delivery { .. }))
            .filter_map(|node| model.unit_of(*node))
            .collect();

        for unit in units {
            let Some(source) = routes.get(source_idx) else {
                break;
            };
            let reduced = source.without(model, unit);
            if !reduced.is_feasible(model) {
                continue;
            }
            let gain = source.cost_with(cost).saturating_sub(reduced.cost_with(cost));
            if let Some((target_idx, insertion)) =
                cheapest_target(model, routes, &reduced, source_idx, unit, cost, gain)
            {
                if target_idx == source_idx {
                    let mut moved = reduced;
                    moved.apply(model, unit, insertion);
                    replace(routes, source_idx, moved);
                } else {
                    if let Some(target) = routes.get_mut(target_idx) {
                        target.apply(model, unit, insertion);
                    }
                    replace(routes, source_idx, reduced);
                }
                return true;
            }
        }
    }
    false
}

/// Route offering the cheapest insertion of `unit`, if it costs less than
/// `gain`. Ties go to the lower route index.
fn cheapest_target<C>(
    model: &Model,
    routes: &[Route],
    reduced: &Route,
    source_idx: usize,
    unit: Unit,
    cost: &C,
    gain: i64,
) -> Option<(usize, Insertion)>
where
    C: Fn(usize, usize) -> i64,
{
    routes
        .iter()
        .enumerate()
        .filter_map(|(idx, route)| {
            let target = if idx == source_idx { reduced } else { route };
            target
                .best_insertion(model, unit, cost)
                .filter(|(_, delta)| *delta < gain)
                .map(|(insertion, delta)| (idx, insertion, delta))
        })
        .min_by_key(|(_, _, delta)| *delta)
        .map(|(idx, insertion, _)| (idx, insertion))
}

/// Swap two lone stops between different routes.
pub(crate) fn exchange<C>(model: &Model, routes: &mut [Route], cost: &C) -> bool
where
    C: Fn(usize, usize) -> i64,
{
    for first_idx in 0..routes.len() {
        for second_idx in first_idx.saturating_add(1)..routes.len() {
            let (Some(first), Some(second)) = (routes.get(first_idx), routes.get(second_idx)) else {
                continue;
            };
            if let Some((left, right)) = first_exchange(model, first, second, cost) {
                replace(routes, first_idx, left);
                replace(routes, second_idx, right);
                return true;
            }
        }
    }
    false
}

fn first_exchange<C>(
    model: &Model,
    first: &Route,
    second: &Route,
    cost: &C,
) -> Option<(Route, Route)>
where
    C: Fn(usize, usize) -> i64,
{
    let singles = |route: &Route| -> Vec<(usize, usize)> {
        route
            .visits()
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, node)| model.role(*node) == Role::Single)
            .collect()
    };
    let swap_delta = |route: &Route, idx: usize, out: usize, into: usize| {
        let before = route.node_at(idx);
        let after = route.node_at(idx.saturating_add(2));
        cost(before, into)
            .saturating_add(cost(into, after))
            .saturating_sub(cost(before, out))
            .saturating_sub(cost(out, after))
    };

    let right_singles = singles(second);
    for (left_idx, left_node) in singles(first) {
        for (right_idx, right_node) in &right_singles {
            let delta = swap_delta(first, left_idx, left_node, *right_node)
                .saturating_add(swap_delta(second, *right_idx, *right_node, left_node));
            if delta >= 0 {
                continue;
            }
            let left = first.with_visits(model, swapped(first.visits(), left_idx, *right_node));
            let right = second.with_visits(model, swapped(second.visits(), *right_idx, left_node));
            if left.is_feasible(model) && right.is_feasible(model) {
                return Some((left, right));
            }
        }
    }
    None
}

fn swapped(visits: &[usize], idx: usize, node: usize) -> Vec<usize> {
    let mut result = visits.to_vec();
    if let Some(slot) = result.get_mut(idx) {
        *slot = node;
    }
    result
}

/// Reverse a run of consecutive visits within one route.
pub(crate) fn two_opt<C>(model: &Model, routes: &mut [Route], cost: &C) -> bool
where
    C: Fn(usize, usize) -> i64,
{
    for route in routes.iter_mut() {
        let visit_count = route.visits().len();
        if visit_count < 2 {
            continue;
        }
        let sequence: Vec<usize> = route.sequence().collect();
        let node = |idx: usize| sequence.get(idx).copied().unwrap_or_default();
        let forward = prefix_costs(&sequence, |from, to| cost(from, to));
        let backward = prefix_costs(&sequence, |from, to| cost(to, from));
        let prefix = |sums: &[i64], idx: usize| sums.get(idx).copied().unwrap_or_default();

        for first in 1..visit_count {
            for last in first.saturating_add(1)..=visit_count {
                let before = node(first.saturating_sub(1));
                let after = node(last.saturating_add(1));
                let boundary = cost(before, node(last))
                    .saturating_add(cost(node(first), after))
                    .saturating_sub(cost(before, node(first)))
                    .saturating_sub(cost(node(last), after));
                let interior = prefix(&backward, last)
                    .saturating_sub(prefix(&backward, first))
                    .saturating_sub(prefix(&forward, last).saturating_sub(prefix(&forward, first)));
                if boundary.saturating_add(interior) >= 0 {
                    continue;
                }
                let mut visits = route.visits().to_vec();
                if let Some(segment) = visits.get_mut(first.saturating_sub(1)..last) {
                    segment.reverse();
                }
                let candidate = route.with_visits(model, visits);
                if candidate.is_feasible(model) {
                    *route = candidate;
                    return true;
                }
            }
        }
    }
    false
}

/// Move a run of two or three visits elsewhere in the same route.
pub(crate) fn or_opt<C>(model: &Model, routes: &mut [Route], cost: &C) -> bool
where
    C: Fn(usize, usize) -> i64,
{
    for route in routes.iter_mut() {
        let visits = route.visits().to_vec();
        let visit_count = visits.len();
        let start = route.node_at(0);
        let end = route.node_at(visit_count.saturating_add(1));

        for length in 2..=3_usize {
            if visit_count <= length {
                break;
            }
            for offset in 0..=visit_count.saturating_sub(length) {
                let stop = offset.saturating_add(length);
                let Some(segment) = visits.get(offset..stop) else {
                    continue;
                };
                let (Some(&first), Some(&last)) = (segment.first(), segment.last()) else {
                    continue;
                };
                let prev = route.node_at(offset);
                let next = route.node_at(stop.saturating_add(1));
                let gain = cost(prev, first)
                    .saturating_add(cost(last, next))
                    .saturating_sub(cost(prev, next));

                let remaining: Vec<usize> = visits
                    .iter()
                    .enumerate()
                    .filter(|(idx, _)| *idx < offset || *idx >= stop)
                    .map(|(_, node)| *node)
                    .collect();
                for slot in 0..=remaining.len() {
                    if slot == offset {
                        continue;
                    }
                    let before = slot
                        .checked_sub(1)
                        .and_then(|idx| remaining.get(idx))
                        .copied()
                        .unwrap_or(start);
                    let after = remaining.get(slot).copied().unwrap_or(end);
                    let added = cost(before, first)
                        .saturating_add(cost(last, after))
                        .saturating_sub(cost(before, after));
                    if added >= gain {
                        continue;
                    }
                    let moved = remaining
                        .iter()
                        .take(slot)
                        .chain(segment)
                        .chain(remaining.iter().skip(slot))
                        .copied()
                        .collect();
                    let candidate = route.with_visits(model, moved);
                    if candidate.is_feasible(model) {
                        *route = candidate;
                        return true;
                    }
                }
            }
        }
    }
    false
}

fn prefix_costs<F>(sequence: &[usize], arc: F) -> Vec<i64>
where
    F: Fn(usize, usize) -> i64,
{
    let mut sums = Vec::with_capacity(sequence.len());
    let mut total = 0_i64;
    sums.push(total);
    for pair in sequence.windows(2) {
        if let [from, to] = pair {
            total = total.saturating_add(arc(*from, *to));
        }
        sums.push(total);
    }
    sums
}

fn replace(routes: &mut [Route], idx: usize, route: Route) {
    if let Some(slot) = routes.get_mut(idx) {
        *slot = route;
    }
}
