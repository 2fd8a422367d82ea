//! Ejection repair for stranded units.
//!
//! A stranded unit may take the place of a routed one when the evicted unit
//! can itself be reinserted somewhere else. Each success places one more
//! unit, so the repair loop always terminates.

use log::trace;

use crate::model::{Model, Role, Unit};
use crate::route::{Insertion, Route};

use super::Placement;

/// Place as many stranded units as direct insertion and ejection allow.
pub(super) fn repair(model: &Model, placement: &mut Placement) {
    let mut progressed = true;
    while progressed && !placement.stranded.is_empty() {
        progressed = false;
        for unit in std::mem::take(&mut placement.stranded) {
            if insert_anywhere(model, &mut placement.routes, unit)
                || eject_for(model, &mut placement.routes, unit)
            {
                progressed = true;
            } else {
                placement.stranded.push(unit);
            }
        }
    }
}

/// Apply the cheapest feasible insertion of `unit` over every route.
pub(super) fn insert_anywhere(model: &Model, routes: &mut [Route], unit: Unit) -> bool {
    let Some((route_idx, insertion)) = cheapest_route(model, routes, unit) else {
        return false;
    };
    routes.get_mut(route_idx).is_some_and(|route| {
        route.apply(model, unit, insertion);
        true
    })
}

fn cheapest_route(model: &Model, routes: &[Route], unit: Unit) -> Option<(usize, Insertion)> {
    let distance = |from: usize, to: usize| model.distance(from, to);
    routes
        .iter()
        .enumerate()
        .filter_map(|(idx, route)| {
            route
                .best_insertion(model, unit, &distance)
                .map(|(insertion, delta)| (idx, insertion, delta))
        })
        .min_by_key(|(_, _, delta)| *delta)
        .map(|(idx, insertion, _)| (idx, insertion))
}

/// Swap `unit` in for a routed unit that fits elsewhere.
fn eject_for(model: &Model, routes: &mut [Route], unit: Unit) -> bool {
    let distance = |from: usize, to: usize| model.distance(from, to);
    for host_idx in 0..routes.len() {
        let Some(host) = routes.get(host_idx) else {
            continue;
        };
        let residents: Vec<Unit> = host
            .visits()
            .iter()
            .filter(|node| !matches!(model.role(**node), Role::Delivery { .. }))
            .filter_map(|node| model.unit_of(*node))
            .collect();

        for resident in residents {
            let reduced = host.without(model, resident);
            if !reduced.is_feasible(model) {
                continue;
            }
            let Some((insertion, _)) = reduced.best_insertion(model, unit, &distance) else {
                continue;
            };
            let mut hosted = reduced;
            hosted.apply(model, unit, insertion);

            let mut candidate = routes.to_vec();
            if let Some(slot) = candidate.get_mut(host_idx) {
                *slot = hosted;
            }
            if insert_anywhere(model, &mut candidate, resident) {
                trace!("placed {unit:?} on vehicle {host_idx} by moving {resident:?}");
                routes.swap_with_slice(&mut candidate);
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use convoy_core::ProblemInstance;
    use rstest::{fixture, rstest};

    /// Stops on a line served by two vehicles of capacity 5; node 5 fits
    /// no vehicle.
    #[fixture]
    fn model() -> Model {
        let matrix = (0..6_u64)
            .map(|a| (0..6_u64).map(|b| a.abs_diff(b) * 10).collect())
            .collect();
        Model::new(&ProblemInstance {
            distance_matrix: matrix,
            demands: vec![0, 2, 2, 3, 3, 6],
            vehicle_capacities: vec![5, 5],
            vehicle_max_distances: vec![1_000, 1_000],
            pickups_deliveries: Vec::new(),
            num_vehicles: 2,
            depot: 0,
            starts: vec![0, 0],
            ends: vec![0, 0],
        })
        .expect("valid instance")
    }

    fn partial(model: &Model) -> Vec<Route> {
        vec![
            Route::new(model, 0, vec![1, 2]).expect("vehicle exists"),
            Route::new(model, 1, vec![3]).expect("vehicle exists"),
        ]
    }

    fn served(routes: &[Route]) -> Vec<usize> {
        let mut nodes: Vec<usize> = routes.iter().flat_map(|r| r.visits().to_vec()).collect();
        nodes.sort_unstable();
        nodes
    }

    #[rstest]
    fn ejection_frees_room_for_a_stranded_stop(model: Model) {
        let mut routes = partial(&model);
        assert!(!insert_anywhere(&model, &mut routes, Unit::Single(4)));

        assert!(eject_for(&model, &mut routes, Unit::Single(4)));
        assert_eq!(served(&routes), vec![1, 2, 3, 4]);
        assert!(routes.iter().all(|r| r.is_feasible(&model)));
    }

    #[rstest]
    fn repair_keeps_units_no_vehicle_can_carry(model: Model) {
        let mut placement = Placement {
            routes: partial(&model),
            stranded: vec![Unit::Single(5), Unit::Single(4)],
        };
        repair(&model, &mut placement);
        assert_eq!(placement.stranded, vec![Unit::Single(5)]);
        assert_eq!(served(&placement.routes), vec![1, 2, 3, 4]);
    }
}
