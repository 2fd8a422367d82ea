//! A vehicle's visit sequence with cached loads and distance.
//!
//! Loads are recorded after each node from the start terminal through the
//! last visit, together with suffix extrema, so insertion feasibility is
//! checked without walking the route. The end terminal only receives the
//! arriving load; its demand is never applied.

use std::collections::HashSet;

use crate::model::{Model, Role, Unit};

/// Where to place a unit in a route.
///
/// Slots count gaps in the full sequence: slot `i` lies between the `i`-th
/// node (0 is the start terminal) and its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Insertion {
    Single { slot: usize },
    Pair { pickup_slot: usize, delivery_slot: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Route {
    vehicle: usize,
    start: usize,
    end: usize,
    capacity: i64,
    max_distance: i64,
    visits: Vec<usize>,
    distance: i64,
    loads: Vec<i64>,
    suffix_max: Vec<i64>,
    suffix_min: Vec<i64>,
}

impl Route {
    /// A route for `vehicle` serving `visits` in order.
    ///
    /// Returns `None` when the vehicle does not exist.
    pub(crate) fn new(model: &Model, vehicle: usize, visits: Vec<usize>) -> Option<Self> {
        let fleet = model.vehicle(vehicle)?;
        let mut route = Self {
            vehicle,
            start: fleet.start,
            end: fleet.end,
            capacity: fleet.capacity,
            max_distance: fleet.max_distance,
            visits,
            distance: 0,
            loads: Vec::new(),
            suffix_max: Vec::new(),
            suffix_min: Vec::new(),
        };
        route.refresh(model);
        Some(route)
    }

    pub(crate) const fn vehicle(&self) -> usize {
        self.vehicle
    }

    pub(crate) fn visits(&self) -> &[usize] {
        &self.visits
    }

    pub(crate) const fn distance(&self) -> i64 {
        self.distance
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    /// Load after the node at sequence position `idx`, end terminal excluded.
    pub(crate) fn load_after(&self, idx: usize) -> Option<i64> {
        self.loads.get(idx).copied()
    }

    /// Node at sequence position `idx`: start, visits, then end.
    pub(crate) fn node_at(&self, idx: usize) -> usize {
        if idx == 0 {
            return self.start;
        }
        self.visits
            .get(idx.saturating_sub(1))
            .copied()
            .unwrap_or(self.end)
    }

    /// Every node from start to end terminal.
    pub(crate) fn sequence(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::once(self.start)
            .chain(self.visits.iter().copied())
            .chain(std::iter::once(self.end))
    }

    /// Arcs travelled, in order.
    pub(crate) fn arcs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.sequence().zip(self.sequence().skip(1))
    }

    /// Sum of `cost` over the route's arcs.
    pub(crate) fn cost_with<C>(&self, cost: &C) -> i64
    where
        C: Fn(usize, usize) -> i64,
    {
        self.arcs()
            .fold(0_i64, |acc, (from, to)| acc.saturating_add(cost(from, to)))
    }

    /// Check capacity, distance and pairing constraints.
    pub(crate) fn is_feasible(&self, model: &Model) -> bool {
        let loads_ok = self
            .loads
            .iter()
            .all(|load| (0..=self.capacity).contains(load));
        loads_ok && self.distance <= self.max_distance && pairs_are_ordered(model, &self.visits)
    }

    /// Replace the visits and recompute every cache.
    pub(crate) fn set_visits(&mut self, model: &Model, visits: Vec<usize>) {
        self.visits = visits;
        self.refresh(model);
    }

    /// Copy of this route with `visits` in place of its own.
    pub(crate) fn with_visits(&self, model: &Model, visits: Vec<usize>) -> Self {
        let mut route = self.clone();
        route.set_visits(model, visits);
        route
    }

    /// Copy of this route without the nodes of `unit`.
    pub(crate) fn without(&self, model: &Model, unit: Unit) -> Self {
        let remaining = self
            .visits
            .iter()
            .copied()
            .filter(|node| !unit.contains(*node))
            .collect();
        self.with_visits(model, remaining)
    }

    /// Place `unit` as described by `insertion`.
    pub(crate) fn apply(&mut self, model: &Model, unit: Unit, insertion: Insertion) {
        let mut visits = std::mem::take(&mut self.visits);
        match (unit, insertion) {
            (Unit::Single(node), Insertion::Single { slot }) => {
                visits.insert(slot.min(visits.len()), node);
            }
            (
                Unit::Pair { pickup, delivery },
                Insertion::Pair {
                    pickup_slot,
                    delivery_slot,
                },
            ) => {
                visits.insert(delivery_slot.min(visits.len()), delivery);
                visits.insert(pickup_slot.min(delivery_slot).min(visits.len()), pickup);
            }
            _ => log::warn!("insertion {insertion:?} does not fit unit {unit:?}"),
        }
        self.set_visits(model, visits);
    }

    /// Cheapest feasible place for `unit`, ranked by `cost`.
    ///
    /// Returns the insertion and its cost delta. Feasibility always uses the
    /// true distances, whatever `cost` adds on top.
    pub(crate) fn best_insertion<C>(
        &self,
        model: &Model,
        unit: Unit,
        cost: &C,
    ) -> Option<(Insertion, i64)>
    where
        C: Fn(usize, usize) -> i64,
    {
        match unit {
            Unit::Single(node) => self.best_single(model, node, cost),
            Unit::Pair { pickup, delivery } => self.best_pair(model, pickup, delivery, cost),
        }
    }

    fn best_single<C>(&self, model: &Model, node: usize, cost: &C) -> Option<(Insertion, i64)>
    where
        C: Fn(usize, usize) -> i64,
    {
        let demand = model.demand(node);
        let mut best: Option<(Insertion, i64)> = None;
        for slot in 0..=self.visits.len() {
            if !self.shift_fits(slot, demand) {
                continue;
            }
            let (from, to) = (self.node_at(slot), self.node_at(slot.saturating_add(1)));
            let detour = gap_delta(&|a, b| model.distance(a, b), from, node, to);
            if self.distance.saturating_add(detour) > self.max_distance {
                continue;
            }
            let delta = gap_delta(cost, from, node, to);
            if best.is_none_or(|(_, current)| delta < current) {
                best = Some((Insertion::Single { slot }, delta));
            }
        }
        best
    }

    fn best_pair<C>(
        &self,
        model: &Model,
        pickup: usize,
        delivery: usize,
        cost: &C,
    ) -> Option<(Insertion, i64)>
    where
        C: Fn(usize, usize) -> i64,
    {
        let picked = model.demand(pickup);
        let both = picked.saturating_add(model.demand(delivery));
        let last = self.visits.len();
        let mut best: Option<(Insertion, i64)> = None;

        for pickup_slot in 0..=last {
            let mut run_max = i64::MIN;
            let mut run_min = i64::MAX;
            for delivery_slot in pickup_slot..=last {
                let load = self.loads.get(delivery_slot).copied().unwrap_or(0);
                run_max = run_max.max(load);
                run_min = run_min.min(load);
                if run_max.saturating_add(picked) > self.capacity
                    || run_min.saturating_add(picked) < 0
                {
                    break;
                }
                if !self.shift_fits(delivery_slot, both) {
                    continue;
                }
                let detour = self.pair_delta(
                    &|a, b| model.distance(a, b),
                    pickup,
                    delivery,
                    pickup_slot,
                    delivery_slot,
                );
                if self.distance.saturating_add(detour) > self.max_distance {
                    continue;
                }
                let delta = self.pair_delta(cost, pickup, delivery, pickup_slot, delivery_slot);
                if best.is_none_or(|(_, current)| delta < current) {
                    best = Some((
                        Insertion::Pair {
                            pickup_slot,
                            delivery_slot,
                        },
                        delta,
                    ));
                }
            }
        }
        best
    }

    fn pair_delta<C>(
        &self,
        cost: &C,
        pickup: usize,
        delivery: usize,
        pickup_slot: usize,
        delivery_slot: usize,
    ) -> i64
    where
        C: Fn(usize, usize) -> i64,
    {
        let from = self.node_at(pickup_slot);
        let to = self.node_at(pickup_slot.saturating_add(1));
        if pickup_slot == delivery_slot {
            return cost(from, pickup)
                .saturating_add(cost(pickup, delivery))
                .saturating_add(cost(delivery, to))
                .saturating_sub(cost(from, to));
        }
        let later_from = self.node_at(delivery_slot);
        let later_to = self.node_at(delivery_slot.saturating_add(1));
        gap_delta(cost, from, pickup, to)
            .saturating_add(gap_delta(cost, later_from, delivery, later_to))
    }

    /// Whether adding `demand` to every load from position `slot` onwards
    /// keeps all of them within bounds.
    fn shift_fits(&self, slot: usize, demand: i64) -> bool {
        match (self.suffix_max.get(slot), self.suffix_min.get(slot)) {
            (Some(high), Some(low)) => {
                high.saturating_add(demand) <= self.capacity && low.saturating_add(demand) >= 0
            }
            _ => false,
        }
    }

    fn refresh(&mut self, model: &Model) {
        self.distance = self.cost_with(&|from, to| model.distance(from, to));

        self.loads.clear();
        let mut load = model.demand(self.start);
        self.loads.push(load);
        for node in &self.visits {
            load = load.saturating_add(model.demand(*node));
            self.loads.push(load);
        }

        self.suffix_max = self.loads.clone();
        self.suffix_min = self.loads.clone();
        for idx in (0..self.loads.len().saturating_sub(1)).rev() {
            let next = idx.saturating_add(1);
            if let (Some(&later_max), Some(&later_min)) =
                (self.suffix_max.get(next), self.suffix_min.get(next))
            {
                if let Some(slot) = self.suffix_max.get_mut(idx) {
                    *slot = (*slot).max(later_max);
                }
                if let Some(slot) = self.suffix_min.get_mut(idx) {
                    *slot = (*slot).min(later_min);
                }
            }
        }
    }
}

/// Cost of visiting `node` between `from` and `to` instead of going direct.
fn gap_delta<C>(cost: &C, from: usize, node: usize, to: usize) -> i64
where
    C: Fn(usize, usize) -> i64,
{
    cost(from, node)
        .saturating_add(cost(node, to))
        .saturating_sub(cost(from, to))
}

/// Every delivery follows its pickup and every pickup has its delivery.
fn pairs_are_ordered(model: &Model, visits: &[usize]) -> bool {
    let mut seen = HashSet::with_capacity(visits.len());
    let mut open = 0_usize;
    for node in visits {
        match model.role(*node) {
            Role::Pickup { .. } => open = open.saturating_add(1),
            Role::Delivery { pickup } => {
                if !seen.contains(&pickup) {
                    return false;
                }
                open = open.saturating_sub(1);
            }
            Role::Terminal => return false,
            Role::Single => {}
        }
        seen.insert(*node);
    }
    open == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use convoy_core::{PickupDelivery, ProblemInstance};
    use rstest::{fixture, rstest};

    /// Nodes on a line at positions 0..5, depot at 0.
    #[fixture]
    fn model() -> Model {
        let positions: [i64; 6] = [0, 1, 2, 3, 4, 5];
        let matrix = positions
            .iter()
            .map(|a| positions.iter().map(|b| (a - b).unsigned_abs()).collect())
            .collect();
        let instance = ProblemInstance {
            distance_matrix: matrix,
            demands: vec![0, 2, 3, -3, 1, 1],
            vehicle_capacities: vec![4],
            vehicle_max_distances: vec![14],
            pickups_deliveries: vec![PickupDelivery::new(2, 3)],
            num_vehicles: 1,
            depot: 0,
            starts: vec![0],
            ends: vec![0],
        };
        Model::new(&instance).expect("valid instance")
    }

    fn route(model: &Model, visits: Vec<usize>) -> Route {
        Route::new(model, 0, visits).expect("vehicle exists")
    }

    fn distance(model: &Model) -> impl Fn(usize, usize) -> i64 + '_ {
        |from, to| model.distance(from, to)
    }

    #[rstest]
    fn caches_loads_and_distance(model: Model) {
        let route = route(&model, vec![1, 4]);
        assert_eq!(route.distance(), 8);
        assert_eq!(route.load_after(0), Some(0));
        assert_eq!(route.load_after(2), Some(3));
        assert_eq!(route.sequence().collect::<Vec<_>>(), vec![0, 1, 4, 0]);
        assert!(route.is_feasible(&model));
    }

    #[rstest]
    fn empty_route_is_a_direct_arc(model: Model) {
        let route = route(&model, Vec::new());
        assert_eq!(route.distance(), 0);
        assert!(route.is_empty());
        assert!(route.is_feasible(&model));
    }

    #[rstest]
    #[case::overloaded(vec![1, 2, 3], false)]
    #[case::delivery_first(vec![3, 2], false)]
    #[case::unpaired_pickup(vec![2], false)]
    #[case::ordered_pair(vec![2, 3, 1], true)]
    #[case::too_far(vec![5, 1, 4], false)]
    fn feasibility(model: Model, #[case] visits: Vec<usize>, #[case] feasible: bool) {
        assert_eq!(route(&model, visits).is_feasible(&model), feasible);
    }

    #[rstest]
    fn single_insertion_prefers_smallest_detour(model: Model) {
        let route = route(&model, vec![1, 5]);
        let cost = distance(&model);
        let (insertion, delta) = route
            .best_insertion(&model, Unit::Single(4), &cost)
            .expect("fits");
        assert_eq!(insertion, Insertion::Single { slot: 1 });
        assert_eq!(delta, 0);
    }

    #[rstest]
    fn single_insertion_waits_for_delivery_to_free_capacity(model: Model) {
        let route = route(&model, vec![4, 2, 3]);
        let cost = distance(&model);
        let (insertion, _) = route
            .best_insertion(&model, Unit::Single(1), &cost)
            .expect("fits after the delivery");
        assert_eq!(insertion, Insertion::Single { slot: 3 });
        let mut grown = route.clone();
        grown.apply(&model, Unit::Single(1), insertion);
        assert!(grown.is_feasible(&model));
    }

    #[rstest]
    fn pair_insertion_keeps_precedence(model: Model) {
        let route = route(&model, vec![1]);
        let cost = distance(&model);
        let unit = Unit::Pair {
            pickup: 2,
            delivery: 3,
        };
        let (insertion, _) = route.best_insertion(&model, unit, &cost).expect("fits");
        let mut grown = route.clone();
        grown.apply(&model, unit, insertion);
        assert!(grown.is_feasible(&model));
        let position = |node| grown.visits().iter().position(|v| *v == node);
        assert!(position(2) < position(3));
    }

    #[rstest]
    fn pair_rejected_when_pickup_overflows(model: Model) {
        let route = route(&model, vec![1, 4]);
        let cost = distance(&model);
        let unit = Unit::Pair {
            pickup: 2,
            delivery: 3,
        };
        let (insertion, _) = route.best_insertion(&model, unit, &cost).expect("fits");
        let Insertion::Pair { pickup_slot, .. } = insertion else {
            panic!("pair insertion expected");
        };
        assert_eq!(pickup_slot, 0, "only before node 1 is the load low enough");
    }

    #[rstest]
    fn removing_a_pair_drops_both_nodes(model: Model) {
        let route = route(&model, vec![2, 1, 3]);
        let reduced = route.without(
            &model,
            Unit::Pair {
                pickup: 2,
                delivery: 3,
            },
        );
        assert_eq!(reduced.visits(), &[1]);
        assert_eq!(reduced.distance(), 2);
    }
}
