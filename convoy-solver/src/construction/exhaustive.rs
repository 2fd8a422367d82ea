//! Bounded branch-and-bound over complete assignments.
//!
//! Routes are filled one vehicle at a time by appending stops, so every
//! ordered assignment is reachable. Branches are pruned on prefix load, on
//! partial distance against the vehicle cap and on the best total found so
//! far. The walk gives up after a fixed number of expansions.

use log::debug;

use crate::model::{Model, Role};
use crate::route::Route;

/// Expansions allowed before the walk gives up.
const EXPANSION_LIMIT: usize = 400_000;

/// Cheapest assignment routing every stop, if the walk finds one.
pub(super) fn best_assignment(model: &Model) -> Option<Vec<Route>> {
    let remaining = (0..model.size())
        .filter(|node| model.role(*node) != Role::Terminal)
        .collect();
    let mut walk = Walk {
        model,
        budget: EXPANSION_LIMIT,
        remaining,
        closed: Vec::new(),
        closed_cost: 0,
        best: None,
    };
    walk.open_vehicle(0);
    if walk.budget == 0 {
        debug!("assignment walk hit its expansion limit");
    }

    let (_, assignment) = walk.best?;
    let routes = assignment
        .into_iter()
        .enumerate()
        .map(|(vehicle, visits)| Route::new(model, vehicle, visits))
        .collect::<Option<Vec<_>>>()?;
    routes
        .iter()
        .all(|route| route.is_feasible(model))
        .then_some(routes)
}

struct Walk<'a> {
    model: &'a Model,
    budget: usize,
    remaining: Vec<usize>,
    closed: Vec<Vec<usize>>,
    closed_cost: i64,
    best: Option<(i64, Vec<Vec<usize>>)>,
}

impl Walk<'_> {
    fn open_vehicle(&mut self, vehicle: usize) {
        let Some(fleet) = self.model.vehicle(vehicle) else {
            return;
        };
        let load = self.model.demand(fleet.start);
        if (0..=fleet.capacity).contains(&load) {
            self.extend(vehicle, &mut Vec::new(), load, 0);
        }
    }

    fn extend(&mut self, vehicle: usize, visits: &mut Vec<usize>, load: i64, distance: i64) {
        if self.budget == 0 {
            return;
        }
        self.budget = self.budget.saturating_sub(1);
        let Some(fleet) = self.model.vehicle(vehicle).copied() else {
            return;
        };
        let last = visits.last().copied().unwrap_or(fleet.start);

        let mut candidates: Vec<usize> = self
            .remaining
            .iter()
            .copied()
            .filter(|node| self.may_follow(visits, *node))
            .collect();
        candidates.sort_by_key(|node| self.model.distance(last, *node));

        for node in candidates {
            let next_load = load.saturating_add(self.model.demand(node));
            let next_distance = distance.saturating_add(self.model.distance(last, node));
            if !(0..=fleet.capacity).contains(&next_load)
                || next_distance > fleet.max_distance
                || self.dominated(next_distance)
            {
                continue;
            }
            self.remaining.retain(|other| *other != node);
            visits.push(node);
            self.extend(vehicle, visits, next_load, next_distance);
            visits.pop();
            self.remaining.push(node);
        }

        let total = distance.saturating_add(self.model.distance(last, fleet.end));
        if total <= fleet.max_distance && !self.dominated(total) && self.pairs_closed(visits) {
            self.close(vehicle, visits, total);
        }
    }

    fn close(&mut self, vehicle: usize, visits: &[usize], total: i64) {
        let next = vehicle.saturating_add(1);
        if next == self.model.vehicles().len() {
            if self.remaining.is_empty() {
                let mut assignment = self.closed.clone();
                assignment.push(visits.to_vec());
                self.best = Some((self.closed_cost.saturating_add(total), assignment));
            }
            return;
        }
        self.closed.push(visits.to_vec());
        self.closed_cost = self.closed_cost.saturating_add(total);
        self.open_vehicle(next);
        self.closed_cost = self.closed_cost.saturating_sub(total);
        self.closed.pop();
    }

    /// Whether routes closed so far plus `partial` already cost the best.
    fn dominated(&self, partial: i64) -> bool {
        self.best
            .as_ref()
            .is_some_and(|(best, _)| self.closed_cost.saturating_add(partial) >= *best)
    }

    fn may_follow(&self, visits: &[usize], node: usize) -> bool {
        match self.model.role(node) {
            Role::Delivery { pickup } => visits.contains(&pickup),
            Role::Single | Role::Pickup { .. } => true,
            Role::Terminal => false,
        }
    }

    fn pairs_closed(&self, visits: &[usize]) -> bool {
        visits.iter().all(|node| match self.model.role(*node) {
            Role::Pickup { delivery } => visits.contains(&delivery),
            Role::Single | Role::Delivery { .. } | Role::Terminal => true,
        })
    }
}
