//! Solution checker shared by unit, property and behaviour tests.

use std::collections::{HashMap, HashSet};

use convoy_core::{ProblemInstance, RouteResult, Solution, StopAction};

/// Check `solution` against every constraint of `instance`.
///
/// Infeasible solutions pass when they carry no routes.
///
/// # Errors
///
/// Returns a description of the first broken constraint.
///
/// # Examples
/// ```
/// use convoy_core::{ProblemInstance, Solution};
/// use convoy_solver::test_support::check_solution;
///
/// let instance = ProblemInstance {
///     distance_matrix: vec![vec![0]],
///     demands: vec![0],
///     vehicle_capacities: vec![1],
///     vehicle_max_distances: vec![1],
///     pickups_deliveries: Vec::new(),
///     num_vehicles: 1,
///     depot: 0,
///     starts: vec![0],
///     ends: vec![0],
/// };
/// assert!(check_solution(&instance, &Solution::infeasible()).is_ok());
/// ```
pub fn check_solution(instance: &ProblemInstance, solution: &Solution) -> Result<(), String> {
    if !solution.is_found() {
        return if solution.routes.is_empty() {
            Ok(())
        } else {
            Err("infeasible solution carries routes".to_owned())
        };
    }
    if solution.routes.len() != instance.num_vehicles {
        return Err(format!(
            "expected {} routes, found {}",
            instance.num_vehicles,
            solution.routes.len()
        ));
    }

    let mut checker = Checker::new(instance);
    let mut total = 0_u64;
    for (vehicle, route) in solution.routes.iter().enumerate() {
        total = total.saturating_add(checker.route(vehicle, route)?);
    }
    checker.coverage()?;

    if solution.objective != total || solution.total_distance != total {
        return Err(format!(
            "objective {} does not equal route total {total}",
            solution.objective
        ));
    }
    Ok(())
}

struct Checker<'a> {
    instance: &'a ProblemInstance,
    terminals: HashSet<usize>,
    pickups: HashMap<usize, usize>,
    deliveries: HashSet<usize>,
    served: HashMap<usize, (usize, usize)>,
}

impl<'a> Checker<'a> {
    fn new(instance: &'a ProblemInstance) -> Self {
        Self {
            instance,
            terminals: instance.starts.iter().chain(&instance.ends).copied().collect(),
            pickups: instance
                .pickups_deliveries
                .iter()
                .map(|pair| (pair.pickup, pair.delivery))
                .collect(),
            deliveries: instance
                .pickups_deliveries
                .iter()
                .map(|pair| pair.delivery)
                .collect(),
            served: HashMap::new(),
        }
    }

    /// Check one route and return its recomputed distance.
    fn route(&mut self, vehicle: usize, route: &RouteResult) -> Result<u64, String> {
        if route.vehicle_id != vehicle {
            return Err(format!("route {vehicle} reports vehicle {}", route.vehicle_id));
        }
        let nodes: Vec<usize> = route.stops.iter().map(|stop| stop.node).collect();
        if nodes != route.route
            || nodes.len() < 2
            || nodes.first() != self.instance.starts.get(vehicle)
            || nodes.last() != self.instance.ends.get(vehicle)
        {
            return Err(format!("route {vehicle} does not run start to end: {nodes:?}"));
        }
        self.loads(vehicle, route)?;
        self.record_visits(vehicle, &nodes)?;

        let distance = nodes.windows(2).try_fold(0_u64, |acc, arc| match arc {
            [from, to] => self
                .instance
                .distance_matrix
                .get(*from)
                .and_then(|row| row.get(*to))
                .map(|cost| acc.saturating_add(*cost))
                .ok_or_else(|| format!("arc ({from}, {to}) is outside the matrix")),
            _ => Ok(acc),
        })?;
        if distance != route.distance {
            return Err(format!(
                "route {vehicle} reports distance {}, expected {distance}",
                route.distance
            ));
        }
        let cap = self.instance.vehicle_max_distances.get(vehicle).copied().unwrap_or(0);
        if distance > cap {
            return Err(format!("route {vehicle} distance {distance} exceeds {cap}"));
        }
        Ok(distance)
    }

    fn loads(&self, vehicle: usize, route: &RouteResult) -> Result<(), String> {
        let capacity = self.instance.vehicle_capacities.get(vehicle).copied().unwrap_or(0);
        let end = route.stops.len().saturating_sub(1);
        let mut load = 0_i64;
        for (position, stop) in route.stops.iter().enumerate() {
            if position < end {
                let demand = self.instance.demands.get(stop.node).copied().unwrap_or(0);
                load = load.saturating_add(demand);
            }
            if stop.load != load {
                return Err(format!(
                    "route {vehicle} reports load {} at node {}, expected {load}",
                    stop.load, stop.node
                ));
            }
            if !(0..=capacity).contains(&load) {
                return Err(format!("route {vehicle} load {load} leaves [0, {capacity}]"));
            }
            let terminal = position == 0 || position == end;
            if stop.action != self.expected_action(stop.node, terminal) {
                return Err(format!("node {} tagged {:?}", stop.node, stop.action));
            }
        }
        Ok(())
    }

    fn expected_action(&self, node: usize, terminal: bool) -> StopAction {
        if terminal {
            StopAction::Visit
        } else if self.pickups.contains_key(&node) {
            StopAction::Pickup
        } else if self.deliveries.contains(&node) {
            StopAction::Delivery
        } else {
            StopAction::Visit
        }
    }

    fn record_visits(&mut self, vehicle: usize, nodes: &[usize]) -> Result<(), String> {
        let inner = nodes.iter().enumerate().skip(1).take(nodes.len().saturating_sub(2));
        for (position, node) in inner {
            if self.terminals.contains(node) {
                return Err(format!("terminal {node} visited as a stop"));
            }
            if self.served.insert(*node, (vehicle, position)).is_some() {
                return Err(format!("node {node} visited twice"));
            }
        }
        Ok(())
    }

    fn coverage(&self) -> Result<(), String> {
        let missing = (0..self.instance.node_count())
            .find(|node| !self.terminals.contains(node) && !self.served.contains_key(node));
        if let Some(node) = missing {
            return Err(format!("node {node} is never visited"));
        }
        for (pickup, delivery) in &self.pickups {
            let (Some(picked), Some(dropped)) = (self.served.get(pickup), self.served.get(delivery))
            else {
                return Err(format!("pair ({pickup}, {delivery}) is not fully served"));
            };
            if picked.0 != dropped.0 || picked.1 >= dropped.1 {
                return Err(format!(
                    "pair ({pickup}, {delivery}) served as {picked:?} and {dropped:?}"
                ));
            }
        }
        Ok(())
    }
}
