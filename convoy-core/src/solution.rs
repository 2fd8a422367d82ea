//! Routing results returned by engines and stored for polling clients.

use serde::{Deserialize, Serialize};

/// Terminal state of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// A feasible assignment was found.
    Found,
    /// No assignment satisfies every constraint.
    Infeasible,
}

/// What a vehicle does at a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopAction {
    /// Plain visit, including route terminals.
    Visit,
    /// Pickup side of a pair served by this route.
    Pickup,
    /// Delivery side of a pair served by this route.
    Delivery,
}

/// A node on a route with the vehicle's load after serving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    /// Node index.
    pub node: usize,
    /// Cumulative load after the stop.
    pub load: i64,
    /// Action taken at the node.
    pub action: StopAction,
}

/// The route assigned to one vehicle, terminals included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteResult {
    /// Index of the vehicle.
    pub vehicle_id: usize,
    /// Stops from the start terminal to the end terminal.
    pub stops: Vec<Stop>,
    /// Plain node sequence, equal to the nodes of `stops`.
    pub route: Vec<usize>,
    /// Sum of arc costs travelled.
    pub distance: u64,
}

impl RouteResult {
    /// Build a route result, deriving the node sequence from `stops`.
    #[must_use]
    pub fn new(vehicle_id: usize, stops: Vec<Stop>, distance: u64) -> Self {
        let route = stops.iter().map(|stop| stop.node).collect();
        Self {
            vehicle_id,
            stops,
            route,
            distance,
        }
    }

    /// Whether the vehicle serves no node other than its terminals.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.stops.len() <= 2
    }
}

/// Outcome of a routing engine run.
///
/// `objective` and `total_distance` are both the sum of route distances;
/// the duplicate field keeps the response shape clients already consume.
///
/// # Examples
/// ```
/// use convoy_core::{RouteResult, Solution, SolveStatus, Stop, StopAction};
///
/// let stop = |node| Stop { node, load: 0, action: StopAction::Visit };
/// let solution = Solution::found(vec![
///     RouteResult::new(0, vec![stop(0), stop(2), stop(0)], 12),
///     RouteResult::new(1, vec![stop(0), stop(0)], 0),
/// ]);
/// assert_eq!(solution.status, SolveStatus::Found);
/// assert_eq!(solution.objective, 12);
/// assert_eq!(solution.routes[0].route, vec![0, 2, 0]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    /// Whether a feasible assignment exists.
    pub status: SolveStatus,
    /// One entry per vehicle, in vehicle order.
    pub routes: Vec<RouteResult>,
    /// Total cost of the assignment.
    pub objective: u64,
    /// Total distance travelled by the fleet.
    pub total_distance: u64,
}

impl Solution {
    /// Wrap feasible routes, summing their distances.
    #[must_use]
    pub fn found(routes: Vec<RouteResult>) -> Self {
        let total = routes
            .iter()
            .fold(0_u64, |acc, route| acc.saturating_add(route.distance));
        Self {
            status: SolveStatus::Found,
            routes,
            objective: total,
            total_distance: total,
        }
    }

    /// An infeasible outcome with no routes.
    #[must_use]
    pub const fn infeasible() -> Self {
        Self {
            status: SolveStatus::Infeasible,
            routes: Vec::new(),
            objective: 0,
            total_distance: 0,
        }
    }

    /// Whether the solve found a feasible assignment.
    #[must_use]
    pub fn is_found(&self) -> bool {
        self.status == SolveStatus::Found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn visit(node: usize, load: i64) -> Stop {
        Stop {
            node,
            load,
            action: StopAction::Visit,
        }
    }

    #[rstest]
    fn objective_sums_route_distances() {
        let solution = Solution::found(vec![
            RouteResult::new(0, vec![visit(0, 0), visit(1, 3), visit(0, 3)], 40),
            RouteResult::new(1, vec![visit(0, 0), visit(2, 1), visit(0, 1)], 25),
        ]);
        assert_eq!(solution.objective, 65);
        assert_eq!(solution.total_distance, 65);
    }

    #[rstest]
    fn infeasible_has_no_routes() {
        let solution = Solution::infeasible();
        assert!(!solution.is_found());
        assert!(solution.routes.is_empty());
    }

    #[rstest]
    #[case(vec![visit(0, 0), visit(0, 0)], true)]
    #[case(vec![visit(0, 0), visit(4, 2), visit(0, 2)], false)]
    fn idle_routes_serve_only_terminals(#[case] stops: Vec<Stop>, #[case] idle: bool) {
        assert_eq!(RouteResult::new(0, stops, 0).is_idle(), idle);
    }

    #[rstest]
    fn serialises_status_and_actions_in_snake_case() {
        let route = RouteResult::new(
            2,
            vec![
                visit(0, 0),
                Stop {
                    node: 5,
                    load: 4,
                    action: StopAction::Pickup,
                },
                visit(0, 4),
            ],
            9,
        );
        let json = serde_json::to_value(Solution::found(vec![route])).expect("serialise");
        assert_eq!(json["status"], "found");
        assert_eq!(json["routes"][0]["stops"][1]["action"], "pickup");
        assert_eq!(json["routes"][0]["route"], serde_json::json!([0, 5, 0]));
        assert_eq!(json["total_distance"], 9);
    }
}
