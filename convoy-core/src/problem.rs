//! Problem instances consumed by routing engines.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::validation::{FleetShape, ValidationError, Violations};

/// Pairwise travel costs; `matrix[i][j]` is the cost from node `i` to node `j`.
pub type DistanceMatrix = Vec<Vec<u64>>;

/// Two nodes served by the same vehicle, pickup strictly before delivery.
///
/// Serialised as a two-element array `[pickup, delivery]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct PickupDelivery {
    /// Node where the load is collected.
    pub pickup: usize,
    /// Node where the load is dropped off.
    pub delivery: usize,
}

impl PickupDelivery {
    /// Pair a pickup node with its delivery node.
    #[must_use]
    pub const fn new(pickup: usize, delivery: usize) -> Self {
        Self { pickup, delivery }
    }
}

impl fmt::Display for PickupDelivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.pickup, self.delivery)
    }
}

impl From<[usize; 2]> for PickupDelivery {
    fn from([pickup, delivery]: [usize; 2]) -> Self {
        Self { pickup, delivery }
    }
}

impl From<PickupDelivery> for [usize; 2] {
    fn from(value: PickupDelivery) -> Self {
        [value.pickup, value.delivery]
    }
}

/// Immutable input to a routing engine.
///
/// Node indices refer to rows of `distance_matrix`. Vehicle `v` begins its
/// route at `starts[v]` and finishes at `ends[v]`; the two may differ, which
/// allows open and multi-depot fleets. `depot` is informational only.
///
/// # Examples
/// ```
/// use convoy_core::{PickupDelivery, ProblemInstance};
///
/// let instance = ProblemInstance {
///     distance_matrix: vec![vec![0, 4, 6], vec![4, 0, 3], vec![6, 3, 0]],
///     demands: vec![0, 2, 1],
///     vehicle_capacities: vec![5],
///     vehicle_max_distances: vec![100],
///     pickups_deliveries: vec![PickupDelivery::new(1, 2)],
///     num_vehicles: 1,
///     depot: 0,
///     starts: vec![0],
///     ends: vec![0],
/// };
/// assert!(instance.validate().is_ok());
/// assert_eq!(instance.node_count(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemInstance {
    /// Square matrix of non-negative travel costs.
    pub distance_matrix: DistanceMatrix,
    /// Demand at each node; terminals are typically zero.
    pub demands: Vec<i64>,
    /// Capacity of each vehicle.
    pub vehicle_capacities: Vec<i64>,
    /// Maximum travelled distance for each vehicle.
    pub vehicle_max_distances: Vec<u64>,
    /// Pickup and delivery pairings.
    #[serde(default)]
    pub pickups_deliveries: Vec<PickupDelivery>,
    /// Number of vehicles in the fleet.
    pub num_vehicles: usize,
    /// Reference depot node.
    pub depot: usize,
    /// Start node for each vehicle.
    pub starts: Vec<usize>,
    /// End node for each vehicle.
    pub ends: Vec<usize>,
}

impl ProblemInstance {
    /// Number of nodes described by the distance matrix.
    #[must_use]
    pub const fn node_count(&self) -> usize {
        self.distance_matrix.len()
    }

    /// Check every data-model invariant.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming each violated field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Violations::default();
        let n = self.node_count();
        violations.check(n > 0, "distance_matrix", "must contain at least one node");
        if let Some((row_idx, row)) = self
            .distance_matrix
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != n)
        {
            violations.push(
                "distance_matrix",
                format!("row {row_idx} has {} entries, expected {n}", row.len()),
            );
        }
        FleetShape {
            nodes: n,
            demands: &self.demands,
            vehicle_capacities: &self.vehicle_capacities,
            vehicle_max_distances: &self.vehicle_max_distances,
            pickups_deliveries: &self.pickups_deliveries,
            num_vehicles: self.num_vehicles,
            depot: self.depot,
            starts: &self.starts,
            ends: &self.ends,
        }
        .check_into(&mut violations);
        violations.into_result()
    }
}
