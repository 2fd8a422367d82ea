//! Submission payloads carrying coordinates instead of a distance matrix.

use serde::{Deserialize, Serialize};

use crate::validation::{FleetShape, ValidationError, Violations};
use crate::{Coordinate, DistanceMatrix, PickupDelivery, ProblemInstance};

/// A routing request as submitted by a client.
///
/// Every field defaults when absent so that a missing field surfaces as a
/// [`ValidationError`] naming it, rather than as an opaque decoding failure.
/// `depot` and `pickups_deliveries` have valid zero values, so they are
/// optional here and reported as missing when left out.
///
/// # Examples
/// ```
/// use convoy_core::SolveRequest;
///
/// let request: SolveRequest = serde_json::from_str(r#"{
///     "coordinates": [[35.05, -89.85], [35.04, -89.97]],
///     "demands": [0, 3],
///     "vehicle_capacities": [10],
///     "vehicle_max_distances": [90000],
///     "pickups_deliveries": [],
///     "num_vehicles": 1,
///     "depot": 0,
///     "starts": [0],
///     "ends": [0]
/// }"#)?;
/// assert!(request.validate().is_ok());
///
/// let missing: SolveRequest = serde_json::from_str(r#"{"num_vehicles": 1}"#)?;
/// let err = missing.validate().unwrap_err();
/// assert!(err.fields().contains(&"coordinates"));
/// assert!(err.fields().contains(&"depot"));
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveRequest {
    /// Node locations; node `i` is `coordinates[i]`.
    pub coordinates: Vec<Coordinate>,
    /// Demand at each node.
    pub demands: Vec<i64>,
    /// Capacity of each vehicle.
    pub vehicle_capacities: Vec<i64>,
    /// Maximum travelled distance for each vehicle.
    pub vehicle_max_distances: Vec<u64>,
    /// Pickup and delivery pairings; required, possibly empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickups_deliveries: Option<Vec<PickupDelivery>>,
    /// Number of vehicles; must be positive.
    pub num_vehicles: usize,
    /// Reference depot node; required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depot: Option<usize>,
    /// Start node for each vehicle.
    pub starts: Vec<usize>,
    /// End node for each vehicle.
    pub ends: Vec<usize>,
}

impl SolveRequest {
    /// Check the request against the data-model invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing each violated field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Violations::default();
        let n = self.coordinates.len();
        violations.check(n > 0, "coordinates", "at least one coordinate is required");
        if let Some((idx, coordinate)) = self
            .coordinates
            .iter()
            .enumerate()
            .find(|(_, coordinate)| !coordinate.is_valid())
        {
            violations.push(
                "coordinates",
                format!(
                    "entry {idx} ({}, {}) is not a valid latitude/longitude",
                    coordinate.lat, coordinate.lng
                ),
            );
        }
        violations.check(self.depot.is_some(), "depot", "depot is required");
        violations.check(
            self.pickups_deliveries.is_some(),
            "pickups_deliveries",
            "pickups_deliveries is required; send [] for none",
        );
        FleetShape {
            nodes: n,
            demands: &self.demands,
            vehicle_capacities: &self.vehicle_capacities,
            vehicle_max_distances: &self.vehicle_max_distances,
            pickups_deliveries: self.pickups_deliveries.as_deref().unwrap_or_default(),
            num_vehicles: self.num_vehicles,
            depot: self.depot.unwrap_or_default(),
            starts: &self.starts,
            ends: &self.ends,
        }
        .check_into(&mut violations);
        violations.into_result()
    }

    /// Attach a distance matrix, producing the engine's input.
    ///
    /// Meant for requests that passed [`validate`](Self::validate); absent
    /// optional fields become node 0 and no pairs.
    #[must_use]
    pub fn into_instance(self, distance_matrix: DistanceMatrix) -> ProblemInstance {
        ProblemInstance {
            distance_matrix,
            demands: self.demands,
            vehicle_capacities: self.vehicle_capacities,
            vehicle_max_distances: self.vehicle_max_distances,
            pickups_deliveries: self.pickups_deliveries.unwrap_or_default(),
            num_vehicles: self.num_vehicles,
            depot: self.depot.unwrap_or_default(),
            starts: self.starts,
            ends: self.ends,
        }
    }
}
