//! Immutable view of a [`ProblemInstance`] shaped for route evaluation.
//!
//! The model flattens the distance matrix, classifies every node by the role
//! it plays in the search and groups the nodes that must be routed into
//! insertion units: lone stops and pickup-delivery pairs.

use std::collections::HashSet;

use convoy_core::{EngineError, ProblemInstance};

/// Cost reported for arcs outside the matrix; large enough to fail any cap.
pub(crate) const UNREACHABLE: i64 = i64::MAX / 4;

/// How the search treats a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    /// Start or end of some vehicle; never visited as a stop.
    Terminal,
    /// Plain stop with no pairing.
    Single,
    /// Pickup side of a pair.
    Pickup { delivery: usize },
    /// Delivery side of a pair.
    Delivery { pickup: usize },
}

/// Smallest group of nodes the construction and relocation moves handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Unit {
    Single(usize),
    Pair { pickup: usize, delivery: usize },
}

impl Unit {
    /// Whether `node` belongs to this unit.
    pub(crate) const fn contains(self, node: usize) -> bool {
        match self {
            Self::Single(single) => single == node,
            Self::Pair { pickup, delivery } => pickup == node || delivery == node,
        }
    }
}

/// Per-vehicle limits and terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Vehicle {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) capacity: i64,
    pub(crate) max_distance: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct Model {
    size: usize,
    distances: Vec<i64>,
    demands: Vec<i64>,
    roles: Vec<Role>,
    vehicles: Vec<Vehicle>,
    units: Vec<Unit>,
}

impl Model {
    /// Build a model, rejecting instances the search cannot represent.
    pub(crate) fn new(instance: &ProblemInstance) -> Result<Self, EngineError> {
        instance.validate().map_err(|err| model_error(err.to_string()))?;
        let size = instance.node_count();

        let mut distances = Vec::with_capacity(size.saturating_mul(size));
        for (from, row) in instance.distance_matrix.iter().enumerate() {
            for (to, entry) in row.iter().enumerate() {
                let cost = i64::try_from(*entry)
                    .ok()
                    .filter(|value| *value < UNREACHABLE)
                    .ok_or_else(|| {
                        model_error(format!("distance from {from} to {to} is too large"))
                    })?;
                distances.push(cost);
            }
        }

        let vehicles: Vec<Vehicle> = instance
            .starts
            .iter()
            .zip(&instance.ends)
            .zip(&instance.vehicle_capacities)
            .zip(&instance.vehicle_max_distances)
            .map(|(((start, end), capacity), max_distance)| Vehicle {
                start: *start,
                end: *end,
                capacity: *capacity,
                max_distance: i64::try_from(*max_distance).unwrap_or(i64::MAX),
            })
            .collect();

        let roles = assign_roles(instance, &vehicles)?;
        let units = roles
            .iter()
            .enumerate()
            .filter_map(|(node, role)| match role {
                Role::Single => Some(Unit::Single(node)),
                Role::Pickup { delivery } => Some(Unit::Pair {
                    pickup: node,
                    delivery: *delivery,
                }),
                Role::Terminal | Role::Delivery { .. } => None,
            })
            .collect();

        Ok(Self {
            size,
            distances,
            demands: instance.demands.clone(),
            roles,
            vehicles,
            units,
        })
    }

    pub(crate) const fn size(&self) -> usize {
        self.size
    }

    /// Travel cost of the arc `from -> to`.
    pub(crate) fn distance(&self, from: usize, to: usize) -> i64 {
        from.checked_mul(self.size)
            .and_then(|offset| offset.checked_add(to))
            .and_then(|idx| self.distances.get(idx))
            .copied()
            .unwrap_or(UNREACHABLE)
    }

    pub(crate) fn demand(&self, node: usize) -> i64 {
        self.demands.get(node).copied().unwrap_or(0)
    }

    pub(crate) fn role(&self, node: usize) -> Role {
        self.roles.get(node).copied().unwrap_or(Role::Terminal)
    }

    pub(crate) fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub(crate) fn vehicle(&self, idx: usize) -> Option<&Vehicle> {
        self.vehicles.get(idx)
    }

    pub(crate) fn units(&self) -> &[Unit] {
        &self.units
    }

    /// The unit a routed node belongs to, or `None` for terminals.
    pub(crate) fn unit_of(&self, node: usize) -> Option<Unit> {
        match self.role(node) {
            Role::Terminal => None,
            Role::Single => Some(Unit::Single(node)),
            Role::Pickup { delivery } => Some(Unit::Pair {
                pickup: node,
                delivery,
            }),
            Role::Delivery { pickup } => Some(Unit::Pair {
                pickup,
                delivery: node,
            }),
        }
    }

    /// Number of nodes that must be visited.
    pub(crate) fn visit_count(&self) -> usize {
        self.roles
            .iter()
            .filter(|role| !matches!(role, Role::Terminal))
            .count()
    }
}

fn assign_roles(
    instance: &ProblemInstance,
    vehicles: &[Vehicle],
) -> Result<Vec<Role>, EngineError> {
    let terminals: HashSet<usize> = vehicles
        .iter()
        .flat_map(|vehicle| [vehicle.start, vehicle.end])
        .collect();
    let mut roles: Vec<Role> = (0..instance.node_count())
        .map(|node| {
            if terminals.contains(&node) {
                Role::Terminal
            } else {
                Role::Single
            }
        })
        .collect();

    for pair in &instance.pickups_deliveries {
        if terminals.contains(&pair.pickup) || terminals.contains(&pair.delivery) {
            return Err(model_error(format!(
                "pair {pair} uses a vehicle start or end node"
            )));
        }
        for (node, role) in [
            (pair.pickup, Role::Pickup {
                delivery: pair.delivery,
            }),
            (pair.delivery, Role::Delivery {
                pickup: pair.pickup,
            }),
        ] {
            let slot = roles
                .get_mut(node)
                .ok_or_else(|| model_error(format!("pair {pair} is out of range")))?;
            if *slot != Role::Single {
                return Err(model_error(format!(
                    "node {node} appears in more than one pair"
                )));
            }
            *slot = role;
        }
    }
    Ok(roles)
}

fn model_error(reason: impl Into<String>) -> EngineError {
    EngineError::ModelConstruction {
        reason: reason.into(),
    }
}
