//! Field-level validation shared by submission requests and problem instances.
//!
//! Validation collects every violated invariant instead of stopping at the
//! first one, so callers can report all offending fields in a single response.

use std::collections::HashSet;

use thiserror::Error;

use crate::PickupDelivery;

/// A single invariant violation attributed to an input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Name of the offending field, e.g. `vehicle_capacities`.
    pub field: String,
    /// Human-readable description of the broken invariant.
    pub reason: String,
}

/// Input failed validation before any work was scheduled.
///
/// Always carries at least one [`FieldViolation`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid input: {}", summarise(.violations))]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Build an error for a single field.
    pub fn single(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation {
                field: field.into(),
                reason: reason.into(),
            }],
        }
    }

    /// All recorded violations in detection order.
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Names of the violated fields, deduplicated, in detection order.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.violations
            .iter()
            .map(|violation| violation.field.as_str())
            .filter(|field| seen.insert(*field))
            .collect()
    }
}

fn summarise(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|violation| format!("{}: {}", violation.field, violation.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Accumulates violations and converts them into a [`ValidationError`].
#[derive(Debug, Default)]
pub(crate) struct Violations {
    items: Vec<FieldViolation>,
}

impl Violations {
    pub(crate) fn push(&mut self, field: &str, reason: impl Into<String>) {
        self.items.push(FieldViolation {
            field: field.to_owned(),
            reason: reason.into(),
        });
    }

    pub(crate) fn check(&mut self, condition: bool, field: &str, reason: impl Into<String>) {
        if !condition {
            self.push(field, reason);
        }
    }

    pub(crate) fn into_result(self) -> Result<(), ValidationError> {
        if self.items.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { violations: self.items })
        }
    }
}

/// Shape of a fleet as declared by a request or problem instance.
pub(crate) struct FleetShape<'a> {
    pub(crate) nodes: usize,
    pub(crate) demands: &'a [i64],
    pub(crate) vehicle_capacities: &'a [i64],
    pub(crate) vehicle_max_distances: &'a [u64],
    pub(crate) pickups_deliveries: &'a [PickupDelivery],
    pub(crate) num_vehicles: usize,
    pub(crate) depot: usize,
    pub(crate) starts: &'a [usize],
    pub(crate) ends: &'a [usize],
}

impl FleetShape<'_> {
    /// Check the invariants every problem shares regardless of how its
    /// distances were obtained.
    pub(crate) fn check_into(&self, violations: &mut Violations) {
        let n = self.nodes;
        let v = self.num_vehicles;

        violations.check(
            self.demands.len() == n,
            "demands",
            format!("expected {n} entries, found {}", self.demands.len()),
        );
        violations.check(v > 0, "num_vehicles", "must be greater than zero");
        violations.check(
            self.vehicle_capacities.len() == v,
            "vehicle_capacities",
            format!("expected {v} entries, found {}", self.vehicle_capacities.len()),
        );
        violations.check(
            self.vehicle_capacities.iter().all(|capacity| *capacity >= 0),
            "vehicle_capacities",
            "capacities must be non-negative",
        );
        violations.check(
            self.vehicle_max_distances.len() == v,
            "vehicle_max_distances",
            format!(
                "expected {v} entries, found {}",
                self.vehicle_max_distances.len()
            ),
        );
        violations.check(
            self.depot < n,
            "depot",
            format!("node {} is outside [0, {n})", self.depot),
        );
        check_terminals(violations, "starts", self.starts, n, v);
        check_terminals(violations, "ends", self.ends, n, v);
        check_pairs(violations, self.pickups_deliveries, n);
    }
}

fn check_terminals(violations: &mut Violations, field: &str, nodes: &[usize], n: usize, v: usize) {
    violations.check(
        nodes.len() == v,
        field,
        format!("expected {v} entries, found {}", nodes.len()),
    );
    if let Some(node) = nodes.iter().find(|node| **node >= n) {
        violations.push(field, format!("node {node} is outside [0, {n})"));
    }
}

fn check_pairs(violations: &mut Violations, pairs: &[PickupDelivery], n: usize) {
    let mut pickups = HashSet::new();
    for pair in pairs {
        if pair.pickup >= n || pair.delivery >= n {
            violations.push(
                "pickups_deliveries",
                format!("pair {pair} references a node outside [0, {n})"),
            );
        }
        if pair.pickup == pair.delivery {
            violations.push(
                "pickups_deliveries",
                format!("pair {pair} uses the same node twice"),
            );
        }
        if !pickups.insert(pair.pickup) {
            violations.push(
                "pickups_deliveries",
                format!("pickup node {} appears in more than one pair", pair.pickup),
            );
        }
    }
}
