//! Benchmark support utilities for the CVRP engine.
//!
//! Provides deterministic clustered instances with Manhattan distance
//! matrices for reproducible benchmarks.

use convoy_core::{PickupDelivery, ProblemInstance};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seed for deterministic random number generation in benchmarks.
pub const BENCHMARK_SEED: u64 = 42;

/// Number of cluster centres stops are scattered around.
const CLUSTER_COUNT: usize = 5;

/// Side of the square holding the cluster centres, in metres.
const AREA_SIZE: i64 = 10_000;

/// Depot position at the centre of the area.
const DEPOT: (i64, i64) = (5_000, 5_000);

/// Largest offset of a stop from its cluster centre, in metres.
const CLUSTER_SPREAD: i64 = 500;

/// Every `PAIR_EVERY`-th stop starts a pickup-delivery pair with its successor.
const PAIR_EVERY: usize = 8;

/// Generate a clustered instance with `stops` stops plus a central depot.
///
/// Demands are 1 to 9 per stop; pairs carry the pickup's demand to the
/// delivery. The fleet has one vehicle per ten stops with room for the
/// whole workload spread evenly plus slack.
#[must_use]
pub fn generate_instance(stops: usize, seed: u64) -> ProblemInstance {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let centres: Vec<(i64, i64)> = (0..CLUSTER_COUNT)
        .map(|_| (rng.gen_range(0..AREA_SIZE), rng.gen_range(0..AREA_SIZE)))
        .collect();

    let points: Vec<(i64, i64)> = std::iter::once(DEPOT)
        .chain((0..stops).map(|idx| {
            #[expect(
                clippy::integer_division_remainder_used,
                reason = "Modulo for cyclic assignment is intentional"
            )]
            let (cx, cy) = centres.get(idx % CLUSTER_COUNT).copied().unwrap_or(DEPOT);
            (
                cx + rng.gen_range(-CLUSTER_SPREAD..=CLUSTER_SPREAD),
                cy + rng.gen_range(-CLUSTER_SPREAD..=CLUSTER_SPREAD),
            )
        }))
        .collect();

    let mut demands: Vec<i64> = std::iter::once(0)
        .chain((0..stops).map(|_| rng.gen_range(1..=9)))
        .collect();
    let pairs: Vec<PickupDelivery> = (1..stops)
        .step_by(PAIR_EVERY)
        .map(|pickup| PickupDelivery::new(pickup, pickup + 1))
        .collect();
    for pair in &pairs {
        let load = demands.get(pair.pickup).copied().unwrap_or(0);
        if let Some(delivery) = demands.get_mut(pair.delivery) {
            *delivery = -load;
        }
    }

    let vehicles = stops.div_ceil(10).max(1);
    let total: i64 = demands.iter().filter(|demand| **demand > 0).sum();
    let fleet = i64::try_from(vehicles).unwrap_or(1);
    let capacity = total.checked_div(fleet).unwrap_or(total) + 20;

    ProblemInstance {
        distance_matrix: points
            .iter()
            .map(|from| {
                points
                    .iter()
                    .map(|to| from.0.abs_diff(to.0) + from.1.abs_diff(to.1))
                    .collect()
            })
            .collect(),
        demands,
        vehicle_capacities: vec![capacity; vehicles],
        vehicle_max_distances: vec![200_000; vehicles],
        pickups_deliveries: pairs,
        num_vehicles: vehicles,
        depot: 0,
        starts: vec![0; vehicles],
        ends: vec![0; vehicles],
    }
}
