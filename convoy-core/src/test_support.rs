//! Deterministic doubles for distance providers and routing engines, plus
//! the reference sixteen-stop request used across the workspace's tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::{
    Coordinate, DistanceMatrix, DistanceMatrixError, DistanceProvider, EngineError,
    PickupDelivery, ProblemInstance, RoutingEngine, Solution, SolveRequest,
};

/// Provider answering from a precomputed matrix over known coordinates.
///
/// Each origin and destination is looked up by equality in the coordinate
/// list the provider was built with, so callers can check that rows come
/// back in the order requested. Batch sizes are recorded for inspection.
#[derive(Debug, Default)]
pub struct FixedDistanceProvider {
    coordinates: Vec<Coordinate>,
    matrix: DistanceMatrix,
    batches: Mutex<Vec<usize>>,
}

impl FixedDistanceProvider {
    /// Serve `matrix`, where row `i` belongs to `coordinates[i]`.
    #[must_use]
    pub const fn new(coordinates: Vec<Coordinate>, matrix: DistanceMatrix) -> Self {
        Self {
            coordinates,
            matrix,
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Origin count of every call made so far, in call order.
    #[must_use]
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn index_of(&self, coordinate: &Coordinate) -> Result<usize, DistanceMatrixError> {
        self.coordinates
            .iter()
            .position(|known| known == coordinate)
            .ok_or_else(|| DistanceMatrixError::ServiceError {
                code: "NOT_FOUND".to_owned(),
                message: format!("unknown coordinate {}", coordinate.to_query_value()),
            })
    }

    fn cost(&self, from: usize, to: usize) -> Result<u64, DistanceMatrixError> {
        self.matrix
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .ok_or_else(|| DistanceMatrixError::MalformedResponse {
                message: format!("no fixed cost for ({from}, {to})"),
            })
    }
}

impl DistanceProvider for FixedDistanceProvider {
    fn distance_rows(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<DistanceMatrix, DistanceMatrixError> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(origins.len());
        let targets = destinations
            .iter()
            .map(|destination| self.index_of(destination))
            .collect::<Result<Vec<_>, _>>()?;
        origins
            .iter()
            .map(|origin| {
                let from = self.index_of(origin)?;
                targets.iter().map(|to| self.cost(from, *to)).collect()
            })
            .collect()
    }
}

/// Provider that fails on a chosen call and succeeds with unit costs before it.
#[derive(Debug)]
pub struct FailingDistanceProvider {
    fail_on: usize,
    error: DistanceMatrixError,
    calls: AtomicUsize,
}

impl FailingDistanceProvider {
    /// Fail every call with `error`.
    #[must_use]
    pub const fn always(error: DistanceMatrixError) -> Self {
        Self::on_batch(0, error)
    }

    /// Fail the zero-based `batch`-th call with `error`.
    #[must_use]
    pub const fn on_batch(batch: usize, error: DistanceMatrixError) -> Self {
        Self {
            fail_on: batch,
            error,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DistanceProvider for FailingDistanceProvider {
    fn distance_rows(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<DistanceMatrix, DistanceMatrixError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.fail_on {
            return Err(self.error.clone());
        }
        Ok(origins.iter().map(|_| vec![1; destinations.len()]).collect())
    }
}

/// Provider whose rows are one element short.
#[derive(Debug, Default, Clone, Copy)]
pub struct RaggedDistanceProvider;

impl DistanceProvider for RaggedDistanceProvider {
    fn distance_rows(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<DistanceMatrix, DistanceMatrixError> {
        let width = destinations.len().saturating_sub(1);
        Ok(origins.iter().map(|_| vec![1; width]).collect())
    }
}

/// Engine returning a fixed solution, optionally after a delay.
#[derive(Debug, Clone)]
pub struct StaticEngine {
    solution: Solution,
    delay: Duration,
}

impl StaticEngine {
    /// Return `solution` immediately.
    #[must_use]
    pub const fn new(solution: Solution) -> Self {
        Self {
            solution,
            delay: Duration::ZERO,
        }
    }

    /// Sleep for `delay` before answering.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl RoutingEngine for StaticEngine {
    fn solve(
        &self,
        _instance: &ProblemInstance,
        _time_budget: Duration,
    ) -> Result<Solution, EngineError> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        Ok(self.solution.clone())
    }
}

/// Engine that always reports an internal failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingEngine;

impl RoutingEngine for FailingEngine {
    fn solve(
        &self,
        _instance: &ProblemInstance,
        _time_budget: Duration,
    ) -> Result<Solution, EngineError> {
        Err(EngineError::Internal {
            message: "search aborted".to_owned(),
        })
    }
}

/// Engine that panics mid-solve.
#[derive(Debug, Default, Clone, Copy)]
pub struct PanickingEngine;

impl RoutingEngine for PanickingEngine {
    /// # Panics
    ///
    /// Always.
    fn solve(
        &self,
        _instance: &ProblemInstance,
        _time_budget: Duration,
    ) -> Result<Solution, EngineError> {
        panic!("engine exploded mid-solve");
    }
}

/// Sixteen stops around Memphis served by four vehicles from depot 0.
#[must_use]
pub fn sample_request() -> SolveRequest {
    let coordinates = [
        [35.0527, -89.8502],
        [35.0497, -89.9776],
        [35.1430, -90.0515],
        [35.1186, -89.9343],
        [35.1335, -89.9807],
        [35.1355, -90.0453],
        [35.1124, -89.9352],
        [35.1188, -90.0127],
        [35.1076, -89.9337],
        [35.1175, -89.9785],
        [35.1500, -89.9827],
        [35.1511, -90.0481],
        [35.1532, -90.0485],
        [35.0890, -89.8593],
        [35.1096, -89.8554],
        [35.1045, -89.8533],
    ]
    .into_iter()
    .map(Coordinate::from)
    .collect();
    SolveRequest {
        coordinates,
        demands: vec![0, 8, 9, 2, 4, 2, 4, 8, 8, 1, 2, 1, 2, 4, 4, 8],
        vehicle_capacities: vec![45, 55, 55, 55],
        vehicle_max_distances: vec![90_000, 80_000, 80_000, 70_000],
        pickups_deliveries: Some(vec![PickupDelivery::new(1, 6), PickupDelivery::new(2, 7)]),
        num_vehicles: 4,
        depot: Some(0),
        starts: vec![0; 4],
        ends: vec![0; 4],
    }
}

/// The sample request paired with `matrix`.
#[must_use]
pub fn sample_instance(matrix: DistanceMatrix) -> ProblemInstance {
    sample_request().into_instance(matrix)
}
