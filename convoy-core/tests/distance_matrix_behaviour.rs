//! Behavioural tests for `DistanceMatrixBuilder` batching.

use std::cell::{Cell, RefCell};

use convoy_core::{
    Coordinate, DistanceMatrix, DistanceMatrixBuilder, DistanceMatrixError, DistanceProvider,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

/// Costs encode the origin and destination rows: `from * 100 + to`.
#[derive(Debug, Default)]
struct IndexedProvider {
    coordinates: Vec<Coordinate>,
    calls: Cell<usize>,
    short_rows: bool,
}

impl IndexedProvider {
    fn index(&self, coordinate: &Coordinate) -> Result<u64, DistanceMatrixError> {
        self.coordinates
            .iter()
            .position(|known| known == coordinate)
            .and_then(|idx| u64::try_from(idx).ok())
            .ok_or_else(|| DistanceMatrixError::MalformedResponse {
                message: "unknown coordinate".to_owned(),
            })
    }
}

impl DistanceProvider for IndexedProvider {
    fn distance_rows(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<DistanceMatrix, DistanceMatrixError> {
        self.calls.set(self.calls.get() + 1);
        let take = if self.short_rows {
            destinations.len() - 1
        } else {
            destinations.len()
        };
        origins
            .iter()
            .map(|origin| {
                let from = self.index(origin)?;
                destinations
                    .iter()
                    .take(take)
                    .map(|destination| Ok(from * 100 + self.index(destination)?))
                    .collect()
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct MatrixWorld {
    coordinates: RefCell<Vec<Coordinate>>,
    max_elements: Cell<usize>,
    short_rows: Cell<bool>,
    calls: Cell<usize>,
    outcome: RefCell<Option<Result<DistanceMatrix, DistanceMatrixError>>>,
}

impl MatrixWorld {
    #[expect(
        clippy::expect_used,
        reason = "behaviour tests use expect for readable failures"
    )]
    fn expect_outcome(&self) -> Result<DistanceMatrix, DistanceMatrixError> {
        self.outcome
            .borrow()
            .clone()
            .expect("outcome should be recorded before assertions")
    }
}

#[fixture]
fn world() -> MatrixWorld {
    MatrixWorld::default()
}

#[given("five coordinates along a meridian")]
fn given_coordinates(world: &MatrixWorld) {
    let coordinates = [35.00, 35.01, 35.02, 35.03, 35.04]
        .into_iter()
        .map(|lat| Coordinate::new(lat, -90.0))
        .collect();
    world.coordinates.replace(coordinates);
    world.max_elements.set(100);
}

#[given("a provider allowing {limit} elements per call")]
fn given_limit(world: &MatrixWorld, limit: usize) {
    world.max_elements.set(limit);
}

#[given("a provider returning short rows")]
fn given_short_rows(world: &MatrixWorld) {
    world.short_rows.set(true);
}

#[when("the distance matrix is built")]
fn when_built(world: &MatrixWorld) {
    let coordinates = world.coordinates.borrow().clone();
    let provider = IndexedProvider {
        coordinates: coordinates.clone(),
        calls: Cell::new(0),
        short_rows: world.short_rows.get(),
    };
    let outcome = DistanceMatrixBuilder::new(&provider)
        .with_max_elements_per_call(world.max_elements.get())
        .build(&coordinates);
    world.calls.set(provider.calls.get());
    world.outcome.replace(Some(outcome));
}

#[then("a 5x5 matrix is returned in coordinate order")]
#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
fn then_matrix(world: &MatrixWorld) {
    let matrix = world.expect_outcome().expect("expected a matrix");
    assert_eq!(matrix.len(), 5);
    for (i, row) in matrix.iter().enumerate() {
        let expected: Vec<u64> = (0..5_u64).map(|j| i as u64 * 100 + j).collect();
        assert_eq!(row, &expected);
    }
}

#[then("the provider was called {count} times")]
fn then_calls(world: &MatrixWorld, count: usize) {
    assert_eq!(world.calls.get(), count);
}

#[then("the build fails because the element limit is exceeded")]
#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
fn then_limit_exceeded(world: &MatrixWorld) {
    let err = world.expect_outcome().expect_err("expected a limit error");
    assert!(matches!(err, DistanceMatrixError::ElementLimitExceeded { .. }));
    assert_eq!(world.calls.get(), 0);
}

#[then("the build fails with a malformed response")]
#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
fn then_malformed(world: &MatrixWorld) {
    let err = world.expect_outcome().expect_err("expected a malformed response");
    assert!(err.is_malformed());
}

#[scenario(path = "tests/features/distance_matrix.feature", index = 0)]
fn rows_are_batched(world: MatrixWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/distance_matrix.feature", index = 1)]
fn limit_exceeded(world: MatrixWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/distance_matrix.feature", index = 2)]
fn short_row(world: MatrixWorld) {
    let _ = world;
}
