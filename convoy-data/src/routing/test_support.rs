//! Test utilities for distance providers.
//!
//! This module provides [`StubDistanceProvider`], a deterministic test double
//! for [`DistanceProvider`] that returns pre-configured responses without
//! making HTTP requests.

use convoy_core::{Coordinate, DistanceMatrix, DistanceMatrixError, DistanceProvider};

/// Stub `DistanceProvider` for testing.
///
/// Each call answers with the rows of the configured matrix that belong to
/// the requested origins, identified by their position in the coordinate
/// list the stub was built with, or with the configured error.
///
/// # Example
///
/// ```
/// use convoy_core::{Coordinate, DistanceMatrixBuilder};
/// use convoy_data::routing::test_support::StubDistanceProvider;
///
/// let stops = vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)];
/// let provider = StubDistanceProvider::with_matrix(stops.clone(), vec![vec![0, 60], vec![60, 0]]);
///
/// let matrix = DistanceMatrixBuilder::new(provider).build(&stops);
/// assert_eq!(matrix.ok(), Some(vec![vec![0, 60], vec![60, 0]]));
/// ```
#[derive(Debug, Clone)]
pub struct StubDistanceProvider {
    response: StubResponse,
}

#[derive(Debug, Clone)]
enum StubResponse {
    Matrix {
        coordinates: Vec<Coordinate>,
        matrix: DistanceMatrix,
    },
    Error(DistanceMatrixError),
}

impl StubDistanceProvider {
    /// Answer from `matrix`, whose row `i` belongs to `coordinates[i]`.
    #[must_use]
    pub const fn with_matrix(coordinates: Vec<Coordinate>, matrix: DistanceMatrix) -> Self {
        Self {
            response: StubResponse::Matrix {
                coordinates,
                matrix,
            },
        }
    }

    /// Create a provider that returns the given error.
    ///
    /// Empty input still returns `DistanceMatrixError::EmptyInput`.
    #[must_use]
    pub const fn with_error(error: DistanceMatrixError) -> Self {
        Self {
            response: StubResponse::Error(error),
        }
    }

    /// Create a provider over `coordinates` with zero on the diagonal and
    /// one metre everywhere else.
    #[must_use]
    pub fn with_unit_matrix(coordinates: Vec<Coordinate>) -> Self {
        let size = coordinates.len();
        Self::with_matrix(coordinates, build_unit_matrix(size))
    }
}

/// Build a unit matrix of the given size.
fn build_unit_matrix(size: usize) -> DistanceMatrix {
    (0..size)
        .map(|i| (0..size).map(|j| u64::from(i != j)).collect())
        .collect()
}

fn lookup_row(
    coordinates: &[Coordinate],
    matrix: &DistanceMatrix,
    origin: &Coordinate,
) -> Result<Vec<u64>, DistanceMatrixError> {
    coordinates
        .iter()
        .position(|known| known == origin)
        .and_then(|idx| matrix.get(idx))
        .cloned()
        .ok_or_else(|| DistanceMatrixError::MalformedResponse {
            message: format!("no stubbed row for {}", origin.to_query_value()),
        })
}

impl DistanceProvider for StubDistanceProvider {
    fn distance_rows(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<DistanceMatrix, DistanceMatrixError> {
        if origins.is_empty() || destinations.is_empty() {
            return Err(DistanceMatrixError::EmptyInput);
        }

        match &self.response {
            StubResponse::Matrix {
                coordinates,
                matrix,
            } => origins
                .iter()
                .map(|origin| lookup_row(coordinates, matrix, origin))
                .collect(),
            StubResponse::Error(error) => Err(error.clone()),
        }
    }
}
