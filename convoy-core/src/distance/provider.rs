//! Provider trait answering one batch of origin rows.

use std::sync::Arc;

use crate::{Coordinate, DistanceMatrix};

use super::error::DistanceMatrixError;

/// Fetch travel costs from a batch of origins to a set of destinations.
///
/// Implementers must return exactly `origins.len()` rows, each holding
/// `destinations.len()` costs, where `rows[i][j]` is the cost from
/// `origins[i]` to `destinations[j]`. A missing or unusable element is a
/// hard error for the whole batch.
///
/// # Examples
///
/// ```rust
/// use convoy_core::{Coordinate, DistanceMatrix, DistanceMatrixError, DistanceProvider};
///
/// struct Flat;
///
/// impl DistanceProvider for Flat {
///     fn distance_rows(
///         &self,
///         origins: &[Coordinate],
///         destinations: &[Coordinate],
///     ) -> Result<DistanceMatrix, DistanceMatrixError> {
///         Ok(origins.iter().map(|_| vec![1; destinations.len()]).collect())
///     }
/// }
///
/// let stops = [Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)];
/// let rows = Flat.distance_rows(&stops[..1], &stops)?;
/// assert_eq!(rows, vec![vec![1, 1]]);
/// # Ok::<(), DistanceMatrixError>(())
/// ```
pub trait DistanceProvider {
    /// Return one row of costs per origin.
    fn distance_rows(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<DistanceMatrix, DistanceMatrixError>;
}

impl<P: DistanceProvider + ?Sized> DistanceProvider for &P {
    fn distance_rows(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<DistanceMatrix, DistanceMatrixError> {
        (**self).distance_rows(origins, destinations)
    }
}

impl<P: DistanceProvider + ?Sized> DistanceProvider for Box<P> {
    fn distance_rows(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<DistanceMatrix, DistanceMatrixError> {
        (**self).distance_rows(origins, destinations)
    }
}

impl<P: DistanceProvider + ?Sized> DistanceProvider for Arc<P> {
    fn distance_rows(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<DistanceMatrix, DistanceMatrixError> {
        (**self).distance_rows(origins, destinations)
    }
}
