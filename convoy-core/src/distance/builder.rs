//! Batch origin rows so each provider call stays under its element limit.

use log::debug;

use crate::{Coordinate, DistanceMatrix};

use super::{error::DistanceMatrixError, provider::DistanceProvider};

/// Element limit used when none is configured.
pub const DEFAULT_MAX_ELEMENTS_PER_CALL: usize = 100;

/// Build a full `N×N` matrix from a provider with a per-call element cap.
///
/// Origins are split into consecutive batches of `max_elements / N` rows.
/// Each batch is queried against every coordinate and the returned rows are
/// appended in order, so row `i` of the result always belongs to
/// coordinate `i`.
///
/// # Examples
///
/// ```rust
/// use convoy_core::{Coordinate, DistanceMatrix, DistanceMatrixBuilder, DistanceMatrixError,
///     DistanceProvider};
///
/// struct Flat;
///
/// impl DistanceProvider for Flat {
///     fn distance_rows(
///         &self,
///         origins: &[Coordinate],
///         destinations: &[Coordinate],
///     ) -> Result<DistanceMatrix, DistanceMatrixError> {
///         Ok(origins.iter().map(|_| vec![7; destinations.len()]).collect())
///     }
/// }
///
/// let coordinates = vec![Coordinate::new(35.0, -89.9); 12];
/// let builder = DistanceMatrixBuilder::new(Flat).with_max_elements_per_call(50);
/// assert_eq!(builder.rows_per_call(coordinates.len())?, 4);
/// let matrix = builder.build(&coordinates)?;
/// assert_eq!(matrix.len(), 12);
/// # Ok::<(), DistanceMatrixError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DistanceMatrixBuilder<P> {
    provider: P,
    max_elements_per_call: usize,
}

impl<P: DistanceProvider> DistanceMatrixBuilder<P> {
    /// Wrap `provider` with the default element limit.
    pub const fn new(provider: P) -> Self {
        Self {
            provider,
            max_elements_per_call: DEFAULT_MAX_ELEMENTS_PER_CALL,
        }
    }

    /// Override the per-call element limit.
    #[must_use]
    pub const fn with_max_elements_per_call(mut self, max_elements: usize) -> Self {
        self.max_elements_per_call = max_elements;
        self
    }

    /// Configured per-call element limit.
    #[must_use]
    pub const fn max_elements_per_call(&self) -> usize {
        self.max_elements_per_call
    }

    /// Borrow the wrapped provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Number of origin rows that fit in one call for `locations` points.
    ///
    /// # Errors
    ///
    /// Returns [`DistanceMatrixError::EmptyInput`] for zero locations and
    /// [`DistanceMatrixError::ElementLimitExceeded`] when not even one row
    /// fits under the limit.
    pub fn rows_per_call(&self, locations: usize) -> Result<usize, DistanceMatrixError> {
        let rows = self
            .max_elements_per_call
            .checked_div(locations)
            .ok_or(DistanceMatrixError::EmptyInput)?;
        if rows == 0 {
            return Err(DistanceMatrixError::ElementLimitExceeded {
                locations,
                max_elements: self.max_elements_per_call,
            });
        }
        Ok(rows)
    }

    /// Build the matrix for `coordinates`.
    ///
    /// # Errors
    ///
    /// Propagates the first provider failure and returns
    /// [`DistanceMatrixError::MalformedResponse`] when a batch has the wrong
    /// number of rows or a row has the wrong number of elements.
    pub fn build(&self, coordinates: &[Coordinate]) -> Result<DistanceMatrix, DistanceMatrixError> {
        let n = coordinates.len();
        let rows_per_call = self.rows_per_call(n)?;
        let batches = n.div_ceil(rows_per_call);
        let mut matrix = Vec::with_capacity(n);

        for (batch_idx, origins) in coordinates.chunks(rows_per_call).enumerate() {
            debug!(
                "requesting distance batch {}/{batches} ({} origins x {n} destinations)",
                batch_idx.saturating_add(1),
                origins.len()
            );
            let rows = self.provider.distance_rows(origins, coordinates)?;
            if rows.len() != origins.len() {
                return Err(DistanceMatrixError::MalformedResponse {
                    message: format!(
                        "batch {batch_idx} returned {} rows for {} origins",
                        rows.len(),
                        origins.len()
                    ),
                });
            }
            for (offset, row) in rows.iter().enumerate() {
                if row.len() != n {
                    return Err(DistanceMatrixError::MalformedResponse {
                        message: format!(
                            "row {} has {} elements, expected {n}",
                            matrix.len().saturating_add(offset),
                            row.len()
                        ),
                    });
                }
            }
            matrix.extend(rows);
        }
        Ok(matrix)
    }
}
