//! Offline great-circle distances.

use convoy_core::{Coordinate, DistanceMatrix, DistanceMatrixError, DistanceProvider};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_METRES: f64 = 6_371_008.8;

/// `DistanceProvider` returning straight-line haversine distances in metres.
///
/// Useful when no distance service is configured and in tests. Costs are
/// rounded to the nearest metre and are symmetric.
///
/// # Examples
///
/// ```
/// use convoy_core::{Coordinate, DistanceMatrixBuilder};
/// use convoy_data::routing::HaversineDistanceProvider;
///
/// let builder = DistanceMatrixBuilder::new(HaversineDistanceProvider::default());
/// let matrix = builder.build(&[Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0)])?;
/// assert_eq!(matrix[0][0], 0);
/// assert_eq!(matrix[0][1], 111_195);
/// # Ok::<(), convoy_core::DistanceMatrixError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HaversineDistanceProvider {
    radius_metres: f64,
}

impl Default for HaversineDistanceProvider {
    fn default() -> Self {
        Self {
            radius_metres: EARTH_RADIUS_METRES,
        }
    }
}

impl HaversineDistanceProvider {
    /// Use a sphere of `radius_metres` instead of the mean Earth radius.
    #[must_use]
    pub const fn with_radius(radius_metres: f64) -> Self {
        Self { radius_metres }
    }

    /// Great-circle distance between two points, in metres.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "haversine formula requires float maths"
    )]
    pub fn distance_metres(&self, from: &Coordinate, to: &Coordinate) -> f64 {
        let lat1 = from.lat.to_radians();
        let lat2 = to.lat.to_radians();
        let d_lat = lat2 - lat1;
        let d_lng = (to.lng - from.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        self.radius_metres * c
    }

    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "distances are finite, non-negative and far below u64::MAX"
    )]
    fn rounded(&self, from: &Coordinate, to: &Coordinate) -> Result<u64, DistanceMatrixError> {
        let metres = self.distance_metres(from, to);
        if !metres.is_finite() || metres < 0.0 {
            return Err(DistanceMatrixError::MalformedResponse {
                message: format!(
                    "no distance between {} and {}",
                    from.to_query_value(),
                    to.to_query_value()
                ),
            });
        }
        Ok(metres.round() as u64)
    }
}

impl DistanceProvider for HaversineDistanceProvider {
    fn distance_rows(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<DistanceMatrix, DistanceMatrixError> {
        if origins.is_empty() || destinations.is_empty() {
            return Err(DistanceMatrixError::EmptyInput);
        }
        origins
            .iter()
            .map(|origin| {
                destinations
                    .iter()
                    .map(|destination| self.rounded(origin, destination))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0), 111_195)]
    #[case(Coordinate::new(35.0527, -89.8502), Coordinate::new(35.0497, -89.9776), 11_602)]
    #[case(Coordinate::new(51.5, -0.1), Coordinate::new(51.5, -0.1), 0)]
    fn rounds_to_metres(#[case] from: Coordinate, #[case] to: Coordinate, #[case] expected: u64) {
        let provider = HaversineDistanceProvider::default();
        let rows = provider.distance_rows(&[from], &[to]).expect("distance");
        assert_eq!(rows, vec![vec![expected]]);
    }

    #[rstest]
    fn distances_are_symmetric() {
        let provider = HaversineDistanceProvider::default();
        let a = Coordinate::new(35.143, -90.0515);
        let b = Coordinate::new(35.1096, -89.8554);
        let rows = provider.distance_rows(&[a, b], &[a, b]).expect("distance");
        assert_eq!(rows[0][1], rows[1][0]);
        assert_eq!(rows[0][0], 0);
    }

    #[rstest]
    fn non_finite_radius_is_malformed() {
        let provider = HaversineDistanceProvider::with_radius(f64::NAN);
        let err = provider
            .distance_rows(&[Coordinate::new(0.0, 0.0)], &[Coordinate::new(1.0, 1.0)])
            .expect_err("nan radius");
        assert!(err.is_malformed());
    }
}
