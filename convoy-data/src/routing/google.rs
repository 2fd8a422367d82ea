//! Response types for the Google-style Distance Matrix JSON API.
//!
//! See: <https://developers.google.com/maps/documentation/distance-matrix/distance-matrix>

use serde::Deserialize;

/// Top-level Distance Matrix response.
///
/// `status` reports whether the request as a whole succeeded; each element
/// carries its own status for the origin/destination pair it describes.
#[derive(Debug, Deserialize)]
pub struct MatrixResponse {
    /// Request-level status, `"OK"` on success.
    pub status: String,

    /// Explanation supplied with a non-`"OK"` status.
    #[serde(default)]
    pub error_message: Option<String>,

    /// One row per origin, in request order.
    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

impl MatrixResponse {
    /// Check if the request-level status indicates success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }
}

/// Costs from one origin to every destination.
#[derive(Debug, Deserialize)]
pub struct MatrixRow {
    /// One element per destination, in request order.
    pub elements: Vec<MatrixElement>,
}

/// A single origin/destination pair.
#[derive(Debug, Deserialize)]
pub struct MatrixElement {
    /// Element-level status, e.g. `"OK"` or `"ZERO_RESULTS"`.
    #[serde(default)]
    pub status: Option<String>,

    /// Travel distance; absent when no route was found.
    #[serde(default)]
    pub distance: Option<Measured>,
}

/// A measured quantity with its display text.
#[derive(Debug, Deserialize)]
pub struct Measured {
    /// Value in the API's base unit (metres for distance).
    pub value: u64,
}
