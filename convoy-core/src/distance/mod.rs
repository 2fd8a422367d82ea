//! Acquire pairwise travel costs for a list of coordinates.
//!
//! A [`DistanceProvider`] answers one batch of origins against a set of
//! destinations. The [`DistanceMatrixBuilder`] splits the origins into
//! batches small enough for the provider's per-call element limit and
//! stitches the rows back together in input order.

mod builder;
mod error;
mod provider;

pub use builder::{DEFAULT_MAX_ELEMENTS_PER_CALL, DistanceMatrixBuilder};
pub use error::DistanceMatrixError;
pub use provider::DistanceProvider;
