//! Distance providers for distance-matrix services and offline use.
//!
//! This module provides [`HttpDistanceProvider`], an implementation of
//! [`convoy_core::DistanceProvider`] that fetches rows from a
//! Distance-Matrix style HTTP service, and [`HaversineDistanceProvider`],
//! which computes great-circle distances locally.
//!
//! # Architecture
//!
//! Providers answer a single batch of origins against a set of
//! destinations. Splitting a request under the service's element limit is
//! the job of [`convoy_core::DistanceMatrixBuilder`];
//! [`HttpDistanceProvider::into_matrix_builder`] wires the configured limit
//! through.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use convoy_core::Coordinate;
//! use convoy_data::routing::{HttpDistanceProvider, HttpDistanceProviderConfig};
//!
//! let config = HttpDistanceProviderConfig::new("http://localhost:8080/distancematrix/json")
//!     .with_timeout(Duration::from_secs(60))
//!     .with_user_agent("my-app/1.0");
//! let builder = HttpDistanceProvider::with_config(config)?.into_matrix_builder();
//!
//! let matrix = builder.build(&[
//!     Coordinate::new(51.5, -0.1),
//!     Coordinate::new(51.6, -0.2),
//! ])?;
//! println!("Distance: {}m", matrix[0][1]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod google;
mod haversine;
mod provider;

#[doc(hidden)]
pub mod test_support;

pub use haversine::{EARTH_RADIUS_METRES, HaversineDistanceProvider};
pub use provider::{
    DEFAULT_BASE_URL, DEFAULT_USER_AGENT, HttpDistanceProvider, HttpDistanceProviderConfig,
    ProviderBuildError,
};
