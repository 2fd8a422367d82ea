//! Distance providers backing the Convoy distance matrix builder.
//!
//! Responsibilities:
//! - Speak to external distance-matrix services over HTTP.
//! - Offer an offline great-circle provider for keyless deployments.
//!
//! Boundaries:
//! - Batching and matrix assembly live in `convoy-core`; providers answer a
//!   single batch of origins.
//! - No routing rules live here.

pub mod routing;
