//! Core domain types for the Convoy routing service.
//!
//! The crate holds the data model shared by every other crate: submission
//! requests, problem instances, solutions, queued jobs and their outcomes.
//! It also defines the two seams the service is assembled from:
//!
//! - [`DistanceProvider`], wrapped by [`DistanceMatrixBuilder`] to turn
//!   coordinates into a cost matrix under a per-call element limit.
//! - [`RoutingEngine`], which turns a [`ProblemInstance`] into a
//!   [`Solution`] within a time budget.
//!
//! Inputs are checked up front; [`SolveRequest::validate`] and
//! [`ProblemInstance::validate`] report every violated field at once.

#![cfg_attr(docsrs, feature(doc_cfg))]

mod coordinate;
pub mod distance;
mod engine;
mod job;
mod problem;
mod request;
mod solution;
mod validation;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use coordinate::Coordinate;
pub use distance::{
    DEFAULT_MAX_ELEMENTS_PER_CALL, DistanceMatrixBuilder, DistanceMatrixError, DistanceProvider,
};
pub use engine::{DEFAULT_TIME_BUDGET, EngineError, RoutingEngine};
pub use job::{Job, JobOutcome, RESULT_KEY_PREFIX, TaskId};
pub use problem::{DistanceMatrix, PickupDelivery, ProblemInstance};
pub use request::SolveRequest;
pub use solution::{RouteResult, Solution, SolveStatus, Stop, StopAction};
pub use validation::{FieldViolation, ValidationError};
