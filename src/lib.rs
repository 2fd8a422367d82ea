//! Facade crate for the Convoy routing service.
//!
//! This crate re-exports the core domain types and exposes the solver and the
//! dispatch layer behind feature flags.

#![forbid(unsafe_code)]

pub use convoy_core::{
    Coordinate, DEFAULT_MAX_ELEMENTS_PER_CALL, DEFAULT_TIME_BUDGET, DistanceMatrix,
    DistanceMatrixBuilder, DistanceMatrixError, DistanceProvider, EngineError, FieldViolation,
    Job, JobOutcome, PickupDelivery, ProblemInstance, RouteResult, RoutingEngine, Solution,
    SolveRequest, SolveStatus, Stop, StopAction, TaskId, ValidationError,
};

#[cfg(feature = "solver")]
pub use convoy_solver::{CvrpSolver, SolverConfig};

#[cfg(feature = "dispatch")]
pub use convoy_dispatch::{
    DispatchConfig, Dispatcher, JobQueue, MemoryJobQueue, MemoryResultStore, ResultStore,
    SubmitError, Submission, WorkerPool, http,
};

#[cfg(feature = "redis")]
pub use convoy_dispatch::{RedisJobQueue, RedisResultStore};
