//! Native routing engine for Convoy.
//!
//! This crate provides [`CvrpSolver`], the default implementation of the
//! [`RoutingEngine`](convoy_core::RoutingEngine) trait. It solves capacitated
//! vehicle routing with pickup-delivery pairs, per-vehicle distance caps and
//! per-vehicle start and end nodes.
//!
//! The search has two phases. Parallel cheapest insertion builds a feasible
//! assignment. Stops the greedy order strands are repaired by ejecting a
//! routed stop to make room. Demand-ordered and seeded insertion orders back
//! that up, and small instances fall back to a bounded exhaustive walk.
//! Guided local search then improves the assignment with relocation,
//! exchange, 2-opt and or-opt moves until the time budget expires or the
//! search stops finding better assignments. Instances without a feasible
//! assignment yield [`Solution::infeasible`](convoy_core::Solution::infeasible).

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod construction;
mod format;
mod model;
mod route;
mod search;
mod solver;

#[doc(hidden)]
pub mod test_support;

pub use solver::{CvrpSolver, SolverConfig};
