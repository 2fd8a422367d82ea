//! `CvrpSolver`: construction followed by guided local search.

use std::time::{Duration, Instant};

use convoy_core::{DEFAULT_TIME_BUDGET, EngineError, ProblemInstance, RoutingEngine, Solution};
use log::{debug, info};

use crate::construction::construct;
use crate::format::to_solution;
use crate::model::Model;
use crate::search::{Deadline, SearchLimits, improve, total_distance};

/// Configuration for [`CvrpSolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Budget used by [`CvrpSolver::solve_with_default_budget`].
    pub time_budget: Duration,
    /// Guided-search iterations allowed without a new best before stopping.
    pub max_stalled_iterations: usize,
    /// Penalty weight as a percentage of the mean arc cost.
    pub penalty_percent: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_budget: DEFAULT_TIME_BUDGET,
            max_stalled_iterations: 200,
            penalty_percent: 10,
        }
    }
}

impl SolverConfig {
    /// Set the default search budget.
    #[must_use]
    pub const fn with_time_budget(mut self, time_budget: Duration) -> Self {
        self.time_budget = time_budget;
        self
    }

    /// Set the stall cutoff.
    #[must_use]
    pub const fn with_max_stalled_iterations(mut self, iterations: usize) -> Self {
        self.max_stalled_iterations = iterations;
        self
    }

    /// Set the guided-penalty weight.
    #[must_use]
    pub const fn with_penalty_percent(mut self, percent: u32) -> Self {
        self.penalty_percent = percent;
        self
    }
}

/// Native capacitated vehicle-routing engine with pickup-delivery pairs.
///
/// Units are placed by parallel cheapest insertion with ejection repair,
/// then improved with relocation, exchange, 2-opt and or-opt moves under
/// guided local search until the budget runs out or the search stalls. The search is
/// deterministic for a given instance when it stops on the stall cutoff.
///
/// # Examples
/// ```
/// use std::time::Duration;
///
/// use convoy_core::{ProblemInstance, RoutingEngine};
/// use convoy_solver::CvrpSolver;
///
/// let instance = ProblemInstance {
///     distance_matrix: vec![vec![0, 5, 7], vec![5, 0, 3], vec![7, 3, 0]],
///     demands: vec![0, 1, 1],
///     vehicle_capacities: vec![2],
///     vehicle_max_distances: vec![100],
///     pickups_deliveries: Vec::new(),
///     num_vehicles: 1,
///     depot: 0,
///     starts: vec![0],
///     ends: vec![0],
/// };
/// let solution = CvrpSolver::new().solve(&instance, Duration::from_secs(1))?;
/// assert!(solution.is_found());
/// assert_eq!(solution.objective, 15);
/// # Ok::<(), convoy_core::EngineError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct CvrpSolver {
    config: SolverConfig,
}

impl CvrpSolver {
    /// Construct a solver using default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a solver with explicit configuration.
    #[must_use]
    pub const fn with_config(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve within the configured time budget.
    ///
    /// # Errors
    ///
    /// See [`RoutingEngine::solve`].
    pub fn solve_with_default_budget(
        &self,
        instance: &ProblemInstance,
    ) -> Result<Solution, EngineError> {
        self.solve(instance, self.config.time_budget)
    }
}

impl RoutingEngine for CvrpSolver {
    fn solve(
        &self,
        instance: &ProblemInstance,
        time_budget: Duration,
    ) -> Result<Solution, EngineError> {
        let started_at = Instant::now();
        let deadline = Deadline::after(time_budget);
        let model = Model::new(instance)?;
        info!(
            "solving {} stops with {} vehicles (budget {time_budget:?})",
            model.visit_count(),
            model.vehicles().len()
        );

        let Some(initial) = construct(&model) else {
            info!("no feasible assignment found");
            return Ok(Solution::infeasible());
        };
        debug!("construction distance {}", total_distance(&initial));

        let outcome = improve(
            &model,
            initial,
            &SearchLimits {
                deadline,
                max_stalled_iterations: self.config.max_stalled_iterations,
                penalty_percent: self.config.penalty_percent,
            },
        );
        let solution = to_solution(&model, &outcome.routes);
        info!(
            "solved: distance {} after {} search iterations in {:?}",
            outcome.cost,
            outcome.iterations,
            started_at.elapsed()
        );
        Ok(solution)
    }
}
