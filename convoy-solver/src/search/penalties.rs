//! Arc penalties for guided local search.

use crate::model::Model;
use crate::route::Route;

/// Penalty counters for every arc of the model.
#[derive(Debug, Clone)]
pub(crate) struct Penalties {
    size: usize,
    counts: Vec<i64>,
}

impl Penalties {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            size,
            counts: vec![0; size.saturating_mul(size)],
        }
    }

    pub(crate) fn get(&self, from: usize, to: usize) -> i64 {
        self.index(from, to)
            .and_then(|idx| self.counts.get(idx))
            .copied()
            .unwrap_or(0)
    }

    /// Penalise the arcs of `routes` with the highest utility.
    ///
    /// Utility is `distance / (1 + penalty)`; every arc sharing the maximum
    /// is penalised. Idle routes are skipped since no move can change them.
    /// Returns the number of arcs penalised.
    pub(crate) fn penalise(&mut self, model: &Model, routes: &[Route]) -> usize {
        let arcs: Vec<(usize, usize)> = routes
            .iter()
            .filter(|route| !route.is_empty())
            .flat_map(Route::arcs)
            .collect();

        let mut best: Option<(i64, i64)> = None;
        for (from, to) in &arcs {
            let candidate = (model.distance(*from, *to), self.get(*from, *to));
            if best.is_none_or(|current| utility_exceeds(candidate, current)) {
                best = Some(candidate);
            }
        }
        let Some(top) = best else {
            return 0;
        };

        let mut penalised = 0_usize;
        for (from, to) in arcs {
            let candidate = (model.distance(from, to), self.get(from, to));
            if utility_exceeds(top, candidate) {
                continue;
            }
            if let Some(count) = self.index(from, to).and_then(|idx| self.counts.get_mut(idx)) {
                *count = count.saturating_add(1);
                penalised = penalised.saturating_add(1);
            }
        }
        penalised
    }

    fn index(&self, from: usize, to: usize) -> Option<usize> {
        if from >= self.size || to >= self.size {
            return None;
        }
        from.checked_mul(self.size)?.checked_add(to)
    }
}

/// Whether `a` has strictly higher utility than `b`, both as
/// `(distance, penalty)`, compared without division.
fn utility_exceeds(a: (i64, i64), b: (i64, i64)) -> bool {
    let (a_cost, a_penalty) = a;
    let (b_cost, b_penalty) = b;
    let lhs = i128::from(a_cost).saturating_mul(i128::from(b_penalty).saturating_add(1));
    let rhs = i128::from(b_cost).saturating_mul(i128::from(a_penalty).saturating_add(1));
    lhs > rhs
}
