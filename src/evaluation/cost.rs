//! Penalised cost evaluation.

use crate::models::Solution;

/// Evaluates solutions under a fixed set of penalty multipliers.
///
/// The penalised cost of a solution is its distance plus fixed vehicle
/// costs, uncollected prizes, and a weighted penalty for every unit of
/// load, time-window, distance, and duration violation. The evaluator is
/// pure: the same solution and multipliers always produce the same cost.
///
/// Running sums saturate at `i64::MAX`; a saturated cost compares strictly
/// worse than any finite cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEvaluator {
    load_penalty: f64,
    tw_penalty: f64,
    dist_penalty: f64,
    dur_penalty: f64,
}

impl CostEvaluator {
    /// Creates an evaluator with the given penalty multipliers.
    pub fn new(load_penalty: f64, tw_penalty: f64, dist_penalty: f64, dur_penalty: f64) -> Self {
        Self {
            load_penalty,
            tw_penalty,
            dist_penalty,
            dur_penalty,
        }
    }

    /// Penalty for the given load excess.
    #[inline]
    pub fn load_penalty(&self, excess: i64) -> i64 {
        scale(excess, self.load_penalty)
    }

    /// Penalty for the given time warp.
    #[inline]
    pub fn tw_penalty(&self, time_warp: i64) -> i64 {
        scale(time_warp, self.tw_penalty)
    }

    /// Penalty for the given distance excess.
    #[inline]
    pub fn dist_penalty(&self, excess: i64) -> i64 {
        scale(excess, self.dist_penalty)
    }

    /// Penalty for the given duration excess.
    #[inline]
    pub fn dur_penalty(&self, excess: i64) -> i64 {
        scale(excess, self.dur_penalty)
    }

    /// Penalised cost: distance, fixed vehicle costs, uncollected prizes,
    /// and all constraint violation penalties.
    pub fn penalised_cost(&self, solution: &Solution) -> i64 {
        solution
            .distance()
            .saturating_add(solution.fixed_cost())
            .saturating_add(solution.uncollected_prizes())
            .saturating_add(self.load_penalty(solution.excess_load()))
            .saturating_add(self.tw_penalty(solution.time_warp()))
            .saturating_add(self.dist_penalty(solution.excess_distance()))
            .saturating_add(self.dur_penalty(solution.excess_duration()))
    }

    /// Feasible-only cost: the penalised cost for feasible solutions,
    /// `i64::MAX` otherwise.
    pub fn cost(&self, solution: &Solution) -> i64 {
        if solution.is_feasible() {
            self.penalised_cost(solution)
        } else {
            i64::MAX
        }
    }
}

#[inline]
fn scale(value: i64, penalty: f64) -> i64 {
    if value == 0 {
        return 0;
    }
    let scaled = value as f64 * penalty;
    if scaled >= i64::MAX as f64 {
        i64::MAX
    } else {
        scaled.round() as i64
    }
}
