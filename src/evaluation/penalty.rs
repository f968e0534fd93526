//! Adaptive penalty management.

use serde::Deserialize;
use tracing::debug;

use crate::models::Solution;
use crate::SolverError;

use super::CostEvaluator;

/// Parameters controlling penalty adaptation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PenaltyParams {
    /// Initial load penalty multiplier.
    pub init_load_penalty: f64,
    /// Initial time-warp penalty multiplier.
    pub init_tw_penalty: f64,
    /// Initial distance penalty multiplier.
    pub init_dist_penalty: f64,
    /// Initial duration penalty multiplier.
    pub init_dur_penalty: f64,
    /// Multiplier applied when too few recent solutions are feasible (> 1).
    pub penalty_increase: f64,
    /// Multiplier applied when enough recent solutions are feasible (< 1).
    pub penalty_decrease: f64,
    /// Target fraction of feasible solutions per dimension.
    pub target_feasible: f64,
    /// Number of registered solutions per adaptation step.
    pub solutions_between_updates: usize,
    /// Factor boosting all multipliers in the repair evaluator.
    pub repair_booster: f64,
    /// Lower clamp for each multiplier.
    pub min_penalty: f64,
    /// Upper clamp for each multiplier.
    pub max_penalty: f64,
}

impl Default for PenaltyParams {
    fn default() -> Self {
        Self {
            init_load_penalty: 20.0,
            init_tw_penalty: 6.0,
            init_dist_penalty: 6.0,
            init_dur_penalty: 6.0,
            penalty_increase: 1.34,
            penalty_decrease: 0.32,
            target_feasible: 0.43,
            solutions_between_updates: 100,
            repair_booster: 12.0,
            min_penalty: 0.1,
            max_penalty: 100_000.0,
        }
    }
}

impl PenaltyParams {
    fn validate(&self) -> Result<(), SolverError> {
        if self.penalty_increase < 1.0 {
            return Err(SolverError::InvalidParameter(
                "penalty_increase must be >= 1".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.penalty_decrease) {
            return Err(SolverError::InvalidParameter(
                "penalty_decrease must be in [0, 1]".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.target_feasible) {
            return Err(SolverError::InvalidParameter(
                "target_feasible must be in [0, 1]".into(),
            ));
        }

        if self.solutions_between_updates == 0 {
            return Err(SolverError::InvalidParameter(
                "solutions_between_updates must be positive".into(),
            ));
        }

        if self.repair_booster < 1.0 {
            return Err(SolverError::InvalidParameter(
                "repair_booster must be >= 1".into(),
            ));
        }

        let inits = [
            self.init_load_penalty,
            self.init_tw_penalty,
            self.init_dist_penalty,
            self.init_dur_penalty,
        ];
        if self.min_penalty <= 0.0
            || self.max_penalty < self.min_penalty
            || inits.iter().any(|&p| p <= 0.0)
        {
            return Err(SolverError::InvalidParameter(
                "penalty multipliers and bounds must be strictly positive".into(),
            ));
        }

        Ok(())
    }
}

/// Penalty dimensions tracked by the manager.
const LOAD: usize = 0;
const TIME_WARP: usize = 1;
const DISTANCE: usize = 2;
const DURATION: usize = 3;

/// Tracks per-dimension feasibility of recent solutions and adapts the
/// penalty multipliers to steer the search along the feasibility frontier.
///
/// Every `solutions_between_updates` registered solutions, each dimension's
/// multiplier is decreased when at least `target_feasible` of the window
/// was feasible in that dimension and increased otherwise, then clamped
/// into `[min_penalty, max_penalty]`. Bounded multipliers keep infeasible
/// solutions reachable without letting penalties diverge.
#[derive(Debug, Clone)]
pub struct PenaltyManager {
    params: PenaltyParams,
    penalties: [f64; 4],
    window: [Vec<bool>; 4],
}

impl PenaltyManager {
    /// Creates a penalty manager.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidParameter`] when any parameter is
    /// outside its documented domain.
    pub fn new(params: PenaltyParams) -> Result<Self, SolverError> {
        params.validate()?;

        let penalties = [
            params.init_load_penalty,
            params.init_tw_penalty,
            params.init_dist_penalty,
            params.init_dur_penalty,
        ];

        Ok(Self {
            params,
            penalties,
            window: Default::default(),
        })
    }

    /// Registers a solution's per-dimension feasibility.
    pub fn register(&mut self, solution: &Solution) {
        let flags = [
            solution.excess_load() == 0,
            solution.time_warp() == 0,
            solution.excess_distance() == 0,
            solution.excess_duration() == 0,
        ];

        for (dim, feasible) in flags.into_iter().enumerate() {
            self.window[dim].push(feasible);

            if self.window[dim].len() >= self.params.solutions_between_updates {
                self.adapt(dim);
                self.window[dim].clear();
            }
        }
    }

    fn adapt(&mut self, dim: usize) {
        let window = &self.window[dim];
        let feasible = window.iter().filter(|&&f| f).count();
        let fraction = feasible as f64 / window.len() as f64;

        let factor = if fraction >= self.params.target_feasible {
            self.params.penalty_decrease
        } else {
            self.params.penalty_increase
        };

        let old = self.penalties[dim];
        self.penalties[dim] =
            (old * factor).clamp(self.params.min_penalty, self.params.max_penalty);

        debug!(
            dim,
            fraction,
            old,
            new = self.penalties[dim],
            "penalty update"
        );
    }

    /// Evaluator under the current multipliers.
    pub fn cost_evaluator(&self) -> CostEvaluator {
        CostEvaluator::new(
            self.penalties[LOAD],
            self.penalties[TIME_WARP],
            self.penalties[DISTANCE],
            self.penalties[DURATION],
        )
    }

    /// Evaluator with all multipliers boosted, used when repairing
    /// infeasible candidates.
    pub fn booster_cost_evaluator(&self) -> CostEvaluator {
        let b = self.params.repair_booster;
        CostEvaluator::new(
            (self.penalties[LOAD] * b).min(self.params.max_penalty),
            (self.penalties[TIME_WARP] * b).min(self.params.max_penalty),
            (self.penalties[DISTANCE] * b).min(self.params.max_penalty),
            (self.penalties[DURATION] * b).min(self.params.max_penalty),
        )
    }

    /// Current multipliers as `[load, time_warp, distance, duration]`.
    pub fn penalties(&self) -> [f64; 4] {
        self.penalties
    }

    /// Fraction of feasible registrations per dimension in the window
    /// currently being filled.
    pub fn feasibility_fractions(&self) -> [f64; 4] {
        let mut fractions = [0.0; 4];
        for dim in 0..4 {
            let window = &self.window[dim];
            if !window.is_empty() {
                fractions[dim] =
                    window.iter().filter(|&&f| f).count() as f64 / window.len() as f64;
            }
        }
        fractions
    }
}
