//! Iterated local search driver.

use std::time::Instant;

use tracing::info;

use crate::evaluation::PenaltyManager;
use crate::models::Solution;
use crate::perturb::DestroyRepair;
use crate::search::LocalSearch;
use crate::{RandomNumberGenerator, SolverError};

use super::{AcceptanceCriterion, IlsParams, IterationStats, SolveResult, Statistics, StoppingCriterion};

/// Iterated local search: perturb the incumbent, improve the result, and
/// accept or reject it against a record-to-record style criterion.
///
/// Infeasible candidates are, with configurable probability, put through a
/// second local search under boosted penalties; acceptance always uses the
/// un-boosted penalised cost computed after that pass.
pub struct IteratedLocalSearch<'a> {
    penalty_manager: PenaltyManager,
    perturb: DestroyRepair<'a>,
    search: LocalSearch<'a>,
    accept: AcceptanceCriterion,
    params: IlsParams,
}

impl<'a> IteratedLocalSearch<'a> {
    /// Creates the driver.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidParameter`] when
    /// `repair_probability` lies outside `[0, 1]`.
    pub fn new(
        penalty_manager: PenaltyManager,
        perturb: DestroyRepair<'a>,
        search: LocalSearch<'a>,
        accept: AcceptanceCriterion,
        params: IlsParams,
    ) -> Result<Self, SolverError> {
        if !(0.0..=1.0).contains(&params.repair_probability) {
            return Err(SolverError::InvalidParameter(
                "repair_probability must be in [0, 1]".into(),
            ));
        }

        Ok(Self {
            penalty_manager,
            perturb,
            search,
            accept,
            params,
        })
    }

    /// Runs the search from the given initial solution until the stopping
    /// criterion fires.
    ///
    /// The result's best solution is the best feasible one found, or the
    /// best solution by penalised cost when no feasible solution was seen.
    pub fn run(
        &mut self,
        stop: &mut StoppingCriterion,
        initial: Solution,
        rng: &mut RandomNumberGenerator,
        collect_stats: bool,
    ) -> Result<SolveResult, SolverError> {
        let started = Instant::now();
        let mut stats = if collect_stats {
            Statistics::new()
        } else {
            Statistics::disabled()
        };

        let mut best = initial.clone();
        let mut current = initial;
        let mut best_feasible: Option<Solution> = best.is_feasible().then(|| best.clone());
        let mut iterations = 0;

        while !stop.should_stop(self.penalty_manager.cost_evaluator().penalised_cost(&best)) {
            iterations += 1;

            let eval = self.penalty_manager.cost_evaluator();
            let perturbed = self.perturb.perturb(&current, &eval, rng)?;
            let mut candidate = self.search.search(&perturbed, &eval, rng)?;
            self.penalty_manager.register(&candidate);

            let eval = self.penalty_manager.cost_evaluator();
            let mut candidate_cost = eval.penalised_cost(&candidate);
            let best_cost = eval.penalised_cost(&best);
            let current_cost = eval.penalised_cost(&current);

            let mut improved = candidate_cost < best_cost;

            if !improved
                && !candidate.is_feasible()
                && rng.rand() < self.params.repair_probability
            {
                let booster = self.penalty_manager.booster_cost_evaluator();
                candidate = self.search.search(&candidate, &booster, rng)?;
                self.penalty_manager.register(&candidate);

                candidate_cost = self
                    .penalty_manager
                    .cost_evaluator()
                    .penalised_cost(&candidate);
                improved = candidate_cost < best_cost;
            }

            if candidate.is_feasible()
                && best_feasible
                    .as_ref()
                    .is_none_or(|b| candidate_cost < eval.penalised_cost(b))
            {
                best_feasible = Some(candidate.clone());
            }

            if improved {
                info!(cost = candidate_cost, iterations, "new best solution");
                best = candidate.clone();
                current = candidate;
            } else if self.accept.accept(best_cost, current_cost, candidate_cost) {
                current = candidate;
            }

            stats.record(IterationStats {
                iteration: iterations,
                current_cost: eval.penalised_cost(&current),
                best_cost: best_cost.min(candidate_cost),
                num_feasible: 0,
                num_infeasible: 0,
                penalties: self.penalty_manager.penalties(),
                feasibility: self.penalty_manager.feasibility_fractions(),
            });
        }

        let result_best = match best_feasible {
            Some(feasible) => feasible,
            None => best,
        };

        Ok(SolveResult::new(
            result_best,
            started.elapsed(),
            iterations,
            stats,
        ))
    }
}
