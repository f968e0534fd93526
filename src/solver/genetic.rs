//! Genetic driver.

use std::time::Instant;

use tracing::info;

use crate::crossover::{heterogeneous_selective_route_exchange, selective_route_exchange};
use crate::evaluation::PenaltyManager;
use crate::models::{ProblemData, Solution};
use crate::population::Population;
use crate::search::LocalSearch;
use crate::{RandomNumberGenerator, SolverError};

use super::{GeneticParams, IterationStats, SolveResult, Statistics, StoppingCriterion};

/// Population-based genetic search: select two parents, recombine them
/// with selective route exchange, improve the offspring with local
/// search, and insert it back into the population.
///
/// Same loop shape as the iterated local search driver, with crossover
/// in place of destroy/repair and the population in place of a single
/// incumbent.
pub struct GeneticAlgorithm<'a> {
    data: &'a ProblemData,
    penalty_manager: PenaltyManager,
    population: Population<'a>,
    search: LocalSearch<'a>,
    params: GeneticParams,
}

impl<'a> GeneticAlgorithm<'a> {
    /// Creates the driver.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidParameter`] when
    /// `repair_probability` lies outside `[0, 1]`.
    pub fn new(
        data: &'a ProblemData,
        penalty_manager: PenaltyManager,
        population: Population<'a>,
        search: LocalSearch<'a>,
        params: GeneticParams,
    ) -> Result<Self, SolverError> {
        if !(0.0..=1.0).contains(&params.repair_probability) {
            return Err(SolverError::InvalidParameter(
                "repair_probability must be in [0, 1]".into(),
            ));
        }

        Ok(Self {
            data,
            penalty_manager,
            population,
            search,
            params,
        })
    }

    /// Runs the search until the stopping criterion fires.
    ///
    /// Initial solutions seed the population after a local-search pass.
    /// The result's best solution is the population's best feasible one,
    /// or the best by penalised cost when no feasible solution was seen.
    pub fn run(
        &mut self,
        stop: &mut StoppingCriterion,
        initial: Vec<Solution>,
        rng: &mut RandomNumberGenerator,
        collect_stats: bool,
    ) -> Result<SolveResult, SolverError> {
        let started = Instant::now();
        let mut stats = if collect_stats {
            Statistics::new()
        } else {
            Statistics::disabled()
        };

        let mut best_any: Option<(i64, Solution)> = None;

        for seed_solution in initial {
            let eval = self.penalty_manager.cost_evaluator();
            let improved = self.search.search(&seed_solution, &eval, rng)?;
            self.penalty_manager.register(&improved);
            track_best(&mut best_any, eval.penalised_cost(&improved), &improved);
            self.population.add(improved, &eval);
        }

        let mut iterations = 0;

        while !stop.should_stop(self.best_cost(&best_any)) {
            iterations += 1;

            let eval = self.penalty_manager.cost_evaluator();
            let (first, second) = self.population.select(rng)?;

            let offspring = if self.data.num_vehicle_types() > 1 {
                heterogeneous_selective_route_exchange((&first, &second), self.data, &eval, rng)?
            } else {
                selective_route_exchange((&first, &second), self.data, &eval, rng)?
            };

            let mut candidate = self.search.search(&offspring, &eval, rng)?;
            self.penalty_manager.register(&candidate);

            let eval = self.penalty_manager.cost_evaluator();
            track_best(&mut best_any, eval.penalised_cost(&candidate), &candidate);
            self.population.add(candidate.clone(), &eval);

            if !candidate.is_feasible() && rng.rand() < self.params.repair_probability {
                let booster = self.penalty_manager.booster_cost_evaluator();
                candidate = self.search.search(&candidate, &booster, rng)?;
                self.penalty_manager.register(&candidate);

                let eval = self.penalty_manager.cost_evaluator();
                track_best(&mut best_any, eval.penalised_cost(&candidate), &candidate);
                self.population.add(candidate.clone(), &eval);
            }

            let eval = self.penalty_manager.cost_evaluator();
            stats.record(IterationStats {
                iteration: iterations,
                current_cost: eval.penalised_cost(&candidate),
                best_cost: self.best_cost(&best_any),
                num_feasible: self.population.num_feasible(),
                num_infeasible: self.population.num_infeasible(),
                penalties: self.penalty_manager.penalties(),
                feasibility: self.penalty_manager.feasibility_fractions(),
            });
        }

        let best = match self.population.best_found() {
            Some(feasible) => feasible.clone(),
            None => {
                best_any
                    .map(|(_, sol)| sol)
                    .unwrap_or_else(|| Solution::empty(self.data))
            }
        };

        info!(
            iterations,
            feasible = best.is_feasible(),
            "genetic search finished"
        );

        Ok(SolveResult::new(best, started.elapsed(), iterations, stats))
    }

    fn best_cost(&self, best_any: &Option<(i64, Solution)>) -> i64 {
        let eval = self.penalty_manager.cost_evaluator();
        match self.population.best_found() {
            Some(best) => eval.penalised_cost(best),
            None => best_any.as_ref().map_or(i64::MAX, |(cost, _)| *cost),
        }
    }
}

fn track_best(best: &mut Option<(i64, Solution)>, cost: i64, candidate: &Solution) {
    if best.as_ref().is_none_or(|(b, _)| cost < *b) {
        *best = Some((cost, candidate.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct;
    use crate::distance::Matrix;
    use crate::evaluation::PenaltyParams;
    use crate::models::{Client, Depot, VehicleType};
    use crate::population::PopulationParams;
    use crate::search::{compute_neighbours, NeighbourhoodParams};

    fn cluster_data() -> ProblemData {
        let coords: Vec<(i64, i64)> = vec![
            (0, 0),
            (10, 0),
            (12, 2),
            (14, 0),
            (-10, 0),
            (-12, 2),
            (-14, 0),
        ];
        ProblemData::new(
            vec![Depot::new(0, 0)],
            coords[1..]
                .iter()
                .map(|&(x, y)| Client::new(x, y).with_delivery(5))
                .collect(),
            vec![Matrix::from_coords(&coords)],
            vec![Matrix::from_coords(&coords)],
            vec![VehicleType::new(3, 20)],
            vec![],
        )
        .unwrap()
    }

    fn run_genetic(data: &ProblemData, seed: u64, iterations: usize) -> SolveResult {
        let neighbours = compute_neighbours(data, &NeighbourhoodParams::default()).unwrap();
        let mut rng = RandomNumberGenerator::new(seed);

        let pm = PenaltyManager::new(PenaltyParams::default()).unwrap();
        let population = Population::new(
            data,
            PopulationParams {
                min_pop_size: 4,
                generation_size: 4,
                ..PopulationParams::default()
            },
        )
        .unwrap();
        let search = LocalSearch::new(data, &neighbours);

        let seeds: Vec<Solution> = (0..6)
            .map(|_| construct::sweep(data, &mut rng).unwrap())
            .collect();

        let mut genetic = GeneticAlgorithm::new(
            data,
            pm,
            population,
            search,
            GeneticParams::default(),
        )
        .unwrap();

        let mut stop = StoppingCriterion::max_iterations(iterations);
        genetic.run(&mut stop, seeds, &mut rng, true).unwrap()
    }

    #[test]
    fn test_genetic_finds_feasible_solution() {
        let data = cluster_data();
        let result = run_genetic(&data, 42, 30);
        assert!(result.is_feasible());
        assert_eq!(result.best().num_clients(), 6);
        assert_eq!(result.stats().num_iterations(), 30);
    }

    #[test]
    fn test_genetic_is_reproducible() {
        let data = cluster_data();
        let a = run_genetic(&data, 7, 20);
        let b = run_genetic(&data, 7, 20);
        assert_eq!(a.best(), b.best());
    }

    #[test]
    fn test_genetic_rejects_bad_repair_probability() {
        let data = cluster_data();
        let neighbours = compute_neighbours(&data, &NeighbourhoodParams::default()).unwrap();
        let pm = PenaltyManager::new(PenaltyParams::default()).unwrap();
        let population = Population::new(&data, PopulationParams::default()).unwrap();
        let search = LocalSearch::new(&data, &neighbours);

        let params = GeneticParams {
            repair_probability: -0.1,
            ..GeneticParams::default()
        };
        assert!(GeneticAlgorithm::new(&data, pm, population, search, params).is_err());
    }
}
