//! Diversity-managed population with feasible/infeasible sub-populations.

use serde::Deserialize;
use tracing::debug;

use crate::evaluation::CostEvaluator;
use crate::models::{ProblemData, Solution};
use crate::{RandomNumberGenerator, SolverError};

use super::broken_pairs_distance;

/// Parameters governing population size, elitism, and parent selection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PopulationParams {
    /// Size each sub-population is reduced to on survivor selection.
    pub min_pop_size: usize,
    /// Number of insertions a sub-population may grow beyond `min_pop_size`
    /// before survivor selection triggers.
    pub generation_size: usize,
    /// Number of elite entries whose cost rank dominates their fitness.
    pub nb_elite: usize,
    /// Number of closest entries used for the mean diversity of an entry.
    pub nb_close: usize,
    /// Lower bound of the accepted parent diversity band.
    pub lb_diversity: f64,
    /// Upper bound of the accepted parent diversity band.
    pub ub_diversity: f64,
}

impl Default for PopulationParams {
    fn default() -> Self {
        Self {
            min_pop_size: 25,
            generation_size: 40,
            nb_elite: 4,
            nb_close: 5,
            lb_diversity: 0.1,
            ub_diversity: 0.5,
        }
    }
}

impl PopulationParams {
    fn validate(&self) -> Result<(), SolverError> {
        if !(0.0..=1.0).contains(&self.lb_diversity) || !(0.0..=1.0).contains(&self.ub_diversity) {
            return Err(SolverError::InvalidParameter(
                "diversity bounds must be in [0, 1]".into(),
            ));
        }

        if self.ub_diversity <= self.lb_diversity {
            return Err(SolverError::InvalidParameter(
                "ub_diversity must exceed lb_diversity".into(),
            ));
        }

        Ok(())
    }

    /// Sub-population size at which survivor selection triggers.
    pub fn max_pop_size(&self) -> usize {
        self.min_pop_size + self.generation_size
    }
}

/// One population entry: a solution, its cached cost, and its sorted
/// proximity list towards the rest of its sub-population.
struct Entry {
    id: u64,
    solution: Solution,
    cost: i64,
    fitness: f64,
    // (diversity, id) pairs, ascending; ids are stable handles.
    prox: Vec<(f64, u64)>,
}

impl Entry {
    fn avg_distance_closest(&self, nb_close: usize) -> f64 {
        let closest = &self.prox[..self.prox.len().min(nb_close)];
        if closest.is_empty() {
            return 0.0;
        }
        closest.iter().map(|(d, _)| d).sum::<f64>() / closest.len() as f64
    }
}

/// A population split into feasible and infeasible sub-populations.
///
/// Each insertion updates pairwise proximity inside the target
/// sub-population and recomputes biased fitness; overflowing a
/// sub-population triggers survivor selection down to `min_pop_size`,
/// purging duplicates first and highest biased fitness after. The best
/// feasible solution ever added is tracked outside the pools and never
/// evicted.
pub struct Population<'a> {
    data: &'a ProblemData,
    params: PopulationParams,
    feasible: Vec<Entry>,
    infeasible: Vec<Entry>,
    best: Option<(i64, Solution)>,
    next_id: u64,
}

impl<'a> Population<'a> {
    /// Creates an empty population.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidParameter`] when the diversity band
    /// is malformed.
    pub fn new(data: &'a ProblemData, params: PopulationParams) -> Result<Self, SolverError> {
        params.validate()?;

        Ok(Self {
            data,
            params,
            feasible: Vec::new(),
            infeasible: Vec::new(),
            best: None,
            next_id: 0,
        })
    }

    /// Number of entries across both sub-populations.
    pub fn len(&self) -> usize {
        self.feasible.len() + self.infeasible.len()
    }

    /// Returns `true` when the population holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the feasible sub-population.
    pub fn num_feasible(&self) -> usize {
        self.feasible.len()
    }

    /// Size of the infeasible sub-population.
    pub fn num_infeasible(&self) -> usize {
        self.infeasible.len()
    }

    /// Best feasible solution ever added, if any.
    pub fn best_found(&self) -> Option<&Solution> {
        self.best.as_ref().map(|(_, sol)| sol)
    }

    /// Adds a solution. Survivor selection triggers automatically when the
    /// target sub-population overflows.
    pub fn add(&mut self, solution: Solution, cost_evaluator: &CostEvaluator) {
        let cost = cost_evaluator.penalised_cost(&solution);
        let feasible = solution.is_feasible();

        // A saturated cost means aggregation overflowed; such solutions
        // rank below every finite-cost solution and are never inserted.
        if cost == i64::MAX {
            return;
        }

        if feasible && self.best.as_ref().is_none_or(|(best_cost, _)| cost < *best_cost) {
            debug!(cost, "new best feasible solution");
            self.best = Some((cost, solution.clone()));
        }

        let id = self.next_id;
        self.next_id += 1;

        let data = self.data;
        let sub = if feasible {
            &mut self.feasible
        } else {
            &mut self.infeasible
        };

        let mut prox = Vec::with_capacity(sub.len());
        for other in sub.iter_mut() {
            let div = broken_pairs_distance(data, &solution, &other.solution);
            sorted_insert(&mut prox, (div, other.id));
            sorted_insert(&mut other.prox, (div, id));
        }

        sub.push(Entry {
            id,
            solution,
            cost,
            fitness: 0.0,
            prox,
        });

        update_fitness(sub, &self.params);

        if sub.len() > self.params.max_pop_size() {
            purge(sub, &self.params);
        }
    }

    /// Selects two parents by binary tournament, redrawing the second up
    /// to ten times until their diversity falls inside the configured
    /// band.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidParameter`] when the population is
    /// empty.
    pub fn select(
        &self,
        rng: &mut RandomNumberGenerator,
    ) -> Result<(Solution, Solution), SolverError> {
        let first = self.binary_tournament(rng)?;
        let mut second = self.binary_tournament(rng)?;

        let mut diversity = broken_pairs_distance(self.data, first, second);
        let lb = self.params.lb_diversity;
        let ub = self.params.ub_diversity;

        let mut tries = 1;
        while !(lb <= diversity && diversity <= ub) && tries <= 10 {
            tries += 1;
            second = self.binary_tournament(rng)?;
            diversity = broken_pairs_distance(self.data, first, second);
        }

        Ok((first.clone(), second.clone()))
    }

    /// Selects one solution by binary tournament over both
    /// sub-populations.
    pub fn binary_tournament(
        &self,
        rng: &mut RandomNumberGenerator,
    ) -> Result<&Solution, SolverError> {
        if self.is_empty() {
            return Err(SolverError::InvalidParameter(
                "cannot select from an empty population".into(),
            ));
        }

        let pick = |idx: usize| -> &Entry {
            if idx < self.feasible.len() {
                &self.feasible[idx]
            } else {
                &self.infeasible[idx - self.feasible.len()]
            }
        };

        let first = pick(rng.randint(self.len()));
        let second = pick(rng.randint(self.len()));

        Ok(if first.fitness < second.fitness {
            &first.solution
        } else {
            &second.solution
        })
    }
}

fn sorted_insert(prox: &mut Vec<(f64, u64)>, pair: (f64, u64)) {
    let at = prox
        .binary_search_by(|other| other.partial_cmp(&pair).expect("diversity is finite"))
        .unwrap_or_else(|at| at);
    prox.insert(at, pair);
}

/// Recomputes biased fitness for a sub-population: cost rank plus
/// diversity rank weighted by `1 - nb_elite / |pop|`, normalised by the
/// sub-population size. Lower is better.
fn update_fitness(sub: &mut [Entry], params: &PopulationParams) {
    if sub.is_empty() {
        return;
    }

    let mut by_cost: Vec<usize> = (0..sub.len()).collect();
    by_cost.sort_by_key(|&idx| (sub[idx].cost, sub[idx].id));

    // (negated mean diversity, cost rank), ascending: highest diversity first.
    let mut diversity: Vec<(f64, usize)> = by_cost
        .iter()
        .enumerate()
        .map(|(cost_rank, &idx)| (-sub[idx].avg_distance_closest(params.nb_close), cost_rank))
        .collect();
    diversity.sort_by(|a, b| a.partial_cmp(b).expect("diversity is finite"));

    let size = sub.len() as f64;
    let nb_elite = params.nb_elite.min(sub.len());
    let div_weight = 1.0 - nb_elite as f64 / size;

    for (div_rank, &(_, cost_rank)) in diversity.iter().enumerate() {
        let fitness = (cost_rank as f64 + div_weight * div_rank as f64) / size;
        sub[by_cost[cost_rank]].fitness = fitness;
    }
}

/// Survivor selection: duplicates first, then highest biased fitness,
/// until the sub-population is back at `min_pop_size`.
fn purge(sub: &mut Vec<Entry>, params: &PopulationParams) {
    let mut duplicate_ids = Vec::new();
    for i in 0..sub.len() {
        for j in i + 1..sub.len() {
            if sub[i].solution == sub[j].solution {
                duplicate_ids.push(sub[j].id);
            }
        }
    }

    for id in duplicate_ids {
        if sub.len() <= params.min_pop_size {
            break;
        }
        remove_entry(sub, id);
    }

    while sub.len() > params.min_pop_size {
        update_fitness(sub, params);

        let worst = sub
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                (a.fitness, a.id)
                    .partial_cmp(&(b.fitness, b.id))
                    .expect("fitness is finite")
            })
            .map(|(_, entry)| entry.id)
            .expect("sub-population is non-empty");

        remove_entry(sub, worst);
    }

    update_fitness(sub, params);
}

fn remove_entry(sub: &mut Vec<Entry>, id: u64) {
    sub.retain(|entry| entry.id != id);
    for entry in sub.iter_mut() {
        entry.prox.retain(|&(_, other)| other != id);
    }
}
