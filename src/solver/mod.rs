//! Top-level solver drivers and supporting pieces.
//!
//! - [`solve`] — Wires construction, search, perturbation, penalties,
//!   acceptance, and a driver together
//! - [`IteratedLocalSearch`], [`GeneticAlgorithm`] — The two drivers
//! - [`AcceptanceCriterion`], [`StoppingCriterion`] — Loop control
//! - [`SolveParams`] — Parameters, loadable from TOML
//! - [`Statistics`], [`SolveResult`] — Run output

mod accept;
mod genetic;
mod ils;
mod params;
mod result;
mod stats;
mod stop;

pub use accept::AcceptanceCriterion;
pub use genetic::GeneticAlgorithm;
pub use ils::IteratedLocalSearch;
pub use params::{Driver, GeneticParams, IlsParams, SolveParams};
pub use result::SolveResult;
pub use stats::{IterationStats, Statistics};
pub use stop::StoppingCriterion;

use std::time::Duration;

use crate::construct;
use crate::evaluation::PenaltyManager;
use crate::models::{ProblemData, Solution};
use crate::perturb::DestroyRepair;
use crate::population::Population;
use crate::search::{compute_neighbours, LocalSearch};
use crate::{RandomNumberGenerator, SolverError};

/// Runtime assumed for acceptance-threshold decay when the stopping
/// criterion carries no wall-clock budget.
const DEFAULT_RUNTIME_BUDGET: Duration = Duration::from_secs(600);

/// Solves the given problem instance.
///
/// Builds the granular neighbourhoods, penalty manager, local search, and
/// the driver selected by `params.driver`, constructs initial solutions by
/// randomised sweep, and runs until `stop` fires.
///
/// # Errors
///
/// Propagates construction-time validation errors; no partial run is
/// performed when any component rejects its parameters.
///
/// # Examples
///
/// ```
/// use hypervrp::distance::Matrix;
/// use hypervrp::models::{Client, Depot, ProblemData, VehicleType};
/// use hypervrp::solver::{solve, SolveParams, StoppingCriterion};
///
/// let coords = [(0, 0), (3, 4), (6, 0)];
/// let data = ProblemData::new(
///     vec![Depot::new(0, 0)],
///     vec![
///         Client::new(3, 4).with_delivery(5),
///         Client::new(6, 0).with_delivery(5),
///     ],
///     vec![Matrix::from_coords(&coords)],
///     vec![Matrix::from_coords(&coords)],
///     vec![VehicleType::new(2, 10)],
///     vec![],
/// )
/// .unwrap();
///
/// let mut stop = StoppingCriterion::max_iterations(10);
/// let result = solve(&data, &mut stop, 42, false, &SolveParams::default()).unwrap();
/// assert!(result.is_feasible());
/// ```
pub fn solve(
    data: &ProblemData,
    stop: &mut StoppingCriterion,
    seed: u64,
    collect_stats: bool,
    params: &SolveParams,
) -> Result<SolveResult, SolverError> {
    params.validate()?;

    let mut rng = RandomNumberGenerator::new(seed);
    let neighbours = compute_neighbours(data, &params.neighbourhood)?;
    let penalty_manager = PenaltyManager::new(params.penalty.clone())?;

    let mut search = LocalSearch::with_operators(
        data,
        &neighbours,
        params.node_ops.clone(),
        params.route_ops.clone(),
    );

    match params.driver {
        Driver::IteratedLocalSearch => {
            let perturb = DestroyRepair::new(
                data,
                &neighbours,
                params.destroy_ops.clone(),
                params.repair_ops.clone(),
                params.ils.destroy_params(),
            )?;

            let runtime = stop.runtime_budget().unwrap_or(DEFAULT_RUNTIME_BUDGET);
            let accept = AcceptanceCriterion::record_to_record(
                params.ils.accept_start_pct,
                params.ils.accept_end_pct,
                runtime,
            )?;

            let constructed = construct::sweep(data, &mut rng)?;
            let initial = search.search(&constructed, &penalty_manager.cost_evaluator(), &mut rng)?;

            let mut driver = IteratedLocalSearch::new(
                penalty_manager,
                perturb,
                search,
                accept,
                params.ils.clone(),
            )?;
            driver.run(stop, initial, &mut rng, collect_stats)
        }
        Driver::Genetic => {
            let population = Population::new(data, params.population.clone())?;

            let seeds: Vec<Solution> = (0..params.genetic.num_initial_solutions.max(1))
                .map(|_| construct::sweep(data, &mut rng))
                .collect::<Result<_, _>>()?;

            let mut driver = GeneticAlgorithm::new(
                data,
                penalty_manager,
                population,
                search,
                params.genetic.clone(),
            )?;
            driver.run(stop, seeds, &mut rng, collect_stats)
        }
    }
}
