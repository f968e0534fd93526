//! Destroy operators.
//!
//! Each operator removes a bounded number of clients from a solution,
//! producing a partial solution for a repair operator to complete.

use crate::models::{ProblemData, Route, Solution};
use crate::search::Neighbourhoods;
use crate::{RandomNumberGenerator, SolverError};

/// Parameters shared by the destroy operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestroyParams {
    /// Upper bound on the number of clients removed per call.
    pub destroy_strength: usize,
    /// Upper bound on the length of one removed string.
    pub max_string_size: usize,
}

impl Default for DestroyParams {
    fn default() -> Self {
        Self {
            destroy_strength: 30,
            max_string_size: 10,
        }
    }
}

impl DestroyParams {
    pub(crate) fn validate(&self) -> Result<(), SolverError> {
        if self.destroy_strength == 0 || self.max_string_size == 0 {
            return Err(SolverError::InvalidParameter(
                "destroy_strength and max_string_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// A registered destroy operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyOperator {
    /// Removes uniformly chosen clients.
    Random,
    /// Removes a connected blob of clients found by a random walk over the
    /// granular neighbourhood graph.
    Concentric,
    /// Removes contiguous strings of clients, hopping from route to the
    /// nearest remaining route by centroid distance.
    String,
}

impl DestroyOperator {
    /// All destroy operators, in default registration order.
    pub fn all() -> Vec<DestroyOperator> {
        vec![
            DestroyOperator::Random,
            DestroyOperator::Concentric,
            DestroyOperator::String,
        ]
    }

    /// Resolves a textual operator name.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::UnknownOperator`] for unrecognised names.
    pub fn from_name(name: &str) -> Result<Self, SolverError> {
        match name {
            "random" => Ok(DestroyOperator::Random),
            "concentric" => Ok(DestroyOperator::Concentric),
            "string" => Ok(DestroyOperator::String),
            _ => Err(SolverError::UnknownOperator(name.into())),
        }
    }

    /// Registered name of this operator.
    pub fn name(&self) -> &'static str {
        match self {
            DestroyOperator::Random => "random",
            DestroyOperator::Concentric => "concentric",
            DestroyOperator::String => "string",
        }
    }

    /// Removes clients from the solution.
    pub fn destroy(
        &self,
        data: &ProblemData,
        solution: &Solution,
        neighbours: &Neighbourhoods,
        params: &DestroyParams,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Solution, SolverError> {
        if solution.num_clients() == 0 {
            return Ok(solution.clone());
        }

        match self {
            DestroyOperator::Random => random(data, solution, params, rng),
            DestroyOperator::Concentric => concentric(data, solution, neighbours, params, rng),
            DestroyOperator::String => string(data, solution, params, rng),
        }
    }
}

/// Rebuilds the solution without the marked clients.
fn without_clients(
    data: &ProblemData,
    solution: &Solution,
    skip: &[bool],
) -> Result<Solution, SolverError> {
    let mut routes = Vec::with_capacity(solution.num_routes());

    for route in solution.routes() {
        let visits: Vec<usize> = route
            .visits()
            .iter()
            .copied()
            .filter(|&c| !skip[c])
            .collect();

        if !visits.is_empty() {
            routes.push(Route::new(data, visits, route.vehicle_type())?);
        }
    }

    Solution::new(data, routes)
}

fn assigned_clients(solution: &Solution) -> Vec<usize> {
    solution
        .routes()
        .iter()
        .flat_map(|r| r.visits().iter().copied())
        .collect()
}

fn random(
    data: &ProblemData,
    solution: &Solution,
    params: &DestroyParams,
    rng: &mut RandomNumberGenerator,
) -> Result<Solution, SolverError> {
    let mut clients = assigned_clients(solution);
    let num_destroy = rng.randint(params.destroy_strength) + 1;

    rng.shuffle(&mut clients);

    let mut skip = vec![false; data.num_locations()];
    for &c in clients.iter().take(num_destroy) {
        skip[c] = true;
    }

    without_clients(data, solution, &skip)
}

fn concentric(
    data: &ProblemData,
    solution: &Solution,
    neighbours: &Neighbourhoods,
    params: &DestroyParams,
    rng: &mut RandomNumberGenerator,
) -> Result<Solution, SolverError> {
    let clients = assigned_clients(solution);
    let num_destroy = (rng.randint(params.destroy_strength) + 1).min(clients.len());

    let mut assigned = vec![false; data.num_locations()];
    for &c in &clients {
        assigned[c] = true;
    }

    let mut skip = vec![false; data.num_locations()];
    let mut current = clients[rng.randint(clients.len())];
    skip[current] = true;
    let mut num_marked = 1;

    while num_marked < num_destroy {
        // Step to a random assigned, unmarked neighbour; when the walk gets
        // stuck, restart from a random unmarked client.
        let candidates: Vec<usize> = neighbours[0][current]
            .iter()
            .copied()
            .filter(|&c| assigned[c] && !skip[c])
            .collect();

        current = if candidates.is_empty() {
            let open: Vec<usize> = clients.iter().copied().filter(|&c| !skip[c]).collect();
            open[rng.randint(open.len())]
        } else {
            candidates[rng.randint(candidates.len())]
        };

        skip[current] = true;
        num_marked += 1;
    }

    without_clients(data, solution, &skip)
}

fn string(
    data: &ProblemData,
    solution: &Solution,
    params: &DestroyParams,
    rng: &mut RandomNumberGenerator,
) -> Result<Solution, SolverError> {
    let budget = rng.randint(params.destroy_strength) + 1;

    // Working copies: routes still untouched, and remnants of routes that
    // already lost a string.
    let mut untouched: Vec<(usize, Vec<usize>)> = solution
        .routes()
        .iter()
        .map(|r| (r.vehicle_type(), r.visits().to_vec()))
        .collect();
    let mut pool: Vec<(usize, Vec<usize>)> = Vec::new();

    let mut current = untouched.swap_remove(rng.randint(untouched.len()));
    let mut num_removed = 0;

    loop {
        let len = current.1.len();
        let max_size = params.max_string_size.min(budget - num_removed).min(len);
        let size = rng.randint(max_size) + 1;
        let start = rng.randint(len);

        let removed_positions: Vec<usize> = (0..size).map(|i| (start + i) % len).collect();
        let keep_string = rng.rand() < 0.5;

        let string: Vec<usize> = removed_positions.iter().map(|&p| current.1[p]).collect();
        let remnant: Vec<usize> = current
            .1
            .iter()
            .enumerate()
            .filter(|(p, _)| !removed_positions.contains(p))
            .map(|(_, &c)| c)
            .collect();

        if !remnant.is_empty() {
            pool.push((current.0, remnant.clone()));
        }

        if keep_string {
            // Keep the removed string in the solution as a route of its
            // own; it still consumes removal budget.
            pool.push((current.0, string));
        }
        num_removed += size;

        if num_removed >= budget || untouched.is_empty() {
            break;
        }

        // Hop to the nearest untouched route by centroid distance.
        let reference = centroid(data, &remnant);
        let nearest = untouched
            .iter()
            .enumerate()
            .map(|(idx, (_, visits))| {
                let c = centroid(data, visits);
                let dx = c.0 - reference.0;
                let dy = c.1 - reference.1;
                (idx, dx * dx + dy * dy)
            })
            .min_by(|a, b| a.1.partial_cmp(&b.1).expect("finite centroid distance"))
            .map(|(idx, _)| idx)
            .expect("untouched is non-empty");

        current = untouched.swap_remove(nearest);
    }

    let mut routes = Vec::with_capacity(untouched.len() + pool.len());
    let mut spares: Vec<i64> = data
        .vehicle_types()
        .iter()
        .map(|vt| vt.num_available() as i64)
        .collect();

    for (vt, visits) in untouched.into_iter().chain(pool) {
        if spares[vt] > 0 {
            spares[vt] -= 1;
            routes.push(Route::new(data, visits, vt)?);
        }
        // No vehicle left for this remnant: its clients go unplanned.
    }

    Solution::new(data, routes)
}

fn centroid(data: &ProblemData, visits: &[usize]) -> (f64, f64) {
    if visits.is_empty() {
        return (0.0, 0.0);
    }

    let (sx, sy) = visits.iter().fold((0.0, 0.0), |(sx, sy), &c| {
        let (x, y) = data.coords(c);
        (sx + x as f64, sy + y as f64)
    });
    (sx / visits.len() as f64, sy / visits.len() as f64)
}
