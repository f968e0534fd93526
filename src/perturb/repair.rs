//! Repair operators.
//!
//! Re-insert unplanned clients into a partial solution, cheapest
//! penalised-cost position first.

use crate::evaluation::CostEvaluator;
use crate::models::{ProblemData, Route, Solution};
use crate::search::{evaluate_composition, Piece, SearchRoute};
use crate::{RandomNumberGenerator, SolverError};

/// A registered repair operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOperator {
    /// Inserts each unplanned client at the position minimising the
    /// penalised-cost delta over all routes.
    Greedy,
    /// As greedy, but candidate positions are restricted to the route
    /// whose centroid is nearest to the client.
    NearestRoute,
}

impl RepairOperator {
    /// All repair operators, in default registration order.
    pub fn all() -> Vec<RepairOperator> {
        vec![RepairOperator::Greedy, RepairOperator::NearestRoute]
    }

    /// Resolves a textual operator name.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::UnknownOperator`] for unrecognised names.
    pub fn from_name(name: &str) -> Result<Self, SolverError> {
        match name {
            "greedy" => Ok(RepairOperator::Greedy),
            "nearest_route" => Ok(RepairOperator::NearestRoute),
            _ => Err(SolverError::UnknownOperator(name.into())),
        }
    }

    /// Registered name of this operator.
    pub fn name(&self) -> &'static str {
        match self {
            RepairOperator::Greedy => "greedy",
            RepairOperator::NearestRoute => "nearest_route",
        }
    }

    /// Inserts the solution's unplanned clients, in randomised order.
    ///
    /// A client with no insertion position anywhere (no route and no spare
    /// vehicle) stays unassigned.
    pub fn repair(
        &self,
        data: &ProblemData,
        solution: &Solution,
        cost_evaluator: &CostEvaluator,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Solution, SolverError> {
        let mut unplanned: Vec<usize> = solution.unassigned().to_vec();
        rng.shuffle(&mut unplanned);

        let mut work = Workspace::new(data, solution);

        for client in unplanned {
            let target = match self {
                RepairOperator::Greedy => work.best_insertion_anywhere(data, cost_evaluator, client),
                RepairOperator::NearestRoute => {
                    work.best_insertion_nearest(data, cost_evaluator, client)
                }
            };

            if let Some((route_idx, after)) = target {
                work.insert(data, route_idx, after, client);
            }
        }

        work.into_solution(data)
    }
}

/// Working routes during repair: the solution's routes plus one open slot
/// per vehicle type that still has spare vehicles.
struct Workspace {
    routes: Vec<SearchRoute>,
    spares: Vec<usize>,
}

impl Workspace {
    fn new(data: &ProblemData, solution: &Solution) -> Self {
        let mut used = vec![0usize; data.num_vehicle_types()];
        let mut routes = Vec::with_capacity(solution.num_routes() + data.num_vehicle_types());

        for route in solution.routes() {
            used[route.vehicle_type()] += 1;
            let mut slot = SearchRoute::new(data, routes.len(), route.vehicle_type());
            slot.set_visits(data, route.visits().to_vec(), 0);
            routes.push(slot);
        }

        let mut spares = vec![0usize; data.num_vehicle_types()];
        for (vt_idx, vt) in data.vehicle_types().iter().enumerate() {
            spares[vt_idx] = vt.num_available() - used[vt_idx];
            if spares[vt_idx] > 0 {
                routes.push(SearchRoute::new(data, routes.len(), vt_idx));
            }
        }

        Self { routes, spares }
    }

    /// Cheapest insertion over all candidate routes, as
    /// `(route index, insert-after position)`.
    fn best_insertion_anywhere(
        &self,
        data: &ProblemData,
        eval: &CostEvaluator,
        client: usize,
    ) -> Option<(usize, usize)> {
        let mut best: Option<(i64, usize, usize)> = None;

        for (route_idx, route) in self.routes.iter().enumerate() {
            if route.is_empty() && self.spares[route.vehicle_type()] == 0 {
                continue;
            }

            let cur = route.cost(data, eval);
            for after in 0..=route.len() {
                let delta = insertion_cost(data, eval, route, after, client) - cur;
                if best.map_or(true, |(b, ..)| delta < b) {
                    best = Some((delta, route_idx, after));
                }
            }
        }

        best.map(|(_, route_idx, after)| (route_idx, after))
    }

    /// Cheapest insertion within the non-empty route nearest to the client
    /// by centroid; falls back to an open slot when no route has clients.
    fn best_insertion_nearest(
        &self,
        data: &ProblemData,
        eval: &CostEvaluator,
        client: usize,
    ) -> Option<(usize, usize)> {
        let (cx, cy) = data.coords(client);

        let nearest = self
            .routes
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_empty())
            .map(|(idx, r)| {
                let (sx, sy) = r.visits().iter().fold((0.0, 0.0), |(sx, sy), &c| {
                    let (x, y) = data.coords(c);
                    (sx + x as f64, sy + y as f64)
                });
                let n = r.len() as f64;
                let dx = sx / n - cx as f64;
                let dy = sy / n - cy as f64;
                (idx, dx * dx + dy * dy)
            })
            .min_by(|a, b| a.1.partial_cmp(&b.1).expect("finite centroid distance"));

        let Some((route_idx, _)) = nearest else {
            return self.best_insertion_anywhere(data, eval, client);
        };

        let route = &self.routes[route_idx];
        let cur = route.cost(data, eval);

        (0..=route.len())
            .map(|after| (insertion_cost(data, eval, route, after, client) - cur, after))
            .min()
            .map(|(_, after)| (route_idx, after))
    }

    fn insert(&mut self, data: &ProblemData, route_idx: usize, after: usize, client: usize) {
        let was_empty = self.routes[route_idx].is_empty();

        let mut visits = self.routes[route_idx].visits().to_vec();
        visits.insert(after, client);
        self.routes[route_idx].set_visits(data, visits, 0);

        if was_empty {
            let vt = self.routes[route_idx].vehicle_type();
            self.spares[vt] -= 1;
            if self.spares[vt] > 0 {
                self.routes.push(SearchRoute::new(data, self.routes.len(), vt));
            }
        }
    }

    fn into_solution(self, data: &ProblemData) -> Result<Solution, SolverError> {
        let routes = self
            .routes
            .iter()
            .filter(|r| !r.is_empty())
            .map(|r| Route::new(data, r.visits().to_vec(), r.vehicle_type()))
            .collect::<Result<Vec<_>, _>>()?;
        Solution::new(data, routes)
    }
}

/// Penalised cost of `route` with `client` inserted after `after`.
fn insertion_cost(
    data: &ProblemData,
    eval: &CostEvaluator,
    route: &SearchRoute,
    after: usize,
    client: usize,
) -> i64 {
    let pieces = [
        Piece::Segment {
            route,
            start: 1,
            end: after,
        },
        Piece::Node(client),
        Piece::Segment {
            route,
            start: after + 1,
            end: route.len(),
        },
    ];
    evaluate_composition(data, eval, route.vehicle_type(), &pieces)
}
