//! Complete solution: a multiset of routes plus unassigned clients.

use crate::SolverError;

use super::{ProblemData, Route, RouteSpec};

/// A candidate solution to a routing problem.
///
/// Holds a multiset of non-empty routes and the list of clients no route
/// visits. All solution-level totals are cached at construction; the
/// feasibility flag is true iff every excess is zero, no required client
/// is missing, and no group constraint is violated.
///
/// Two solutions are equal iff their route multisets match: each route
/// compared by vehicle type and exact visit sequence, while the order of
/// routes within the solution is irrelevant.
#[derive(Debug, Clone)]
pub struct Solution {
    routes: Vec<Route>,
    unassigned: Vec<usize>,
    distance: i64,
    fixed_cost: i64,
    excess_load: i64,
    time_warp: i64,
    excess_distance: i64,
    excess_duration: i64,
    uncollected_prizes: i64,
    missing_required: usize,
    group_violations: usize,
}

impl Solution {
    /// Creates a solution from the given routes.
    ///
    /// Empty routes are dropped. Clients visited by no route become
    /// unassigned.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidRoute`] when a client is visited by
    /// more than one route, or when more routes use a vehicle type than it
    /// has vehicles available.
    pub fn new(data: &ProblemData, routes: Vec<Route>) -> Result<Self, SolverError> {
        let routes: Vec<Route> = routes.into_iter().filter(|r| !r.is_empty()).collect();

        let mut used = vec![0usize; data.num_vehicle_types()];
        for route in &routes {
            used[route.vehicle_type()] += 1;
        }

        for (vt_idx, &count) in used.iter().enumerate() {
            let available = data.vehicle_type(vt_idx).num_available();
            if count > available {
                return Err(SolverError::InvalidRoute(format!(
                    "{count} routes of vehicle type {vt_idx}, only {available} available"
                )));
            }
        }

        let mut visited = vec![false; data.num_locations()];
        for route in &routes {
            for &client in route.visits() {
                if visited[client] {
                    return Err(SolverError::InvalidRoute(format!(
                        "client {client} is visited by more than one route"
                    )));
                }
                visited[client] = true;
            }
        }

        let mut distance: i64 = 0;
        let mut fixed_cost: i64 = 0;
        let mut excess_load: i64 = 0;
        let mut time_warp: i64 = 0;
        let mut excess_distance: i64 = 0;
        let mut excess_duration: i64 = 0;

        for route in &routes {
            distance = distance.saturating_add(route.distance());
            fixed_cost =
                fixed_cost.saturating_add(data.vehicle_type(route.vehicle_type()).fixed_cost());
            excess_load = excess_load.saturating_add(route.excess_load());
            time_warp = time_warp.saturating_add(route.time_warp());
            excess_distance = excess_distance.saturating_add(route.excess_distance());
            excess_duration = excess_duration.saturating_add(route.excess_duration());
        }

        let mut unassigned = Vec::new();
        let mut uncollected_prizes: i64 = 0;
        let mut missing_required = 0;

        for client_idx in data.client_indices() {
            if visited[client_idx] {
                continue;
            }

            let client = data.client(client_idx);
            unassigned.push(client_idx);
            uncollected_prizes = uncollected_prizes.saturating_add(client.prize());
            if client.required() {
                missing_required += 1;
            }
        }

        let mut group_violations = 0;
        for group in data.groups() {
            let count = group.clients().iter().filter(|&&c| visited[c]).count();
            let violated = if group.required() { count != 1 } else { count > 1 };
            if violated {
                group_violations += 1;
            }
        }

        Ok(Self {
            routes,
            unassigned,
            distance,
            fixed_cost,
            excess_load,
            time_warp,
            excess_distance,
            excess_duration,
            uncollected_prizes,
            missing_required,
            group_violations,
        })
    }

    /// Creates the empty solution: no routes, every client unassigned.
    pub fn empty(data: &ProblemData) -> Self {
        Self::new(data, vec![]).unwrap_or_else(|_| unreachable!("no routes to conflict"))
    }

    /// Rebuilds a solution from plain route specifications.
    pub fn from_specs(data: &ProblemData, specs: &[RouteSpec]) -> Result<Self, SolverError> {
        let routes = specs
            .iter()
            .map(|spec| Route::new(data, spec.visits.clone(), spec.vehicle_type))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(data, routes)
    }

    /// Plain serializable form of this solution's routes.
    pub fn to_specs(&self) -> Vec<RouteSpec> {
        self.routes.iter().map(RouteSpec::from).collect()
    }

    /// The routes of this solution.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Number of routes.
    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    /// Clients not visited by any route, ascending.
    pub fn unassigned(&self) -> &[usize] {
        &self.unassigned
    }

    /// Number of clients visited.
    pub fn num_clients(&self) -> usize {
        self.routes.iter().map(|r| r.len()).sum()
    }

    /// Total travel distance over all routes.
    pub fn distance(&self) -> i64 {
        self.distance
    }

    /// Total fixed vehicle cost over all routes.
    pub fn fixed_cost(&self) -> i64 {
        self.fixed_cost
    }

    /// Total load excess over all routes.
    pub fn excess_load(&self) -> i64 {
        self.excess_load
    }

    /// Total time warp over all routes.
    pub fn time_warp(&self) -> i64 {
        self.time_warp
    }

    /// Total distance excess over all routes.
    pub fn excess_distance(&self) -> i64 {
        self.excess_distance
    }

    /// Total duration excess over all routes.
    pub fn excess_duration(&self) -> i64 {
        self.excess_duration
    }

    /// Sum of prizes of unvisited clients.
    pub fn uncollected_prizes(&self) -> i64 {
        self.uncollected_prizes
    }

    /// Number of required clients no route visits.
    pub fn missing_required(&self) -> usize {
        self.missing_required
    }

    /// Number of violated client groups.
    pub fn group_violations(&self) -> usize {
        self.group_violations
    }

    /// Returns `true` if all excesses are zero, no required client is
    /// missing, and no group constraint is violated.
    pub fn is_feasible(&self) -> bool {
        self.excess_load == 0
            && self.time_warp == 0
            && self.excess_distance == 0
            && self.excess_duration == 0
            && self.missing_required == 0
            && self.group_violations == 0
    }
}

impl PartialEq for Solution {
    fn eq(&self, other: &Self) -> bool {
        if self.routes.len() != other.routes.len() {
            return false;
        }

        let key = |r: &Route| (r.vehicle_type(), r.visits().to_vec());
        let mut lhs: Vec<_> = self.routes.iter().map(key).collect();
        let mut rhs: Vec<_> = other.routes.iter().map(key).collect();
        lhs.sort();
        rhs.sort();
        lhs == rhs
    }
}

impl Eq for Solution {}
