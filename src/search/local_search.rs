//! Local search over node and route operators.

use tracing::trace;

use crate::evaluation::CostEvaluator;
use crate::models::{ProblemData, Route, Solution};
use crate::{RandomNumberGenerator, SolverError};

use super::neighbourhood::Neighbourhoods;
use super::node_ops::NodeOperator;
use super::route::SearchRoute;
use super::route_ops::{rebuild_visits, RouteOperator};

/// A structural change to one or two route slots, produced by an operator
/// evaluation and applied by the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// Move `count` clients at `(from, pos)` to after position `after` of
    /// route `to`.
    Relocate {
        /// Source route slot.
        from: usize,
        /// First moved position.
        pos: usize,
        /// Number of consecutive clients moved.
        count: usize,
        /// Target route slot.
        to: usize,
        /// Insert-after position in the target route.
        after: usize,
    },
    /// Exchange the segments at `(ru, pu)` and `(rv, pv)`.
    SwapSegments {
        /// First route slot.
        ru: usize,
        /// First segment start.
        pu: usize,
        /// First segment length.
        u_count: usize,
        /// Second route slot.
        rv: usize,
        /// Second segment start.
        pv: usize,
        /// Second segment length.
        v_count: usize,
    },
    /// Reverse positions `from..=to` within one route.
    Reverse {
        /// Route slot.
        route: usize,
        /// First reversed position.
        from: usize,
        /// Last reversed position.
        to: usize,
    },
    /// Exchange the tails after `pu` and `pv` between two routes.
    SwapTails {
        /// First route slot.
        ru: usize,
        /// Split position in the first route.
        pu: usize,
        /// Second route slot.
        rv: usize,
        /// Split position in the second route.
        pv: usize,
    },
    /// SWAP*: remove the clients at `pu`/`pv` and re-insert each into the
    /// other route after `u_after`/`v_after` (original indexing).
    SwapStar {
        /// First route slot.
        ru: usize,
        /// Removed position in the first route.
        pu: usize,
        /// Second route slot.
        rv: usize,
        /// Removed position in the second route.
        pv: usize,
        /// Insert-after position of the first client in the second route.
        u_after: usize,
        /// Insert-after position of the second client in the first route.
        v_after: usize,
    },
}

impl Move {
    /// The route slots this move touches.
    pub fn routes(&self) -> Vec<usize> {
        match *self {
            Move::Relocate { from, to, .. } => vec![from, to],
            Move::SwapSegments { ru, rv, .. } => vec![ru, rv],
            Move::Reverse { route, .. } => vec![route],
            Move::SwapTails { ru, rv, .. } => vec![ru, rv],
            Move::SwapStar { ru, rv, .. } => vec![ru, rv],
        }
    }
}

/// Neighbourhood-driven local search.
///
/// Keeps one route slot per vehicle in the fleet, each with cached segment
/// summaries, and improves a solution by applying registered node and
/// route operators until no operator improves the penalised cost.
///
/// The slots, the scan permutation, and all pair-inspection stamps are
/// allocated once and reused across calls.
pub struct LocalSearch<'a> {
    data: &'a ProblemData,
    neighbours: &'a Neighbourhoods,
    node_ops: Vec<NodeOperator>,
    route_ops: Vec<RouteOperator>,
    routes: Vec<SearchRoute>,
    // Slot range per vehicle type: slots type_start[t]..type_start[t + 1].
    type_start: Vec<usize>,
    // For each location: the (slot, position) currently holding it.
    client_pos: Vec<Option<(usize, usize)>>,
    scan_order: Vec<usize>,
    // Move counter at which each route pair was last inspected.
    pair_stamp: Vec<u64>,
    num_moves: u64,
    best_improvement: bool,
}

impl<'a> LocalSearch<'a> {
    /// Creates a local search over the given data and neighbourhoods with
    /// the default operator registries.
    pub fn new(data: &'a ProblemData, neighbours: &'a Neighbourhoods) -> Self {
        Self::with_operators(data, neighbours, NodeOperator::all(), RouteOperator::all())
    }

    /// Creates a local search with explicit operator registries.
    pub fn with_operators(
        data: &'a ProblemData,
        neighbours: &'a Neighbourhoods,
        node_ops: Vec<NodeOperator>,
        route_ops: Vec<RouteOperator>,
    ) -> Self {
        let mut type_start = Vec::with_capacity(data.num_vehicle_types() + 1);
        let mut routes = Vec::with_capacity(data.num_vehicles());

        for (vt_idx, vt) in data.vehicle_types().iter().enumerate() {
            type_start.push(routes.len());
            for _ in 0..vt.num_available() {
                routes.push(SearchRoute::new(data, routes.len(), vt_idx));
            }
        }
        type_start.push(routes.len());

        let num_slots = routes.len();

        Self {
            data,
            neighbours,
            node_ops,
            route_ops,
            routes,
            type_start,
            client_pos: vec![None; data.num_locations()],
            scan_order: Vec::with_capacity(data.num_clients()),
            pair_stamp: vec![0; num_slots * num_slots],
            num_moves: 0,
            best_improvement: false,
        }
    }

    /// Switches between first-improvement (default) and best-improvement
    /// node scanning.
    pub fn set_best_improvement(&mut self, best: bool) {
        self.best_improvement = best;
    }

    /// Improves the given solution until no registered operator finds a
    /// strictly improving move under the evaluator.
    ///
    /// Clients unassigned in the input stay unassigned; the result's cost
    /// never exceeds the input's under the same penalties.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvariantViolation`] if the search state
    /// desynchronises after an applied move, and propagates route
    /// construction errors when rebuilding the improved solution.
    pub fn search(
        &mut self,
        solution: &Solution,
        eval: &CostEvaluator,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Solution, SolverError> {
        self.load(solution)?;

        loop {
            let improved_nodes = self.node_pass(eval, rng)?;
            if improved_nodes {
                continue;
            }

            if !self.route_pass(eval)? {
                break;
            }
        }

        self.unload()
    }

    fn load(&mut self, solution: &Solution) -> Result<(), SolverError> {
        self.num_moves = 1;
        self.pair_stamp.fill(0);
        self.client_pos.fill(None);

        let mut next_slot: Vec<usize> = self.type_start[..self.type_start.len() - 1].to_vec();

        for route in &mut self.routes {
            route.set_visits(self.data, Vec::new(), 1);
        }

        for route in solution.routes() {
            let vt = route.vehicle_type();
            let slot = next_slot[vt];

            if slot >= self.type_start[vt + 1] {
                return Err(SolverError::InvalidRoute(format!(
                    "more routes of vehicle type {vt} than slots"
                )));
            }

            next_slot[vt] += 1;
            self.routes[slot].set_visits(self.data, route.visits().to_vec(), 1);
        }

        for slot in 0..self.routes.len() {
            self.index_route(slot);
        }

        Ok(())
    }

    fn unload(&self) -> Result<Solution, SolverError> {
        let routes = self
            .routes
            .iter()
            .filter(|r| !r.is_empty())
            .map(|r| Route::new(self.data, r.visits().to_vec(), r.vehicle_type()))
            .collect::<Result<Vec<_>, _>>()?;

        Solution::new(self.data, routes)
    }

    fn index_route(&mut self, slot: usize) {
        let visits: Vec<usize> = self.routes[slot].visits().to_vec();
        for (offset, loc) in visits.into_iter().enumerate() {
            self.client_pos[loc] = Some((slot, offset + 1));
        }
    }

    fn node_pass(
        &mut self,
        eval: &CostEvaluator,
        rng: &mut RandomNumberGenerator,
    ) -> Result<bool, SolverError> {
        self.scan_order.clear();
        self.scan_order.extend(
            self.data
                .client_indices()
                .filter(|&c| self.client_pos[c].is_some()),
        );
        let mut order = std::mem::take(&mut self.scan_order);
        rng.shuffle(&mut order);
        self.scan_order = order;

        let mut improved = false;

        for scan_idx in 0..self.scan_order.len() {
            let u = self.scan_order[scan_idx];
            if self.improve_client(eval, u)? {
                improved = true;
            }
        }

        Ok(improved)
    }

    /// Evaluates all node operators for client `u` against its granular
    /// neighbours, its own route's depot ends, and one empty slot per
    /// vehicle type. Applies the first (or best) strictly improving move.
    fn improve_client(&mut self, eval: &CostEvaluator, u: usize) -> Result<bool, SolverError> {
        let Some((ru, _)) = self.client_pos[u] else {
            return Ok(false);
        };
        let profile = self.routes[ru].profile(self.data);
        let all_neighbours = self.neighbours;
        let neighbours: &'a [usize] = &all_neighbours[profile][u];

        let mut best: Option<(i64, Move, &'static str)> = None;

        for &v in neighbours {
            let Some(v_pos) = self.client_pos[v] else {
                continue;
            };
            let u_pos = self.client_pos[u].expect("u stays assigned");

            for op_idx in 0..self.node_ops.len() {
                let op = self.node_ops[op_idx];
                if let Some((delta, mv)) = op.evaluate(self.data, eval, &self.routes, u_pos, v_pos)
                {
                    if delta < best.as_ref().map_or(0, |(d, ..)| *d) {
                        best = Some((delta, mv, op.name()));
                        if !self.best_improvement {
                            self.apply(mv, op.name())?;
                            trace!(client = u, op = op.name(), delta, "applied node move");
                            return Ok(true);
                        }
                    }
                }
            }
        }

        // Depot ends of u's own route, and one empty slot per vehicle
        // type: relocation targets only.
        let mut depot_targets: Vec<(usize, usize)> = Vec::with_capacity(2 + self.type_start.len());
        let (ru_now, _) = self.client_pos[u].expect("u stays assigned");
        depot_targets.push((ru_now, 0));
        depot_targets.push((ru_now, self.routes[ru_now].len()));

        for vt in 0..self.data.num_vehicle_types() {
            let empty = (self.type_start[vt]..self.type_start[vt + 1])
                .find(|&slot| self.routes[slot].is_empty());
            if let Some(slot) = empty {
                depot_targets.push((slot, 0));
            }
        }

        for v_pos in depot_targets {
            let u_pos = self.client_pos[u].expect("u stays assigned");

            for op_idx in 0..self.node_ops.len() {
                let op = self.node_ops[op_idx];
                if !matches!(op, NodeOperator::Relocate { .. }) {
                    continue;
                }

                if let Some((delta, mv)) = op.evaluate(self.data, eval, &self.routes, u_pos, v_pos)
                {
                    if delta < best.as_ref().map_or(0, |(d, ..)| *d) {
                        best = Some((delta, mv, op.name()));
                        if !self.best_improvement {
                            self.apply(mv, op.name())?;
                            trace!(client = u, op = op.name(), delta, "applied depot move");
                            return Ok(true);
                        }
                    }
                }
            }
        }

        if let Some((delta, mv, name)) = best {
            self.apply(mv, name)?;
            trace!(client = u, op = name, delta, "applied best node move");
            return Ok(true);
        }

        Ok(false)
    }

    fn route_pass(&mut self, eval: &CostEvaluator) -> Result<bool, SolverError> {
        let num_slots = self.routes.len();
        let mut improved = false;

        for r1 in 0..num_slots {
            for r2 in r1 + 1..num_slots {
                if self.routes[r1].is_empty() || self.routes[r2].is_empty() {
                    continue;
                }

                let stamp = self.pair_stamp[r1 * num_slots + r2];
                let modified = self.routes[r1]
                    .last_modified()
                    .max(self.routes[r2].last_modified());
                if modified <= stamp {
                    continue;
                }

                self.pair_stamp[r1 * num_slots + r2] = self.num_moves;

                for op_idx in 0..self.route_ops.len() {
                    let op = self.route_ops[op_idx];
                    if let Some((delta, mv)) =
                        op.evaluate(self.data, eval, &self.routes[r1], &self.routes[r2])
                    {
                        if delta < 0 {
                            self.apply(mv, op.name())?;
                            trace!(r1, r2, op = op.name(), delta, "applied route move");
                            improved = true;
                            break;
                        }
                    }
                }
            }
        }

        Ok(improved)
    }

    fn apply(&mut self, mv: Move, op_name: &str) -> Result<(), SolverError> {
        self.num_moves += 1;
        let stamp = self.num_moves;

        match mv {
            Move::Relocate {
                from,
                pos,
                count,
                to,
                after,
            } => {
                let block: Vec<usize> =
                    self.routes[from].visits()[pos - 1..pos + count - 1].to_vec();

                if from == to {
                    let mut visits = self.routes[from].visits().to_vec();
                    visits.drain(pos - 1..pos + count - 1);
                    // Positions after the removed block shift left.
                    let insert_at = if after < pos { after } else { after - count };
                    for (offset, &loc) in block.iter().enumerate() {
                        visits.insert(insert_at + offset, loc);
                    }
                    self.routes[from].set_visits(self.data, visits, stamp);
                } else {
                    let mut visits_u = self.routes[from].visits().to_vec();
                    visits_u.drain(pos - 1..pos + count - 1);

                    let mut visits_v = self.routes[to].visits().to_vec();
                    for (offset, &loc) in block.iter().enumerate() {
                        visits_v.insert(after + offset, loc);
                    }

                    self.routes[from].set_visits(self.data, visits_u, stamp);
                    self.routes[to].set_visits(self.data, visits_v, stamp);
                }
            }
            Move::SwapSegments {
                ru,
                pu,
                u_count,
                rv,
                pv,
                v_count,
            } => {
                let block_u: Vec<usize> =
                    self.routes[ru].visits()[pu - 1..pu + u_count - 1].to_vec();
                let block_v: Vec<usize> =
                    self.routes[rv].visits()[pv - 1..pv + v_count - 1].to_vec();

                if ru == rv {
                    let (first, first_count, second, second_count, first_block, second_block) =
                        if pu < pv {
                            (pu, u_count, pv, v_count, block_v, block_u)
                        } else {
                            (pv, v_count, pu, u_count, block_u, block_v)
                        };

                    let mut visits = self.routes[ru].visits().to_vec();
                    // Replace the later segment first so earlier indices
                    // stay valid.
                    visits.splice(second - 1..second + second_count - 1, second_block);
                    visits.splice(first - 1..first + first_count - 1, first_block);
                    self.routes[ru].set_visits(self.data, visits, stamp);
                } else {
                    let mut visits_u = self.routes[ru].visits().to_vec();
                    visits_u.splice(pu - 1..pu + u_count - 1, block_v);

                    let mut visits_v = self.routes[rv].visits().to_vec();
                    visits_v.splice(pv - 1..pv + v_count - 1, block_u);

                    self.routes[ru].set_visits(self.data, visits_u, stamp);
                    self.routes[rv].set_visits(self.data, visits_v, stamp);
                }
            }
            Move::Reverse { route, from, to } => {
                let mut visits = self.routes[route].visits().to_vec();
                visits[from - 1..to].reverse();
                self.routes[route].set_visits(self.data, visits, stamp);
            }
            Move::SwapTails { ru, pu, rv, pv } => {
                let visits_u = self.routes[ru].visits().to_vec();
                let visits_v = self.routes[rv].visits().to_vec();

                let mut new_u = visits_u[..pu].to_vec();
                new_u.extend_from_slice(&visits_v[pv..]);

                let mut new_v = visits_v[..pv].to_vec();
                new_v.extend_from_slice(&visits_u[pu..]);

                self.routes[ru].set_visits(self.data, new_u, stamp);
                self.routes[rv].set_visits(self.data, new_v, stamp);
            }
            Move::SwapStar {
                ru,
                pu,
                rv,
                pv,
                u_after,
                v_after,
            } => {
                let u_loc = self.routes[ru].visits()[pu - 1];
                let v_loc = self.routes[rv].visits()[pv - 1];

                let new_u = rebuild_visits(self.routes[ru].visits(), pu, v_after, v_loc);
                let new_v = rebuild_visits(self.routes[rv].visits(), pv, u_after, u_loc);

                self.routes[ru].set_visits(self.data, new_u, stamp);
                self.routes[rv].set_visits(self.data, new_v, stamp);
            }
        }

        for &slot in &mv.routes() {
            self.index_route(slot);
        }

        self.check_indexing(&mv, op_name)
    }

    /// Cheap desync detection: every visit of a touched route must map
    /// back to its slot and position.
    fn check_indexing(&self, mv: &Move, op_name: &str) -> Result<(), SolverError> {
        for &slot in &mv.routes() {
            for (offset, &loc) in self.routes[slot].visits().iter().enumerate() {
                if self.client_pos[loc] != Some((slot, offset + 1)) {
                    return Err(SolverError::InvariantViolation {
                        operator: op_name.to_string(),
                        routes: mv.routes(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Cached routes, exposed for state checks in tests.
    #[cfg(test)]
    pub(crate) fn routes(&self) -> &[SearchRoute] {
        &self.routes
    }
}
