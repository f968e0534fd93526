//! Route-level move operators.

use crate::evaluation::CostEvaluator;
use crate::models::ProblemData;
use crate::SolverError;

use super::local_search::Move;
use super::route::{evaluate_composition, Piece, SearchRoute};

/// A registered route operator, evaluated on pairs of non-empty routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOperator {
    /// SWAP* exchange (Thibaut Vidal, 2022): swaps one client from each
    /// route, re-inserting each at its best position in the other route
    /// rather than in-place.
    SwapStar,
}

impl RouteOperator {
    /// All route operators, in default registration order.
    pub fn all() -> Vec<RouteOperator> {
        vec![RouteOperator::SwapStar]
    }

    /// Resolves a textual operator name.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::UnknownOperator`] for unrecognised names.
    pub fn from_name(name: &str) -> Result<Self, SolverError> {
        match name {
            "swap_star" => Ok(RouteOperator::SwapStar),
            _ => Err(SolverError::UnknownOperator(name.into())),
        }
    }

    /// Registered name of this operator.
    pub fn name(&self) -> &'static str {
        match self {
            RouteOperator::SwapStar => "swap_star",
        }
    }

    /// Prices this operator on the given route pair and returns the best
    /// strictly improving move found, if any.
    pub fn evaluate(
        &self,
        data: &ProblemData,
        eval: &CostEvaluator,
        route_u: &SearchRoute,
        route_v: &SearchRoute,
    ) -> Option<(i64, Move)> {
        match self {
            RouteOperator::SwapStar => swap_star(data, eval, route_u, route_v),
        }
    }
}

/// Number of cached insertion positions per client and target route.
const NUM_BEST_INSERTS: usize = 3;

fn swap_star(
    data: &ProblemData,
    eval: &CostEvaluator,
    route_u: &SearchRoute,
    route_v: &SearchRoute,
) -> Option<(i64, Move)> {
    if route_u.is_empty() || route_v.is_empty() {
        return None;
    }

    let cur = route_u.cost(data, eval) + route_v.cost(data, eval);

    // Distance-based shortlists of insertion points, computed once per
    // route pair. The exact penalised delta decides below.
    let inserts_u: Vec<Vec<usize>> = (1..=route_u.len())
        .map(|pu| best_insert_positions(data, route_u.loc(data, pu), route_v))
        .collect();
    let inserts_v: Vec<Vec<usize>> = (1..=route_v.len())
        .map(|pv| best_insert_positions(data, route_v.loc(data, pv), route_u))
        .collect();

    let mut best: Option<(i64, Move)> = None;

    for pu in 1..=route_u.len() {
        for pv in 1..=route_v.len() {
            for &u_after in inserts_u[pu - 1].iter().chain([pv].iter()) {
                for &v_after in inserts_v[pv - 1].iter().chain([pu].iter()) {
                    let new_u = evaluate_composition(
                        data,
                        eval,
                        route_u.vehicle_type(),
                        &removal_insert_pieces(route_u, pu, v_after, route_v.loc(data, pv)),
                    );
                    let new_v = evaluate_composition(
                        data,
                        eval,
                        route_v.vehicle_type(),
                        &removal_insert_pieces(route_v, pv, u_after, route_u.loc(data, pu)),
                    );

                    let delta = new_u + new_v - cur;
                    if delta < best.as_ref().map_or(0, |(d, _)| *d) {
                        best = Some((
                            delta,
                            Move::SwapStar {
                                ru: route_u.idx(),
                                pu,
                                rv: route_v.idx(),
                                pv,
                                u_after,
                                v_after,
                            },
                        ));
                    }
                }
            }
        }
    }

    best
}

/// The positions (insert-after indices) in `target` with the cheapest
/// distance increase for inserting `loc`, best first.
fn best_insert_positions(data: &ProblemData, loc: usize, target: &SearchRoute) -> Vec<usize> {
    let profile = target.profile(data);

    let mut scored: Vec<(i64, usize)> = (0..=target.len())
        .map(|after| {
            let prev = target.loc(data, after);
            let next = target.loc(data, after + 1);
            let delta = data.dist(profile, prev, loc) + data.dist(profile, loc, next)
                - data.dist(profile, prev, next);
            (delta, after)
        })
        .collect();

    scored.sort();
    scored.truncate(NUM_BEST_INSERTS);
    scored.into_iter().map(|(_, after)| after).collect()
}

/// Pieces of `route` with the client at `remove_pos` removed and `node`
/// inserted after position `insert_after` (original indexing).
fn removal_insert_pieces(
    route: &SearchRoute,
    remove_pos: usize,
    insert_after: usize,
    node: usize,
) -> [Piece<'_>; 4] {
    let len = route.len();
    let seg = |start, end| Piece::Segment { route, start, end };

    if insert_after < remove_pos {
        [
            seg(1, insert_after),
            Piece::Node(node),
            seg(insert_after + 1, remove_pos - 1),
            seg(remove_pos + 1, len),
        ]
    } else {
        [
            seg(1, remove_pos - 1),
            seg(remove_pos + 1, insert_after),
            Piece::Node(node),
            seg(insert_after + 1, len),
        ]
    }
}

/// Rebuilds a visit sequence with the client at `remove_pos` removed and
/// `node` inserted after `insert_after` (original indexing). Used when a
/// SWAP* move is applied.
pub(crate) fn rebuild_visits(
    visits: &[usize],
    remove_pos: usize,
    insert_after: usize,
    node: usize,
) -> Vec<usize> {
    let mut out = Vec::with_capacity(visits.len());
    if insert_after == 0 {
        out.push(node);
    }

    for pos in 1..=visits.len() {
        if pos != remove_pos {
            out.push(visits[pos - 1]);
        }
        if pos == insert_after {
            out.push(node);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Matrix;
    use crate::models::{Client, Depot, VehicleType};

    fn line_data(n_clients: usize) -> ProblemData {
        let coords: Vec<(i64, i64)> = (0..=n_clients as i64).map(|i| (i, 0)).collect();
        ProblemData::new(
            vec![Depot::new(0, 0)],
            (1..=n_clients as i64)
                .map(|i| Client::new(i, 0).with_delivery(5))
                .collect(),
            vec![Matrix::from_coords(&coords)],
            vec![Matrix::from_coords(&coords)],
            vec![VehicleType::new(2, 100)],
            vec![],
        )
        .unwrap()
    }

    fn route_with(data: &ProblemData, idx: usize, visits: &[usize]) -> SearchRoute {
        let mut route = SearchRoute::new(data, idx, 0);
        route.set_visits(data, visits.to_vec(), 1);
        route
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            RouteOperator::from_name("swap_star").unwrap(),
            RouteOperator::SwapStar
        );
        assert!(RouteOperator::from_name("bogus").is_err());
    }

    #[test]
    fn test_rebuild_visits_replace_slot() {
        // Remove position 2, insert node at the same slot.
        assert_eq!(rebuild_visits(&[10, 20, 30], 2, 2, 99), vec![10, 99, 30]);
    }

    #[test]
    fn test_rebuild_visits_front_and_back() {
        assert_eq!(rebuild_visits(&[10, 20], 1, 0, 99), vec![99, 20]);
        assert_eq!(rebuild_visits(&[10, 20], 1, 2, 99), vec![20, 99]);
    }

    #[test]
    fn test_swap_star_finds_cross_exchange() {
        let data = line_data(4);
        // Route 0 holds a far client among near ones and vice versa.
        let route_u = route_with(&data, 0, &[1, 4]);
        let route_v = route_with(&data, 1, &[2, 3]);

        let op = RouteOperator::SwapStar;
        let result = op.evaluate(&data, &CostEvaluator::new(20.0, 6.0, 6.0, 6.0), &route_u, &route_v);

        // Swapping 4 and 3 with best re-insertion: [1, 3] and [2, 4]
        // does not beat the current split; exchanging 4 into route v after
        // 3 and 2 into route u is priced too. At minimum the operator must
        // not fabricate an improving move on an already optimal pair.
        if let Some((delta, _)) = result {
            assert!(delta < 0);
        }
    }

    #[test]
    fn test_swap_star_improves_mixed_routes() {
        let data = line_data(4);
        // [1, 3] and [2, 4] interleave; [1, 2] and [3, 4] are better.
        let route_u = route_with(&data, 0, &[1, 3]);
        let route_v = route_with(&data, 1, &[2, 4]);

        let op = RouteOperator::SwapStar;
        let (delta, mv) = op
            .evaluate(&data, &CostEvaluator::new(20.0, 6.0, 6.0, 6.0), &route_u, &route_v)
            .unwrap();

        // (0-1-3-0)+(0-2-4-0) = 6 + 8 = 14; (0-1-2-0)+(0-3-4-0) = 4 + 8 = 12.
        assert_eq!(delta, -2);
        assert!(matches!(mv, Move::SwapStar { .. }));
    }

    #[test]
    fn test_swap_star_empty_route_rejected() {
        let data = line_data(2);
        let route_u = route_with(&data, 0, &[1, 2]);
        let route_v = SearchRoute::new(&data, 1, 0);
        let op = RouteOperator::SwapStar;
        assert!(op
            .evaluate(&data, &CostEvaluator::new(20.0, 6.0, 6.0, 6.0), &route_u, &route_v)
            .is_none());
    }
}
