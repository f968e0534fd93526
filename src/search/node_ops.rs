//! Node-level move operators.
//!
//! Each operator prices a move involving the client at `u` and the
//! location at `v` (a client, or a depot position for relocations) and
//! returns the exact penalised-cost delta together with the move to apply.
//! All evaluations compose existing route segments, so no route is
//! mutated while pricing.

use crate::evaluation::CostEvaluator;
use crate::models::ProblemData;
use crate::SolverError;

use super::local_search::Move;
use super::route::{evaluate_composition, Piece, SearchRoute};

/// A registered node operator.
///
/// Operators are closed variants with a uniform evaluate contract; the
/// configuration layer resolves textual names against [`NodeOperator::from_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOperator {
    /// Moves `count` consecutive clients starting at `u` to directly after
    /// `v`.
    Relocate {
        /// Number of consecutive clients moved (1 or 2).
        count: usize,
    },
    /// Exchanges `u_count` consecutive clients at `u` with `v_count`
    /// consecutive clients at `v`.
    Swap {
        /// Segment length at `u`.
        u_count: usize,
        /// Segment length at `v`.
        v_count: usize,
    },
    /// Reverses the stretch between `u` and `v` within one route, or
    /// exchanges route tails after `u` and `v` between two routes.
    TwoOpt,
}

impl NodeOperator {
    /// All node operators, in default registration order.
    pub fn all() -> Vec<NodeOperator> {
        vec![
            NodeOperator::Relocate { count: 1 },
            NodeOperator::Relocate { count: 2 },
            NodeOperator::Swap { u_count: 1, v_count: 1 },
            NodeOperator::Swap { u_count: 2, v_count: 1 },
            NodeOperator::Swap { u_count: 2, v_count: 2 },
            NodeOperator::TwoOpt,
        ]
    }

    /// Resolves a textual operator name.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::UnknownOperator`] for unrecognised names.
    pub fn from_name(name: &str) -> Result<Self, SolverError> {
        match name {
            "relocate" => Ok(NodeOperator::Relocate { count: 1 }),
            "relocate_two" => Ok(NodeOperator::Relocate { count: 2 }),
            "swap_one_one" => Ok(NodeOperator::Swap { u_count: 1, v_count: 1 }),
            "swap_two_one" => Ok(NodeOperator::Swap { u_count: 2, v_count: 1 }),
            "swap_two_two" => Ok(NodeOperator::Swap { u_count: 2, v_count: 2 }),
            "two_opt" => Ok(NodeOperator::TwoOpt),
            _ => Err(SolverError::UnknownOperator(name.into())),
        }
    }

    /// Registered name of this operator.
    pub fn name(&self) -> &'static str {
        match self {
            NodeOperator::Relocate { count: 1 } => "relocate",
            NodeOperator::Relocate { .. } => "relocate_two",
            NodeOperator::Swap { u_count: 1, v_count: 1 } => "swap_one_one",
            NodeOperator::Swap { u_count: 2, v_count: 1 } => "swap_two_one",
            NodeOperator::Swap { .. } => "swap_two_two",
            NodeOperator::TwoOpt => "two_opt",
        }
    }

    /// Prices this operator for the client at `u = (route, pos)` against
    /// `v = (route, pos)`. For relocations `v` may be a depot position
    /// (`pos == 0` or `pos == len`); other operators require a client.
    ///
    /// Returns the cost delta and the move, or `None` when the move is
    /// structurally invalid.
    pub fn evaluate(
        &self,
        data: &ProblemData,
        eval: &CostEvaluator,
        routes: &[SearchRoute],
        u: (usize, usize),
        v: (usize, usize),
    ) -> Option<(i64, Move)> {
        match *self {
            NodeOperator::Relocate { count } => relocate(data, eval, routes, u, v, count),
            NodeOperator::Swap { u_count, v_count } => {
                swap(data, eval, routes, u, v, u_count, v_count)
            }
            NodeOperator::TwoOpt => two_opt(data, eval, routes, u, v),
        }
    }
}

fn seg(route: &SearchRoute, start: usize, end: usize) -> Piece<'_> {
    Piece::Segment { route, start, end }
}

fn relocate(
    data: &ProblemData,
    eval: &CostEvaluator,
    routes: &[SearchRoute],
    (ru, pu): (usize, usize),
    (rv, pv): (usize, usize),
    count: usize,
) -> Option<(i64, Move)> {
    let route_u = &routes[ru];
    let len_u = route_u.len();

    if pu + count - 1 > len_u {
        return None;
    }

    let mv = Move::Relocate {
        from: ru,
        pos: pu,
        count,
        to: rv,
        after: pv,
    };

    if ru == rv {
        // Moving the block after any position inside (or directly before)
        // itself is the identity.
        if pv + 1 >= pu && pv <= pu + count - 1 {
            return None;
        }

        let cur = route_u.cost(data, eval);
        let last = pu + count - 1;
        let pieces: [Piece; 4] = if pv < pu {
            [
                seg(route_u, 1, pv),
                seg(route_u, pu, last),
                seg(route_u, pv + 1, pu - 1),
                seg(route_u, last + 1, len_u),
            ]
        } else {
            [
                seg(route_u, 1, pu - 1),
                seg(route_u, last + 1, pv),
                seg(route_u, pu, last),
                seg(route_u, pv + 1, len_u),
            ]
        };

        let new = evaluate_composition(data, eval, route_u.vehicle_type(), &pieces);
        return Some((new - cur, mv));
    }

    let route_v = &routes[rv];
    if pv > route_v.len() {
        return None;
    }

    let cur = route_u.cost(data, eval) + route_v.cost(data, eval);
    let last = pu + count - 1;

    let new_u = evaluate_composition(
        data,
        eval,
        route_u.vehicle_type(),
        &[seg(route_u, 1, pu - 1), seg(route_u, last + 1, len_u)],
    );
    let new_v = evaluate_composition(
        data,
        eval,
        route_v.vehicle_type(),
        &[
            seg(route_v, 1, pv),
            seg(route_u, pu, last),
            seg(route_v, pv + 1, route_v.len()),
        ],
    );

    Some((new_u + new_v - cur, mv))
}

fn swap(
    data: &ProblemData,
    eval: &CostEvaluator,
    routes: &[SearchRoute],
    (ru, pu): (usize, usize),
    (rv, pv): (usize, usize),
    u_count: usize,
    v_count: usize,
) -> Option<(i64, Move)> {
    // Symmetric segment lengths: each unordered pair prices identically,
    // so only evaluate the canonical orientation.
    if u_count == v_count && (rv, pv) < (ru, pu) {
        return None;
    }

    let route_u = &routes[ru];
    let route_v = &routes[rv];

    if pv == 0 || pu + u_count - 1 > route_u.len() || pv + v_count - 1 > route_v.len() {
        return None;
    }

    let u_last = pu + u_count - 1;
    let v_last = pv + v_count - 1;

    let mv = Move::SwapSegments {
        ru,
        pu,
        u_count,
        rv,
        pv,
        v_count,
    };

    if ru == rv {
        // Segments must not overlap.
        if pu <= v_last && pv <= u_last {
            return None;
        }

        let (first, first_last, second, second_last) = if pu < pv {
            (pu, u_last, pv, v_last)
        } else {
            (pv, v_last, pu, u_last)
        };

        let cur = route_u.cost(data, eval);
        let pieces: [Piece; 5] = [
            seg(route_u, 1, first - 1),
            seg(route_u, second, second_last),
            seg(route_u, first_last + 1, second - 1),
            seg(route_u, first, first_last),
            seg(route_u, second_last + 1, route_u.len()),
        ];
        let new = evaluate_composition(data, eval, route_u.vehicle_type(), &pieces);
        return Some((new - cur, mv));
    }

    let cur = route_u.cost(data, eval) + route_v.cost(data, eval);

    let new_u = evaluate_composition(
        data,
        eval,
        route_u.vehicle_type(),
        &[
            seg(route_u, 1, pu - 1),
            seg(route_v, pv, v_last),
            seg(route_u, u_last + 1, route_u.len()),
        ],
    );
    let new_v = evaluate_composition(
        data,
        eval,
        route_v.vehicle_type(),
        &[
            seg(route_v, 1, pv - 1),
            seg(route_u, pu, u_last),
            seg(route_v, v_last + 1, route_v.len()),
        ],
    );

    Some((new_u + new_v - cur, mv))
}

fn two_opt(
    data: &ProblemData,
    eval: &CostEvaluator,
    routes: &[SearchRoute],
    (ru, pu): (usize, usize),
    (rv, pv): (usize, usize),
) -> Option<(i64, Move)> {
    let route_u = &routes[ru];
    let route_v = &routes[rv];

    if pv == 0 {
        return None;
    }

    if ru == rv {
        // Reversing fewer than two clients is the identity.
        if pv < pu + 2 {
            return None;
        }

        let cur = route_u.cost(data, eval);
        let pieces: [Piece; 3] = [
            seg(route_u, 1, pu),
            Piece::Reversed {
                route: route_u,
                start: pu + 1,
                end: pv,
            },
            seg(route_u, pv + 1, route_u.len()),
        ];
        let new = evaluate_composition(data, eval, route_u.vehicle_type(), &pieces);

        return Some((new - cur, Move::Reverse { route: ru, from: pu + 1, to: pv }));
    }

    // Tail exchange prices the same for (u, v) and (v, u).
    if (rv, pv) < (ru, pu) {
        return None;
    }

    let cur = route_u.cost(data, eval) + route_v.cost(data, eval);

    let new_u = evaluate_composition(
        data,
        eval,
        route_u.vehicle_type(),
        &[seg(route_u, 1, pu), seg(route_v, pv + 1, route_v.len())],
    );
    let new_v = evaluate_composition(
        data,
        eval,
        route_v.vehicle_type(),
        &[seg(route_v, 1, pv), seg(route_u, pu + 1, route_u.len())],
    );

    Some((new_u + new_v - cur, Move::SwapTails { ru, pu, rv, pv }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Matrix;
    use crate::models::{Client, Depot, VehicleType};

    fn line_data(n_clients: usize, capacity: i64) -> ProblemData {
        let coords: Vec<(i64, i64)> = (0..=n_clients as i64).map(|i| (i, 0)).collect();
        ProblemData::new(
            vec![Depot::new(0, 0)],
            (1..=n_clients as i64)
                .map(|i| Client::new(i, 0).with_delivery(5))
                .collect(),
            vec![Matrix::from_coords(&coords)],
            vec![Matrix::from_coords(&coords)],
            vec![VehicleType::new(2, capacity)],
            vec![],
        )
        .unwrap()
    }

    fn routes_with(data: &ProblemData, visits: &[&[usize]]) -> Vec<SearchRoute> {
        visits
            .iter()
            .enumerate()
            .map(|(idx, vs)| {
                let mut route = SearchRoute::new(data, idx, 0);
                route.set_visits(data, vs.to_vec(), 1);
                route
            })
            .collect()
    }

    fn eval() -> CostEvaluator {
        CostEvaluator::new(20.0, 6.0, 6.0, 6.0)
    }

    #[test]
    fn test_from_name_round_trip() {
        for op in NodeOperator::all() {
            assert_eq!(NodeOperator::from_name(op.name()).unwrap(), op);
        }
        assert!(NodeOperator::from_name("no_such_op").is_err());
    }

    #[test]
    fn test_relocate_improves_detour() {
        let data = line_data(3, 100);
        // [2, 1, 3] zig-zags; relocating 1 before 2 fixes it.
        let routes = routes_with(&data, &[&[2, 1, 3]]);
        let op = NodeOperator::Relocate { count: 1 };

        // Client 1 is at position 2; move it after the start depot.
        let (delta, _) = op
            .evaluate(&data, &eval(), &routes, (0, 2), (0, 0))
            .unwrap();
        // [2,1,3]: 2+1+1+2+3 = wrong; distances: 0->2 =2, 2->1=1, 1->3=2, 3->0=3 => 8.
        // [1,2,3]: 1+1+1+3 = 6. Delta -2.
        assert_eq!(delta, -2);
    }

    #[test]
    fn test_relocate_identity_rejected() {
        let data = line_data(3, 100);
        let routes = routes_with(&data, &[&[1, 2, 3]]);
        let op = NodeOperator::Relocate { count: 1 };

        // Moving client 2 after client 1 (its predecessor) is the identity.
        assert!(op.evaluate(&data, &eval(), &routes, (0, 2), (0, 1)).is_none());
        // As is moving it after itself.
        assert!(op.evaluate(&data, &eval(), &routes, (0, 2), (0, 2)).is_none());
    }

    #[test]
    fn test_relocate_between_routes() {
        let data = line_data(3, 100);
        let routes = routes_with(&data, &[&[1, 3], &[2]]);
        let op = NodeOperator::Relocate { count: 1 };

        // Move client 2 between 1 and 3: (0-1-3-0) + (0-2-0) = 6 + 4 = 10
        // becomes (0-1-2-3-0) = 6 and an empty route.
        let (delta, mv) = op
            .evaluate(&data, &eval(), &routes, (1, 1), (0, 1))
            .unwrap();
        assert_eq!(delta, -4);
        assert!(matches!(mv, Move::Relocate { from: 1, to: 0, .. }));
    }

    #[test]
    fn test_relocate_respects_capacity_penalty() {
        let data = line_data(2, 5);
        let routes = routes_with(&data, &[&[1], &[2]]);
        let op = NodeOperator::Relocate { count: 1 };

        // Merging both clients into one route overloads it (10 > 5): the
        // 20x load penalty dwarfs the distance saving.
        let (delta, _) = op
            .evaluate(&data, &eval(), &routes, (1, 1), (0, 1))
            .unwrap();
        assert!(delta > 0);
    }

    #[test]
    fn test_relocate_two_moves_block() {
        let data = line_data(4, 100);
        let routes = routes_with(&data, &[&[3, 4, 1, 2]]);
        let op = NodeOperator::Relocate { count: 2 };

        // Move block [1, 2] to the front: [1, 2, 3, 4].
        let (delta, _) = op
            .evaluate(&data, &eval(), &routes, (0, 3), (0, 0))
            .unwrap();
        // Before: 0-3-4-1-2-0 = 3+1+3+1+2 = 10; after: 1+1+1+1+4 = 8.
        assert_eq!(delta, -2);
    }

    #[test]
    fn test_swap_between_routes() {
        let data = line_data(4, 100);
        // Crossed assignment: route 0 has far client, route 1 has near one.
        let routes = routes_with(&data, &[&[1, 4], &[2, 3]]);
        let op = NodeOperator::Swap { u_count: 1, v_count: 1 };

        // Swap 4 (route 0 pos 2) with 3 (route 1 pos 2)? Both orientations
        // priced once; use the canonical one.
        let result = op.evaluate(&data, &eval(), &routes, (0, 2), (1, 2));
        assert!(result.is_some());
        let (delta, _) = result.unwrap();
        // [1,4],[2,3]: (1+3+4) + (2+1+3) = 8 + 6 = 14
        // [1,3],[2,4]: (1+2+3) + (2+2+4) = 6 + 8 = 14 -> delta 0
        assert_eq!(delta, 0);
    }

    #[test]
    fn test_swap_overlap_rejected() {
        let data = line_data(4, 100);
        let routes = routes_with(&data, &[&[1, 2, 3, 4]]);
        let op = NodeOperator::Swap { u_count: 2, v_count: 2 };
        // Segments [2,3] and [3,4] overlap.
        assert!(op.evaluate(&data, &eval(), &routes, (0, 2), (0, 3)).is_none());
    }

    #[test]
    fn test_swap_two_one() {
        let data = line_data(3, 100);
        let routes = routes_with(&data, &[&[2, 3], &[1]]);
        let op = NodeOperator::Swap { u_count: 2, v_count: 1 };

        let result = op.evaluate(&data, &eval(), &routes, (0, 1), (1, 1));
        assert!(result.is_some());
    }

    #[test]
    fn test_two_opt_intra_fixes_crossing() {
        let data = line_data(4, 100);
        // [1, 3, 2, 4] has a crossing; reversing positions 2..3 fixes it.
        let routes = routes_with(&data, &[&[1, 3, 2, 4]]);
        let op = NodeOperator::TwoOpt;

        let (delta, mv) = op
            .evaluate(&data, &eval(), &routes, (0, 1), (0, 3))
            .unwrap();
        // Before: 1+2+1+2+4 = 10; after [1,2,3,4]: 1+1+1+1+4 = 8.
        assert_eq!(delta, -2);
        assert!(matches!(mv, Move::Reverse { route: 0, from: 2, to: 3 }));
    }

    #[test]
    fn test_two_opt_tails() {
        let data = line_data(4, 100);
        // Route 0: [1, 4], route 1: [3, 2]; swapping tails after pos 1
        // yields [1, 2] and [3, 4].
        let routes = routes_with(&data, &[&[1, 4], &[3, 2]]);
        let op = NodeOperator::TwoOpt;

        let (delta, mv) = op
            .evaluate(&data, &eval(), &routes, (0, 1), (1, 1))
            .unwrap();
        // Before: (1+3+4) + (3+1+2) = 8 + 6 = 14
        // After:  (1+1+2) + (3+1+4) = 4 + 8 = 12
        assert_eq!(delta, -2);
        assert!(matches!(mv, Move::SwapTails { .. }));
    }

    #[test]
    fn test_two_opt_short_reversal_rejected() {
        let data = line_data(3, 100);
        let routes = routes_with(&data, &[&[1, 2, 3]]);
        let op = NodeOperator::TwoOpt;
        assert!(op.evaluate(&data, &eval(), &routes, (0, 1), (0, 2)).is_none());
    }
}
