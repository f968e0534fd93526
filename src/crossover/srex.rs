//! Selective route exchange crossover.
//!
//! Combines routes from two parents by exchanging a window of routes
//! chosen to maximise client overlap, then repairing the offspring with
//! greedy insertion.
//!
//! # Reference
//!
//! Nagata, Y. & Kobayashi, S. (2010). "A Memetic Algorithm for the Pickup
//! and Delivery Problem with Time Windows Using Selective Route Exchange
//! Crossover", *PPSN XI*, 536-545.

use crate::evaluation::CostEvaluator;
use crate::models::{ProblemData, Route, Solution};
use crate::perturb::RepairOperator;
use crate::{RandomNumberGenerator, SolverError};

/// Selective route exchange (SREX) between two parents.
///
/// Draws a start index into each parent's route list and a window size,
/// shifts both windows towards a local maximum of client overlap, builds
/// the two possible offspring (window of one parent transplanted into the
/// other), greedily repairs each, and returns the cheaper one under the
/// given evaluator.
///
/// Vehicle types travel with the exchanged routes; if that oversubscribes
/// a type, excess routes are reassigned to the first type with vehicles to
/// spare.
pub fn selective_route_exchange(
    parents: (&Solution, &Solution),
    data: &ProblemData,
    cost_evaluator: &CostEvaluator,
    rng: &mut RandomNumberGenerator,
) -> Result<Solution, SolverError> {
    let (first, second) = parents;

    if first.num_clients() == 0 {
        return Ok(second.clone());
    }

    if second.num_clients() == 0 {
        return Ok(first.clone());
    }

    let num_first = first.num_routes();
    let num_second = second.num_routes();

    let mut idx1 = rng.randint(num_first);
    let mut idx2 = if idx1 < num_second { idx1 } else { 0 };
    let num_moved = rng.randint(num_first.min(num_second)) + 1;

    // Shift the windows while doing so strictly increases the overlap
    // between the exchanged client sets.
    let mut overlap = window_overlap(data, first, second, idx1, idx2, num_moved);
    loop {
        let shifts = [
            ((idx1 + 1) % num_first, idx2),
            ((idx1 + num_first - 1) % num_first, idx2),
            (idx1, (idx2 + 1) % num_second),
            (idx1, (idx2 + num_second - 1) % num_second),
        ];

        let best = shifts
            .into_iter()
            .map(|(i1, i2)| (window_overlap(data, first, second, i1, i2, num_moved), i1, i2))
            .max_by_key(|&(o, ..)| o)
            .expect("four candidate shifts");

        if best.0 <= overlap {
            break;
        }

        overlap = best.0;
        idx1 = best.1;
        idx2 = best.2;
    }

    let window1: Vec<usize> = (0..num_moved).map(|k| (idx1 + k) % num_first).collect();
    let window2: Vec<usize> = (0..num_moved).map(|k| (idx2 + k) % num_second).collect();

    let offspring_a = build_offspring(data, cost_evaluator, first, &window1, second, &window2, rng)?;
    let offspring_b = build_offspring(data, cost_evaluator, second, &window2, first, &window1, rng)?;

    if cost_evaluator.penalised_cost(&offspring_a) <= cost_evaluator.penalised_cost(&offspring_b) {
        Ok(offspring_a)
    } else {
        Ok(offspring_b)
    }
}

/// SREX variant for heterogeneous fleets: routes are partitioned by
/// vehicle type and a window is exchanged per type (possibly empty), with
/// one greedy-repair sweep over the merged offspring at the end.
pub fn heterogeneous_selective_route_exchange(
    parents: (&Solution, &Solution),
    data: &ProblemData,
    cost_evaluator: &CostEvaluator,
    rng: &mut RandomNumberGenerator,
) -> Result<Solution, SolverError> {
    let (first, second) = parents;

    if first.num_clients() == 0 {
        return Ok(second.clone());
    }

    if second.num_clients() == 0 {
        return Ok(first.clone());
    }

    // Per-type route index lists.
    let by_type = |sol: &Solution| -> Vec<Vec<usize>> {
        let mut partition = vec![Vec::new(); data.num_vehicle_types()];
        for (idx, route) in sol.routes().iter().enumerate() {
            partition[route.vehicle_type()].push(idx);
        }
        partition
    };

    let part1 = by_type(first);
    let part2 = by_type(second);

    let mut out1: Vec<usize> = Vec::new(); // window route indices in first
    let mut out2: Vec<usize> = Vec::new(); // window route indices in second

    for vt in 0..data.num_vehicle_types() {
        let n1 = part1[vt].len();
        let n2 = part2[vt].len();
        let max_moved = n1.min(n2);

        // Zero moved routes is allowed: with a single vehicle of a type the
        // offspring takes that route from one parent or the other.
        let num_moved = if max_moved == 0 {
            0
        } else {
            rng.randint(max_moved + 1)
        };
        if num_moved == 0 {
            continue;
        }

        let mut idx1 = rng.randint(n1);
        let mut idx2 = if idx1 < n2 { idx1 } else { 0 };

        let mut overlap = typed_overlap(data, first, &part1[vt], second, &part2[vt], idx1, idx2, num_moved);
        loop {
            let shifts = [
                ((idx1 + 1) % n1, idx2),
                ((idx1 + n1 - 1) % n1, idx2),
                (idx1, (idx2 + 1) % n2),
                (idx1, (idx2 + n2 - 1) % n2),
            ];

            let best = shifts
                .into_iter()
                .map(|(i1, i2)| {
                    (
                        typed_overlap(data, first, &part1[vt], second, &part2[vt], i1, i2, num_moved),
                        i1,
                        i2,
                    )
                })
                .max_by_key(|&(o, ..)| o)
                .expect("four candidate shifts");

            if best.0 <= overlap {
                break;
            }

            overlap = best.0;
            idx1 = best.1;
            idx2 = best.2;
        }

        out1.extend((0..num_moved).map(|k| part1[vt][(idx1 + k) % n1]));
        out2.extend((0..num_moved).map(|k| part2[vt][(idx2 + k) % n2]));
    }

    let offspring_a = build_offspring(data, cost_evaluator, first, &out1, second, &out2, rng)?;
    let offspring_b = build_offspring(data, cost_evaluator, second, &out2, first, &out1, rng)?;

    if cost_evaluator.penalised_cost(&offspring_a) <= cost_evaluator.penalised_cost(&offspring_b) {
        Ok(offspring_a)
    } else {
        Ok(offspring_b)
    }
}

/// Number of clients appearing in both cyclic windows.
fn window_overlap(
    data: &ProblemData,
    first: &Solution,
    second: &Solution,
    idx1: usize,
    idx2: usize,
    num_moved: usize,
) -> usize {
    let window1: Vec<usize> = (0..num_moved).map(|k| (idx1 + k) % first.num_routes()).collect();
    let window2: Vec<usize> = (0..num_moved)
        .map(|k| (idx2 + k) % second.num_routes())
        .collect();

    overlap_between(data, first, &window1, second, &window2)
}

#[allow(clippy::too_many_arguments)]
fn typed_overlap(
    data: &ProblemData,
    first: &Solution,
    routes1: &[usize],
    second: &Solution,
    routes2: &[usize],
    idx1: usize,
    idx2: usize,
    num_moved: usize,
) -> usize {
    let window1: Vec<usize> = (0..num_moved)
        .map(|k| routes1[(idx1 + k) % routes1.len()])
        .collect();
    let window2: Vec<usize> = (0..num_moved)
        .map(|k| routes2[(idx2 + k) % routes2.len()])
        .collect();

    overlap_between(data, first, &window1, second, &window2)
}

fn overlap_between(
    data: &ProblemData,
    first: &Solution,
    window1: &[usize],
    second: &Solution,
    window2: &[usize],
) -> usize {
    let mut in_first = vec![false; data.num_locations()];
    for &route_idx in window1 {
        for &client in first.routes()[route_idx].visits() {
            in_first[client] = true;
        }
    }

    window2
        .iter()
        .flat_map(|&route_idx| second.routes()[route_idx].visits())
        .filter(|&&client| in_first[client])
        .count()
}

/// Builds one offspring: the `base` parent with its `base_window` routes
/// replaced by the `donor_window` routes of `donor`, duplicates dropped
/// from the kept routes, fleet oversubscription fixed, and unplanned
/// clients greedily re-inserted.
fn build_offspring(
    data: &ProblemData,
    cost_evaluator: &CostEvaluator,
    base: &Solution,
    base_window: &[usize],
    donor: &Solution,
    donor_window: &[usize],
    rng: &mut RandomNumberGenerator,
) -> Result<Solution, SolverError> {
    let mut donated = vec![false; data.num_locations()];
    let mut raw: Vec<(usize, Vec<usize>)> = Vec::with_capacity(base.num_routes() + donor_window.len());

    for &route_idx in donor_window {
        let route = &donor.routes()[route_idx];
        for &client in route.visits() {
            donated[client] = true;
        }
        raw.push((route.vehicle_type(), route.visits().to_vec()));
    }

    let mut in_base_window = vec![false; base.num_routes()];
    for &route_idx in base_window {
        in_base_window[route_idx] = true;
    }

    for (route_idx, route) in base.routes().iter().enumerate() {
        if in_base_window[route_idx] {
            continue;
        }

        let visits: Vec<usize> = route
            .visits()
            .iter()
            .copied()
            .filter(|&c| !donated[c])
            .collect();

        if !visits.is_empty() {
            raw.push((route.vehicle_type(), visits));
        }
    }

    // Fleet fix-up: reassign oversubscribed routes to the first type with
    // vehicles to spare; drop to unplanned only when the whole fleet is
    // exhausted.
    let mut used = vec![0usize; data.num_vehicle_types()];
    let mut routes = Vec::with_capacity(raw.len());

    for (vehicle_type, visits) in raw {
        let vt = if used[vehicle_type] < data.vehicle_type(vehicle_type).num_available() {
            Some(vehicle_type)
        } else {
            (0..data.num_vehicle_types())
                .find(|&t| used[t] < data.vehicle_type(t).num_available())
        };

        if let Some(vt) = vt {
            used[vt] += 1;
            routes.push(Route::new(data, visits, vt)?);
        }
    }

    let unrepaired = Solution::new(data, routes)?;
    RepairOperator::Greedy.repair(data, &unrepaired, cost_evaluator, rng)
}
