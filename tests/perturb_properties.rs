//! Property tests for destroy/repair conservation and summary agreement.

use proptest::prelude::*;

use hypervrp::distance::Matrix;
use hypervrp::evaluation::CostEvaluator;
use hypervrp::models::{Client, Depot, ProblemData, Route, Solution, VehicleType};
use hypervrp::perturb::{DestroyOperator, DestroyParams, RepairOperator};
use hypervrp::search::{compute_neighbours, NeighbourhoodParams};
use hypervrp::RandomNumberGenerator;

/// A small instance whose geometry is derived from the given seed.
fn instance(num_clients: usize, coord_seed: u64) -> ProblemData {
    let mut rng = RandomNumberGenerator::new(coord_seed);
    let mut coords = vec![(0, 0)];
    for _ in 0..num_clients {
        coords.push((rng.randint(100) as i64, rng.randint(100) as i64));
    }

    ProblemData::new(
        vec![Depot::new(0, 0)],
        coords[1..]
            .iter()
            .map(|&(x, y)| Client::new(x, y).with_delivery(1 + (x % 3)))
            .collect(),
        vec![Matrix::from_coords(&coords)],
        vec![Matrix::from_coords(&coords)],
        vec![VehicleType::new(num_clients, 10)],
        vec![],
    )
    .unwrap()
}

/// Packs all clients into routes of at most four visits.
fn initial_solution(data: &ProblemData) -> Solution {
    let clients: Vec<usize> = data.client_indices().collect();
    let routes = clients
        .chunks(4)
        .map(|chunk| Route::new(data, chunk.to_vec(), 0).unwrap())
        .collect();
    Solution::new(data, routes).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// After destroy + greedy repair no client is duplicated, and every
    /// client is either visited or explicitly unassigned.
    #[test]
    fn destroy_repair_conserves_clients(
        num_clients in 4usize..16,
        coord_seed in 0u64..500,
        run_seed in 0u64..500,
        op_idx in 0usize..3,
    ) {
        let data = instance(num_clients, coord_seed);
        let solution = initial_solution(&data);
        let neighbours = compute_neighbours(&data, &NeighbourhoodParams::default()).unwrap();
        let eval = CostEvaluator::new(20.0, 6.0, 6.0, 6.0);
        let mut rng = RandomNumberGenerator::new(run_seed);

        let destroy = DestroyOperator::all()[op_idx];
        let destroyed = destroy
            .destroy(&data, &solution, &neighbours, &DestroyParams::default(), &mut rng)
            .unwrap();
        let repaired = RepairOperator::Greedy
            .repair(&data, &destroyed, &eval, &mut rng)
            .unwrap();

        let mut seen = vec![0usize; data.num_locations()];
        for route in repaired.routes() {
            for &c in route.visits() {
                seen[c] += 1;
            }
        }
        for &c in repaired.unassigned() {
            seen[c] += 1;
        }

        for c in data.client_indices() {
            prop_assert_eq!(seen[c], 1, "client {} seen {} times", c, seen[c]);
        }
    }

    /// A route's cached totals agree with an independent recomputation
    /// from its visit sequence.
    #[test]
    fn route_totals_agree_with_recomputation(
        num_clients in 2usize..12,
        coord_seed in 0u64..500,
    ) {
        let data = instance(num_clients, coord_seed);
        let visits: Vec<usize> = data.client_indices().collect();
        let route = Route::new(&data, visits.clone(), 0).unwrap();

        let mut expected_distance = data.dist(0, 0, visits[0]);
        for pair in visits.windows(2) {
            expected_distance += data.dist(0, pair[0], pair[1]);
        }
        expected_distance += data.dist(0, visits[visits.len() - 1], 0);
        prop_assert_eq!(route.distance(), expected_distance);

        let expected_delivery: i64 = visits.iter().map(|&c| data.client(c).delivery()).sum();
        prop_assert_eq!(route.delivery(), expected_delivery);
    }

    /// Solutions rebuilt from their serialised form compare equal.
    #[test]
    fn specs_round_trip(
        num_clients in 2usize..12,
        coord_seed in 0u64..500,
    ) {
        let data = instance(num_clients, coord_seed);
        let solution = initial_solution(&data);
        let rebuilt = Solution::from_specs(&data, &solution.to_specs()).unwrap();
        prop_assert_eq!(&rebuilt, &solution);
    }
}
