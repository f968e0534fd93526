//! Initial solution construction.
//!
//! # Algorithm
//!
//! Randomised sweep: sorts clients by polar angle around the first depot,
//! starting the sweep at a random angle, then packs them into vehicles in
//! fleet order while respecting capacity. Geographic clustering puts
//! clients with similar angles on the same route.
//!
//! # Reference
//!
//! Gillett, B.E. & Miller, L.R. (1974). "A Heuristic Algorithm for the
//! Vehicle-Dispatch Problem", *Operations Research* 22(2), 340-349.

use crate::models::{ProblemData, Route, Solution};
use crate::{RandomNumberGenerator, SolverError};

/// Builds a solution by a randomised sweep around the first depot.
///
/// Clients that do not fit any remaining vehicle are left unassigned.
/// The sweep respects capacity only; time windows and route limits are
/// left to the local search that follows construction.
///
/// # Errors
///
/// Propagates route construction errors (which indicate corrupt input
/// rather than an unlucky sweep).
pub fn sweep(data: &ProblemData, rng: &mut RandomNumberGenerator) -> Result<Solution, SolverError> {
    if data.num_clients() == 0 {
        return Ok(Solution::empty(data));
    }

    let (depot_x, depot_y) = data.coords(0);
    let offset = rng.rand() * std::f64::consts::TAU;

    let mut angle_order: Vec<(f64, usize)> = data
        .client_indices()
        .map(|c| {
            let (x, y) = data.coords(c);
            let angle = ((y - depot_y) as f64).atan2((x - depot_x) as f64);
            ((angle + offset).rem_euclid(std::f64::consts::TAU), c)
        })
        .collect();

    angle_order.sort_by(|a, b| a.partial_cmp(b).expect("angles are finite"));

    // One (vehicle type, capacity) entry per vehicle, in fleet order.
    let mut fleet: Vec<usize> = Vec::with_capacity(data.num_vehicles());
    for (vt_idx, vt) in data.vehicle_types().iter().enumerate() {
        fleet.extend(std::iter::repeat(vt_idx).take(vt.num_available()));
    }

    let mut routes = Vec::new();
    let mut vehicle = 0;
    let mut load = 0;
    let mut visits: Vec<usize> = Vec::new();

    for &(_, client_idx) in &angle_order {
        let client = data.client(client_idx);
        let demand = client.delivery().max(client.pickup());

        if vehicle >= fleet.len() {
            break; // Fleet exhausted: the rest stays unassigned.
        }

        let capacity = data.vehicle_type(fleet[vehicle]).capacity();
        if load + demand > capacity && !visits.is_empty() {
            routes.push(Route::new(data, std::mem::take(&mut visits), fleet[vehicle])?);
            vehicle += 1;
            load = 0;

            if vehicle >= fleet.len() {
                break;
            }
        }

        if demand <= data.vehicle_type(fleet[vehicle]).capacity() {
            visits.push(client_idx);
            load += demand;
        }
        // A client whose demand alone exceeds capacity stays unassigned.
    }

    if !visits.is_empty() && vehicle < fleet.len() {
        routes.push(Route::new(data, visits, fleet[vehicle])?);
    }

    Solution::new(data, routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Matrix;
    use crate::models::{Client, Depot, VehicleType};

    fn square_data(capacity: i64, vehicles: usize) -> ProblemData {
        let coords = [(0, 0), (1, 1), (-1, 1), (-1, -1), (1, -1)];
        ProblemData::new(
            vec![Depot::new(0, 0)],
            coords[1..]
                .iter()
                .map(|&(x, y)| Client::new(x, y).with_delivery(10))
                .collect(),
            vec![Matrix::from_coords(&coords)],
            vec![Matrix::from_coords(&coords)],
            vec![VehicleType::new(vehicles, capacity)],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_sweep_serves_all_when_capacity_allows() {
        let data = square_data(40, 1);
        let mut rng = RandomNumberGenerator::new(42);
        let sol = sweep(&data, &mut rng).unwrap();
        assert_eq!(sol.num_clients(), 4);
        assert_eq!(sol.num_routes(), 1);
        assert!(sol.unassigned().is_empty());
    }

    #[test]
    fn test_sweep_splits_by_capacity() {
        let data = square_data(20, 2);
        let mut rng = RandomNumberGenerator::new(42);
        let sol = sweep(&data, &mut rng).unwrap();
        assert_eq!(sol.num_routes(), 2);
        assert_eq!(sol.num_clients(), 4);
    }

    #[test]
    fn test_sweep_leaves_overflow_unassigned() {
        let data = square_data(20, 1);
        let mut rng = RandomNumberGenerator::new(42);
        let sol = sweep(&data, &mut rng).unwrap();
        assert_eq!(sol.num_clients(), 2);
        assert_eq!(sol.unassigned().len(), 2);
    }

    #[test]
    fn test_sweep_empty_instance() {
        let coords = [(0, 0)];
        let data = ProblemData::new(
            vec![Depot::new(0, 0)],
            vec![],
            vec![Matrix::from_coords(&coords)],
            vec![Matrix::from_coords(&coords)],
            vec![VehicleType::new(1, 10)],
            vec![],
        )
        .unwrap();
        let mut rng = RandomNumberGenerator::new(1);
        let sol = sweep(&data, &mut rng).unwrap();
        assert_eq!(sol.num_routes(), 0);
    }

    #[test]
    fn test_sweep_is_deterministic() {
        let data = square_data(20, 2);
        let mut rng1 = RandomNumberGenerator::new(5);
        let mut rng2 = RandomNumberGenerator::new(5);
        assert_eq!(sweep(&data, &mut rng1).unwrap(), sweep(&data, &mut rng2).unwrap());
    }

    #[test]
    fn test_sweep_varies_with_seed() {
        let data = square_data(20, 2);
        let solutions: Vec<Solution> = (0..8)
            .map(|seed| {
                let mut rng = RandomNumberGenerator::new(seed);
                sweep(&data, &mut rng).unwrap()
            })
            .collect();

        // Different start angles produce at least two distinct sweeps.
        assert!(solutions.iter().any(|s| *s != solutions[0]));
    }
}
