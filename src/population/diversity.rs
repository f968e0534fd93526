//! Pairwise solution diversity.

use crate::models::{ProblemData, Solution};

/// Broken-pairs distance between two solutions, in `[0, 1]`.
///
/// The fraction of clients whose successor differs between the two
/// solutions. A client's successor is the location visited directly after
/// it (the end depot for the last client of a route); unassigned clients
/// have no successor.
///
/// # Examples
///
/// ```
/// use hypervrp::distance::Matrix;
/// use hypervrp::models::{Client, Depot, ProblemData, Route, Solution, VehicleType};
/// use hypervrp::population::broken_pairs_distance;
///
/// let coords = [(0, 0), (1, 0), (2, 0)];
/// let data = ProblemData::new(
///     vec![Depot::new(0, 0)],
///     vec![Client::new(1, 0), Client::new(2, 0)],
///     vec![Matrix::from_coords(&coords)],
///     vec![Matrix::from_coords(&coords)],
///     vec![VehicleType::new(1, 10)],
///     vec![],
/// )
/// .unwrap();
///
/// let a = Solution::new(&data, vec![Route::new(&data, vec![1, 2], 0).unwrap()]).unwrap();
/// let b = Solution::new(&data, vec![Route::new(&data, vec![2, 1], 0).unwrap()]).unwrap();
/// assert_eq!(broken_pairs_distance(&data, &a, &a), 0.0);
/// assert_eq!(broken_pairs_distance(&data, &a, &b), 1.0);
/// ```
pub fn broken_pairs_distance(data: &ProblemData, first: &Solution, second: &Solution) -> f64 {
    if data.num_clients() == 0 {
        return 0.0;
    }

    let succ_first = successors(data, first);
    let succ_second = successors(data, second);

    let num_broken = data
        .client_indices()
        .filter(|&c| succ_first[c] != succ_second[c])
        .count();

    num_broken as f64 / data.num_clients() as f64
}

/// Successor location of each client; `None` when unassigned.
fn successors(data: &ProblemData, solution: &Solution) -> Vec<Option<usize>> {
    let mut succ = vec![None; data.num_locations()];

    for route in solution.routes() {
        let visits = route.visits();
        let end_depot = data.vehicle_type(route.vehicle_type()).end_depot();

        for (pos, &client) in visits.iter().enumerate() {
            let next = visits.get(pos + 1).copied().unwrap_or(end_depot);
            succ[client] = Some(next);
        }
    }

    succ
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Matrix;
    use crate::models::{Client, Depot, Route, VehicleType};

    fn line_data(n_clients: usize) -> ProblemData {
        let coords: Vec<(i64, i64)> = (0..=n_clients as i64).map(|i| (i, 0)).collect();
        ProblemData::new(
            vec![Depot::new(0, 0)],
            (1..=n_clients as i64).map(|i| Client::new(i, 0)).collect(),
            vec![Matrix::from_coords(&coords)],
            vec![Matrix::from_coords(&coords)],
            vec![VehicleType::new(2, 100)],
            vec![],
        )
        .unwrap()
    }

    fn solution_with(data: &ProblemData, visits: &[&[usize]]) -> Solution {
        let routes = visits
            .iter()
            .map(|vs| Route::new(data, vs.to_vec(), 0).unwrap())
            .collect();
        Solution::new(data, routes).unwrap()
    }

    #[test]
    fn test_identical_solutions_have_zero_distance() {
        let data = line_data(4);
        let sol = solution_with(&data, &[&[1, 2], &[3, 4]]);
        assert_eq!(broken_pairs_distance(&data, &sol, &sol), 0.0);
    }

    #[test]
    fn test_partial_difference() {
        let data = line_data(4);
        let a = solution_with(&data, &[&[1, 2, 3, 4]]);
        let b = solution_with(&data, &[&[1, 2, 4, 3]]);
        // Successors differ for 2? No: succ(1)=2 in both, succ(2)=3 vs 4,
        // succ(3)=4 vs depot, succ(4)=depot vs 3. Three of four broken.
        assert_eq!(broken_pairs_distance(&data, &a, &b), 0.75);
    }

    #[test]
    fn test_symmetry() {
        let data = line_data(4);
        let a = solution_with(&data, &[&[1, 2], &[3, 4]]);
        let b = solution_with(&data, &[&[1, 3], &[2, 4]]);
        assert_eq!(
            broken_pairs_distance(&data, &a, &b),
            broken_pairs_distance(&data, &b, &a)
        );
    }

    #[test]
    fn test_unassigned_counts_as_broken() {
        let data = line_data(2);
        let full = solution_with(&data, &[&[1, 2]]);
        let partial = solution_with(&data, &[&[1]]);
        // succ(1): 2 vs depot; succ(2): depot vs None.
        assert_eq!(broken_pairs_distance(&data, &full, &partial), 1.0);
    }

    #[test]
    fn test_bounded_by_one() {
        let data = line_data(3);
        let a = solution_with(&data, &[&[1, 2, 3]]);
        let b = solution_with(&data, &[&[3, 2, 1]]);
        let d = broken_pairs_distance(&data, &a, &b);
        assert!((0.0..=1.0).contains(&d));
    }
}
