//! Granular neighbourhood computation.

use serde::Deserialize;

use crate::models::ProblemData;
use crate::SolverError;

/// For each profile and each location, the ordered list of granular
/// neighbour clients. Depot rows are empty.
pub type Neighbourhoods = Vec<Vec<Vec<usize>>>;

/// Parameters for granular neighbourhood computation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NeighbourhoodParams {
    /// Weight of expected waiting time in the proximity score.
    pub weight_wait_time: f64,
    /// Weight of expected time warp in the proximity score.
    pub weight_time_warp: f64,
    /// Number of neighbours kept per client.
    pub nb_granular: usize,
}

impl Default for NeighbourhoodParams {
    fn default() -> Self {
        Self {
            weight_wait_time: 0.2,
            weight_time_warp: 1.0,
            nb_granular: 40,
        }
    }
}

/// Computes the granular neighbourhood of every client, per profile.
///
/// The proximity of `d` to `c` combines the round-trip travel distance
/// with penalties for time-window incompatibility in either visit order
/// and for waiting when serving `d` directly after `c`. The `nb_granular`
/// closest clients are kept, ties broken by client index. The result may
/// be asymmetric and is never rebuilt during a run.
///
/// # Errors
///
/// Returns [`SolverError::InvalidParameter`] when `nb_granular` is zero.
pub fn compute_neighbours(
    data: &ProblemData,
    params: &NeighbourhoodParams,
) -> Result<Neighbourhoods, SolverError> {
    if params.nb_granular == 0 {
        return Err(SolverError::InvalidParameter(
            "nb_granular must be positive".into(),
        ));
    }

    let mut by_profile = Vec::with_capacity(data.num_profiles());

    for profile in 0..data.num_profiles() {
        let mut rows = vec![Vec::new(); data.num_locations()];

        for c in data.client_indices() {
            let mut scored: Vec<(f64, usize)> = data
                .client_indices()
                .filter(|&d| d != c)
                .map(|d| (proximity(data, params, profile, c, d), d))
                .collect();

            scored.sort_by(|a, b| a.partial_cmp(b).expect("proximity is finite"));
            scored.truncate(params.nb_granular);

            rows[c] = scored.into_iter().map(|(_, d)| d).collect();
        }

        by_profile.push(rows);
    }

    Ok(by_profile)
}

fn proximity(
    data: &ProblemData,
    params: &NeighbourhoodParams,
    profile: usize,
    c: usize,
    d: usize,
) -> f64 {
    let client_c = data.client(c);
    let client_d = data.client(d);

    let travel = (data.dist(profile, c, d) + data.dist(profile, d, c)) as f64;

    let warp_cd =
        client_d.tw_early() - (client_c.tw_late() + client_c.service_duration() + data.dur(profile, c, d));
    let warp_dc =
        client_c.tw_early() - (client_d.tw_late() + client_d.service_duration() + data.dur(profile, d, c));
    let wait_cd =
        client_d.tw_early() - client_c.tw_late() - client_c.service_duration() - data.dur(profile, c, d);

    travel
        + params.weight_time_warp * (warp_cd.max(0) + warp_dc.max(0)) as f64
        + params.weight_wait_time * wait_cd.max(0) as f64
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
            (1..=n_clients as i64).map(|i| Client::new(i, 0)).collect(),
            vec![Matrix::from_coords(&coords)],
            vec![Matrix::from_coords(&coords)],
            vec![VehicleType::new(1, 100)],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_zero_granularity() {
        let data = line_data(3);
        let params = NeighbourhoodParams {
            nb_granular: 0,
            ..NeighbourhoodParams::default()
        };
        assert!(compute_neighbours(&data, &params).is_err());
    }

    #[test]
    fn test_neighbours_exclude_self_and_depots() {
        let data = line_data(4);
        let neighbours = compute_neighbours(&data, &NeighbourhoodParams::default()).unwrap();

        assert!(neighbours[0][0].is_empty());
        for c in 1..=4 {
            assert!(!neighbours[0][c].contains(&c));
            assert!(!neighbours[0][c].contains(&0));
        }
    }

    #[test]
    fn test_neighbours_sorted_by_distance() {
        let data = line_data(4);
        let neighbours = compute_neighbours(&data, &NeighbourhoodParams::default()).unwrap();
        // Client 1 at (1, 0): nearest is 2, then 3, then 4.
        assert_eq!(neighbours[0][1], vec![2, 3, 4]);
        // Client 3 at (3, 0): clients 2 and 4 are equidistant; tie broken
        // by index.
        assert_eq!(neighbours[0][3], vec![2, 4, 1]);
    }

    #[test]
    fn test_granularity_truncates() {
        let data = line_data(5);
        let params = NeighbourhoodParams {
            nb_granular: 2,
            ..NeighbourhoodParams::default()
        };
        let neighbours = compute_neighbours(&data, &params).unwrap();
        for c in 1..=5 {
            assert_eq!(neighbours[0][c].len(), 2);
        }
    }

    #[test]
    fn test_time_windows_affect_proximity() {
        let coords = [(0, 0), (0, 1), (1, 0), (1, 1)];
        let data = ProblemData::new(
            vec![Depot::new(0, 0)],
            vec![
                Client::new(0, 1).with_time_window(0, 10),
                // Equidistant from client 1, but one opens much later: the
                // late window induces waiting, pushing it further away.
                Client::new(1, 0).with_time_window(0, 1_000),
                Client::new(1, 1).with_time_window(900, 1_000),
            ],
            vec![Matrix::from_coords(&coords)],
            vec![Matrix::from_coords(&coords)],
            vec![VehicleType::new(1, 100)],
            vec![],
        )
        .unwrap();

        let neighbours = compute_neighbours(&data, &NeighbourhoodParams::default()).unwrap();
        assert_eq!(neighbours[0][1][0], 2);
    }
}
