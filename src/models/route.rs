//! Vehicle-typed route with derived quantities.

use serde::{Deserialize, Serialize};

use crate::search::segments::{DurationSegment, LoadSegment};
use crate::SolverError;

use super::ProblemData;

/// An ordered sequence of client visits served by one vehicle of a given
/// type. The route starts at the type's start depot and ends at its end
/// depot; neither depot is stored in `visits`.
///
/// All derived quantities (distance, load, duration, time warp, excesses,
/// start time, centroid) are computed once at construction in O(len).
///
/// # Examples
///
/// ```
/// use hypervrp::distance::Matrix;
/// use hypervrp::models::{Client, Depot, ProblemData, Route, VehicleType};
///
/// let data = ProblemData::new(
///     vec![Depot::new(0, 0)],
///     vec![Client::new(3, 4).with_delivery(5)],
///     vec![Matrix::from_coords(&[(0, 0), (3, 4)])],
///     vec![Matrix::from_coords(&[(0, 0), (3, 4)])],
///     vec![VehicleType::new(1, 10)],
///     vec![],
/// )
/// .unwrap();
///
/// let route = Route::new(&data, vec![1], 0).unwrap();
/// assert_eq!(route.distance(), 10);
/// assert_eq!(route.delivery(), 5);
/// assert!(route.is_feasible());
/// ```
#[derive(Debug, Clone)]
pub struct Route {
    vehicle_type: usize,
    visits: Vec<usize>,
    distance: i64,
    excess_distance: i64,
    delivery: i64,
    pickup: i64,
    excess_load: i64,
    duration: i64,
    time_warp: i64,
    excess_duration: i64,
    release_time: i64,
    start_time: i64,
    centroid: (f64, f64),
}

impl Route {
    /// Creates a route and computes its derived quantities.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidRoute`] when the vehicle type is
    /// unknown, a visit is not a client location, or a client appears more
    /// than once.
    pub fn new(data: &ProblemData, visits: Vec<usize>, vehicle_type: usize) -> Result<Self, SolverError> {
        if vehicle_type >= data.num_vehicle_types() {
            return Err(SolverError::InvalidRoute(format!(
                "unknown vehicle type {vehicle_type}"
            )));
        }

        let mut seen = vec![false; data.num_locations()];
        for &visit in &visits {
            if visit >= data.num_locations() || data.is_depot(visit) {
                return Err(SolverError::InvalidRoute(format!(
                    "visit {visit} is not a client location"
                )));
            }

            if seen[visit] {
                return Err(SolverError::InvalidRoute(format!(
                    "client {visit} appears more than once"
                )));
            }
            seen[visit] = true;
        }

        let vt = data.vehicle_type(vehicle_type);
        let profile = vt.profile();

        let mut distance = 0;
        let mut load = LoadSegment::empty();
        let mut schedule = DurationSegment::depot(vt.tw_early(), vt.tw_late());
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;

        let mut prev = vt.start_depot();
        for &visit in &visits {
            let client = data.client(visit);
            distance += data.dist(profile, prev, visit);
            load = load.merge(LoadSegment::client(client.delivery(), client.pickup()));
            schedule = schedule.merge(
                data.dur(profile, prev, visit),
                DurationSegment::client(
                    client.service_duration(),
                    client.tw_early(),
                    client.tw_late(),
                    client.release_time(),
                ),
            );
            sum_x += client.x() as f64;
            sum_y += client.y() as f64;
            prev = visit;
        }

        if !visits.is_empty() {
            distance += data.dist(profile, prev, vt.end_depot());
            schedule = schedule.merge(
                data.dur(profile, prev, vt.end_depot()),
                DurationSegment::depot(vt.tw_early(), vt.tw_late()),
            );
        }

        let len = visits.len().max(1) as f64;
        let duration = schedule.duration();

        Ok(Self {
            vehicle_type,
            distance,
            excess_distance: (distance - vt.max_distance()).max(0),
            delivery: load.delivery(),
            pickup: load.pickup(),
            excess_load: load.excess_load(vt.capacity()),
            duration,
            time_warp: schedule.time_warp(),
            excess_duration: (duration - vt.max_duration()).max(0),
            release_time: schedule.release(),
            start_time: schedule.start_time(),
            centroid: (sum_x / len, sum_y / len),
            visits,
        })
    }

    /// Vehicle type serving this route.
    pub fn vehicle_type(&self) -> usize {
        self.vehicle_type
    }

    /// Ordered client visits (depots excluded).
    pub fn visits(&self) -> &[usize] {
        &self.visits
    }

    /// Number of clients visited.
    pub fn len(&self) -> usize {
        self.visits.len()
    }

    /// Returns `true` if the route visits no clients.
    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    /// Total travel distance.
    pub fn distance(&self) -> i64 {
        self.distance
    }

    /// Distance beyond the vehicle type's maximum.
    pub fn excess_distance(&self) -> i64 {
        self.excess_distance
    }

    /// Total delivery demand.
    pub fn delivery(&self) -> i64 {
        self.delivery
    }

    /// Total pickup demand.
    pub fn pickup(&self) -> i64 {
        self.pickup
    }

    /// Peak load beyond the vehicle type's capacity.
    pub fn excess_load(&self) -> i64 {
        self.excess_load
    }

    /// Route duration under the earliest minimal-waiting schedule.
    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// Total time warp (time-window infeasibility measure).
    pub fn time_warp(&self) -> i64 {
        self.time_warp
    }

    /// Duration beyond the vehicle type's maximum.
    pub fn excess_duration(&self) -> i64 {
        self.excess_duration
    }

    /// Largest release time among the visited clients.
    pub fn release_time(&self) -> i64 {
        self.release_time
    }

    /// Earliest departure time from the start depot.
    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    /// Mean client coordinates, used as the route's location.
    pub fn centroid(&self) -> (f64, f64) {
        self.centroid
    }

    /// Returns `true` if the route violates no constraint.
    pub fn is_feasible(&self) -> bool {
        self.excess_load == 0
            && self.time_warp == 0
            && self.excess_distance == 0
            && self.excess_duration == 0
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.vehicle_type == other.vehicle_type && self.visits == other.visits
    }
}

impl Eq for Route {}

/// Plain serializable form of a route: vehicle type plus visit sequence.
///
/// Used to move solutions across process boundaries; rebuild a full
/// [`Route`] with [`Route::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    /// Vehicle type index.
    pub vehicle_type: usize,
    /// Ordered client visits.
    pub visits: Vec<usize>,
}

impl From<&Route> for RouteSpec {
    fn from(route: &Route) -> Self {
        Self {
            vehicle_type: route.vehicle_type(),
            visits: route.visits().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Matrix;
    use crate::models::{Client, Depot, VehicleType};

    fn small_data() -> ProblemData {
        let coords = [(0, 0), (1, 0), (2, 0), (3, 0)];
        ProblemData::new(
            vec![Depot::new(0, 0)],
            vec![
                Client::new(1, 0).with_delivery(5).with_service_duration(2),
                Client::new(2, 0).with_delivery(5),
                Client::new(3, 0).with_pickup(4),
            ],
            vec![Matrix::from_coords(&coords)],
            vec![Matrix::from_coords(&coords)],
            vec![VehicleType::new(2, 10)],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_route_distance_and_load() {
        let data = small_data();
        let route = Route::new(&data, vec![1, 2], 0).unwrap();
        // 0 -> 1 -> 2 -> 0 = 1 + 1 + 2
        assert_eq!(route.distance(), 4);
        assert_eq!(route.delivery(), 10);
        assert_eq!(route.excess_load(), 0);
        assert!(route.is_feasible());
    }

    #[test]
    fn test_route_excess_load() {
        let data = small_data();
        let route = Route::new(&data, vec![1, 2, 3], 0).unwrap();
        // Deliveries 10 plus pickup 4 never exceed capacity together: the
        // peak is max(10 on departure, 4 + deliveries pending...) = 10.
        assert_eq!(route.excess_load(), 0);

        let heavy = ProblemData::new(
            vec![Depot::new(0, 0)],
            vec![Client::new(1, 0).with_delivery(15)],
            vec![Matrix::from_coords(&[(0, 0), (1, 0)])],
            vec![Matrix::from_coords(&[(0, 0), (1, 0)])],
            vec![VehicleType::new(1, 10)],
            vec![],
        )
        .unwrap();
        let route = Route::new(&heavy, vec![1], 0).unwrap();
        assert_eq!(route.excess_load(), 5);
        assert!(!route.is_feasible());
    }

    #[test]
    fn test_route_duration_includes_service() {
        let data = small_data();
        let route = Route::new(&data, vec![1], 0).unwrap();
        // Travel 1 + service 2 + travel 1.
        assert_eq!(route.duration(), 4);
        assert_eq!(route.time_warp(), 0);
    }

    #[test]
    fn test_route_rejects_depot_visit() {
        let data = small_data();
        assert!(matches!(
            Route::new(&data, vec![0, 1], 0),
            Err(SolverError::InvalidRoute(_))
        ));
    }

    #[test]
    fn test_route_rejects_duplicate() {
        let data = small_data();
        assert!(matches!(
            Route::new(&data, vec![1, 1], 0),
            Err(SolverError::InvalidRoute(_))
        ));
    }

    #[test]
    fn test_route_rejects_unknown_vehicle_type() {
        let data = small_data();
        assert!(matches!(
            Route::new(&data, vec![1], 9),
            Err(SolverError::InvalidRoute(_))
        ));
    }

    #[test]
    fn test_empty_route() {
        let data = small_data();
        let route = Route::new(&data, vec![], 0).unwrap();
        assert!(route.is_empty());
        assert_eq!(route.distance(), 0);
        assert_eq!(route.duration(), 0);
        assert!(route.is_feasible());
    }

    #[test]
    fn test_route_centroid() {
        let data = small_data();
        let route = Route::new(&data, vec![1, 3], 0).unwrap();
        assert!((route.centroid().0 - 2.0).abs() < 1e-10);
        assert!((route.centroid().1 - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_route_spec_round_trip() {
        let data = small_data();
        let route = Route::new(&data, vec![3, 1], 0).unwrap();
        let spec = RouteSpec::from(&route);
        let rebuilt = Route::new(&data, spec.visits.clone(), spec.vehicle_type).unwrap();
        assert_eq!(route, rebuilt);
    }
}
