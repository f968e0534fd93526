//! Immutable problem instance.

use tracing::warn;

use crate::distance::Matrix;
use crate::{SolverError, MAX_VALUE};

use super::{Client, ClientGroup, Depot, VehicleType};

/// An immutable vehicle routing problem instance.
///
/// Locations are indexed depots-first: depots occupy `[0, num_depots)` and
/// clients `[num_depots, num_locations)`. One distance and one duration
/// matrix exist per profile; vehicle types reference a profile and a pair
/// of depots. The instance is validated once at construction and never
/// changes for the lifetime of a run.
///
/// # Examples
///
/// ```
/// use hypervrp::distance::Matrix;
/// use hypervrp::models::{Client, Depot, ProblemData, VehicleType};
///
/// let data = ProblemData::new(
///     vec![Depot::new(0, 0)],
///     vec![Client::new(1, 0).with_delivery(5)],
///     vec![Matrix::from_coords(&[(0, 0), (1, 0)])],
///     vec![Matrix::from_coords(&[(0, 0), (1, 0)])],
///     vec![VehicleType::new(1, 10)],
///     vec![],
/// )
/// .unwrap();
/// assert_eq!(data.num_depots(), 1);
/// assert_eq!(data.num_clients(), 1);
/// assert_eq!(data.num_vehicles(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ProblemData {
    depots: Vec<Depot>,
    clients: Vec<Client>,
    distances: Vec<Matrix>,
    durations: Vec<Matrix>,
    vehicle_types: Vec<VehicleType>,
    groups: Vec<ClientGroup>,
}

impl ProblemData {
    /// Creates and validates a problem instance.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidData`] when there is no depot or no
    /// vehicle type, when matrix shapes do not match the location count,
    /// when a vehicle type references an unknown depot or profile, when a
    /// client time window or group reference is inconsistent, or when any
    /// demand or duration is negative.
    pub fn new(
        depots: Vec<Depot>,
        clients: Vec<Client>,
        distances: Vec<Matrix>,
        durations: Vec<Matrix>,
        vehicle_types: Vec<VehicleType>,
        groups: Vec<ClientGroup>,
    ) -> Result<Self, SolverError> {
        let num_locations = depots.len() + clients.len();

        if depots.is_empty() {
            return Err(SolverError::InvalidData("at least one depot".into()));
        }

        if vehicle_types.is_empty() {
            return Err(SolverError::InvalidData("at least one vehicle type".into()));
        }

        if distances.is_empty() || distances.len() != durations.len() {
            return Err(SolverError::InvalidData(
                "need one distance and one duration matrix per profile".into(),
            ));
        }

        for matrix in distances.iter().chain(durations.iter()) {
            if matrix.size() != num_locations {
                return Err(SolverError::InvalidData(format!(
                    "matrix size {} does not match {} locations",
                    matrix.size(),
                    num_locations
                )));
            }

            if matrix.max() > MAX_VALUE {
                warn!(
                    max = matrix.max(),
                    "matrix entry exceeds MAX_VALUE; cost aggregation may saturate"
                );
            }
        }

        for vt in &vehicle_types {
            if vt.start_depot() >= depots.len() || vt.end_depot() >= depots.len() {
                return Err(SolverError::InvalidData(format!(
                    "vehicle type references depot outside [0, {})",
                    depots.len()
                )));
            }

            if vt.profile() >= distances.len() {
                return Err(SolverError::InvalidData(format!(
                    "vehicle type references profile {} outside [0, {})",
                    vt.profile(),
                    distances.len()
                )));
            }

            if vt.capacity() < 0 || vt.tw_early() > vt.tw_late() {
                return Err(SolverError::InvalidData(
                    "vehicle type has negative capacity or inverted shift window".into(),
                ));
            }
        }

        for (idx, client) in clients.iter().enumerate() {
            if client.tw_early() > client.tw_late() {
                return Err(SolverError::InvalidData(format!(
                    "client {} has inverted time window",
                    depots.len() + idx
                )));
            }

            if client.delivery() < 0 || client.pickup() < 0 || client.service_duration() < 0 {
                return Err(SolverError::InvalidData(format!(
                    "client {} has negative demand or service duration",
                    depots.len() + idx
                )));
            }

            if let Some(group) = client.group() {
                let location = depots.len() + idx;
                let member = groups
                    .get(group)
                    .map(|g| g.clients().contains(&location))
                    .unwrap_or(false);

                if !member {
                    return Err(SolverError::InvalidData(format!(
                        "client {location} references group {group} it is not a member of"
                    )));
                }
            }
        }

        for (idx, group) in groups.iter().enumerate() {
            for &location in group.clients() {
                let in_range = location >= depots.len() && location < num_locations;
                let back_ref =
                    in_range && clients[location - depots.len()].group() == Some(idx);

                if !back_ref {
                    return Err(SolverError::InvalidData(format!(
                        "group {idx} lists location {location} without a matching back-reference"
                    )));
                }
            }
        }

        Ok(Self {
            depots,
            clients,
            distances,
            durations,
            vehicle_types,
            groups,
        })
    }

    /// Number of depots.
    pub fn num_depots(&self) -> usize {
        self.depots.len()
    }

    /// Number of clients.
    pub fn num_clients(&self) -> usize {
        self.clients.len()
    }

    /// Number of locations (depots + clients).
    pub fn num_locations(&self) -> usize {
        self.depots.len() + self.clients.len()
    }

    /// Number of matrix profiles.
    pub fn num_profiles(&self) -> usize {
        self.distances.len()
    }

    /// Number of vehicle types.
    pub fn num_vehicle_types(&self) -> usize {
        self.vehicle_types.len()
    }

    /// Total number of vehicles across all types.
    pub fn num_vehicles(&self) -> usize {
        self.vehicle_types.iter().map(|vt| vt.num_available()).sum()
    }

    /// Number of client groups.
    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    /// Returns the depot at the given location index.
    ///
    /// # Panics
    ///
    /// Panics if `location` is not a depot index.
    pub fn depot(&self, location: usize) -> &Depot {
        &self.depots[location]
    }

    /// Returns the client at the given location index.
    ///
    /// # Panics
    ///
    /// Panics if `location` is not a client index.
    pub fn client(&self, location: usize) -> &Client {
        &self.clients[location - self.depots.len()]
    }

    /// Returns `true` if the location index denotes a depot.
    pub fn is_depot(&self, location: usize) -> bool {
        location < self.depots.len()
    }

    /// Coordinates of any location.
    pub fn coords(&self, location: usize) -> (i64, i64) {
        if self.is_depot(location) {
            let d = &self.depots[location];
            (d.x(), d.y())
        } else {
            let c = self.client(location);
            (c.x(), c.y())
        }
    }

    /// Vehicle type by index.
    pub fn vehicle_type(&self, idx: usize) -> &VehicleType {
        &self.vehicle_types[idx]
    }

    /// All vehicle types.
    pub fn vehicle_types(&self) -> &[VehicleType] {
        &self.vehicle_types
    }

    /// Client group by index.
    pub fn group(&self, idx: usize) -> &ClientGroup {
        &self.groups[idx]
    }

    /// All client groups.
    pub fn groups(&self) -> &[ClientGroup] {
        &self.groups
    }

    /// Distance matrix for the given profile.
    pub fn distance_matrix(&self, profile: usize) -> &Matrix {
        &self.distances[profile]
    }

    /// Duration matrix for the given profile.
    pub fn duration_matrix(&self, profile: usize) -> &Matrix {
        &self.durations[profile]
    }

    /// Travel distance between two locations under the given profile.
    #[inline]
    pub fn dist(&self, profile: usize, from: usize, to: usize) -> i64 {
        self.distances[profile].get(from, to)
    }

    /// Travel duration between two locations under the given profile.
    #[inline]
    pub fn dur(&self, profile: usize, from: usize, to: usize) -> i64 {
        self.durations[profile].get(from, to)
    }

    /// Location indices of all clients.
    pub fn client_indices(&self) -> std::ops::Range<usize> {
        self.depots.len()..self.num_locations()
    }
}
