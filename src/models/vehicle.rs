//! Vehicle type records.

use serde::{Deserialize, Serialize};

use crate::MAX_VALUE;

/// A type of vehicle in the fleet.
///
/// Several identical vehicles may be available per type. Each route is
/// served by one vehicle of one type, starts at the type's start depot and
/// ends at its end depot, and must respect the type's capacity, shift time
/// window, and maximum route duration and distance.
///
/// # Examples
///
/// ```
/// use hypervrp::models::VehicleType;
///
/// let vt = VehicleType::new(3, 100)
///     .with_fixed_cost(50)
///     .with_max_distance(10_000);
/// assert_eq!(vt.num_available(), 3);
/// assert_eq!(vt.capacity(), 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleType {
    num_available: usize,
    capacity: i64,
    start_depot: usize,
    end_depot: usize,
    tw_early: i64,
    tw_late: i64,
    max_duration: i64,
    max_distance: i64,
    fixed_cost: i64,
    profile: usize,
    name: String,
}

impl VehicleType {
    /// Creates a vehicle type with the given availability and capacity.
    ///
    /// Defaults: depot 0 for both ends, unconstrained shift window and
    /// route limits, no fixed cost, matrix profile 0, empty name.
    pub fn new(num_available: usize, capacity: i64) -> Self {
        Self {
            num_available,
            capacity,
            start_depot: 0,
            end_depot: 0,
            tw_early: 0,
            tw_late: MAX_VALUE,
            max_duration: MAX_VALUE,
            max_distance: MAX_VALUE,
            fixed_cost: 0,
            profile: 0,
            name: String::new(),
        }
    }

    /// Sets the start and end depot location indices.
    pub fn with_depots(mut self, start: usize, end: usize) -> Self {
        self.start_depot = start;
        self.end_depot = end;
        self
    }

    /// Sets the shift time window.
    pub fn with_time_window(mut self, early: i64, late: i64) -> Self {
        self.tw_early = early;
        self.tw_late = late;
        self
    }

    /// Sets the maximum route duration.
    pub fn with_max_duration(mut self, max: i64) -> Self {
        self.max_duration = max;
        self
    }

    /// Sets the maximum route distance.
    pub fn with_max_distance(mut self, max: i64) -> Self {
        self.max_distance = max;
        self
    }

    /// Sets the fixed cost charged when a vehicle of this type is used.
    pub fn with_fixed_cost(mut self, cost: i64) -> Self {
        self.fixed_cost = cost;
        self
    }

    /// Sets the distance/duration matrix profile this type travels by.
    pub fn with_profile(mut self, profile: usize) -> Self {
        self.profile = profile;
        self
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of vehicles available of this type.
    pub fn num_available(&self) -> usize {
        self.num_available
    }

    /// Load capacity per vehicle.
    pub fn capacity(&self) -> i64 {
        self.capacity
    }

    /// Start depot location index.
    pub fn start_depot(&self) -> usize {
        self.start_depot
    }

    /// End depot location index.
    pub fn end_depot(&self) -> usize {
        self.end_depot
    }

    /// Earliest shift start.
    pub fn tw_early(&self) -> i64 {
        self.tw_early
    }

    /// Latest shift end.
    pub fn tw_late(&self) -> i64 {
        self.tw_late
    }

    /// Maximum route duration.
    pub fn max_duration(&self) -> i64 {
        self.max_duration
    }

    /// Maximum route distance.
    pub fn max_distance(&self) -> i64 {
        self.max_distance
    }

    /// Fixed cost for using a vehicle of this type.
    pub fn fixed_cost(&self) -> i64 {
        self.fixed_cost
    }

    /// Matrix profile index.
    pub fn profile(&self) -> usize {
        self.profile
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_type_defaults() {
        let vt = VehicleType::new(2, 50);
        assert_eq!(vt.num_available(), 2);
        assert_eq!(vt.capacity(), 50);
        assert_eq!(vt.start_depot(), 0);
        assert_eq!(vt.end_depot(), 0);
        assert_eq!(vt.fixed_cost(), 0);
        assert_eq!(vt.profile(), 0);
        assert_eq!(vt.name(), "");
    }

    #[test]
    fn test_vehicle_type_builder() {
        let vt = VehicleType::new(1, 100)
            .with_depots(0, 1)
            .with_time_window(0, 480)
            .with_max_duration(240)
            .with_max_distance(1_000)
            .with_fixed_cost(75)
            .with_profile(1)
            .with_name("truck");
        assert_eq!(vt.start_depot(), 0);
        assert_eq!(vt.end_depot(), 1);
        assert_eq!(vt.tw_late(), 480);
        assert_eq!(vt.max_duration(), 240);
        assert_eq!(vt.max_distance(), 1_000);
        assert_eq!(vt.fixed_cost(), 75);
        assert_eq!(vt.profile(), 1);
        assert_eq!(vt.name(), "truck");
    }
}
