//! Client, depot, and client group records.

use serde::{Deserialize, Serialize};

use crate::MAX_VALUE;

/// A client location to visit.
///
/// Clients carry delivery and pickup demand, a service duration, a time
/// window on the start of service, a release time before which the route
/// serving them may not leave the depot, and a prize collected on visiting.
/// Optional clients (`required == false`) may be left unvisited at the cost
/// of their prize.
///
/// # Examples
///
/// ```
/// use hypervrp::models::Client;
///
/// let c = Client::new(10, 20)
///     .with_delivery(5)
///     .with_service_duration(3)
///     .with_time_window(100, 200);
/// assert_eq!(c.delivery(), 5);
/// assert!(c.required());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    x: i64,
    y: i64,
    delivery: i64,
    pickup: i64,
    service_duration: i64,
    tw_early: i64,
    tw_late: i64,
    release_time: i64,
    prize: i64,
    required: bool,
    group: Option<usize>,
}

impl Client {
    /// Creates a required client at the given coordinates with zero demand,
    /// zero service duration, and an unconstrained time window.
    pub fn new(x: i64, y: i64) -> Self {
        Self {
            x,
            y,
            delivery: 0,
            pickup: 0,
            service_duration: 0,
            tw_early: 0,
            tw_late: MAX_VALUE,
            release_time: 0,
            prize: 0,
            required: true,
            group: None,
        }
    }

    /// Sets the delivery demand.
    pub fn with_delivery(mut self, delivery: i64) -> Self {
        self.delivery = delivery;
        self
    }

    /// Sets the pickup demand.
    pub fn with_pickup(mut self, pickup: i64) -> Self {
        self.pickup = pickup;
        self
    }

    /// Sets the service duration.
    pub fn with_service_duration(mut self, duration: i64) -> Self {
        self.service_duration = duration;
        self
    }

    /// Sets the time window on the start of service.
    pub fn with_time_window(mut self, early: i64, late: i64) -> Self {
        self.tw_early = early;
        self.tw_late = late;
        self
    }

    /// Sets the release time.
    pub fn with_release_time(mut self, release: i64) -> Self {
        self.release_time = release;
        self
    }

    /// Marks the client optional, with the given prize for visiting it.
    pub fn with_prize(mut self, prize: i64) -> Self {
        self.prize = prize;
        self.required = false;
        self
    }

    /// Sets whether the client must be visited.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Assigns the client to a mutually exclusive group.
    pub fn with_group(mut self, group: usize) -> Self {
        self.group = Some(group);
        self.required = false;
        self
    }

    /// X-coordinate.
    pub fn x(&self) -> i64 {
        self.x
    }

    /// Y-coordinate.
    pub fn y(&self) -> i64 {
        self.y
    }

    /// Delivery demand (brought from the depot).
    pub fn delivery(&self) -> i64 {
        self.delivery
    }

    /// Pickup demand (returned to the depot).
    pub fn pickup(&self) -> i64 {
        self.pickup
    }

    /// Service duration at this client.
    pub fn service_duration(&self) -> i64 {
        self.service_duration
    }

    /// Earliest start of service.
    pub fn tw_early(&self) -> i64 {
        self.tw_early
    }

    /// Latest start of service.
    pub fn tw_late(&self) -> i64 {
        self.tw_late
    }

    /// Earliest time the serving route may leave its depot.
    pub fn release_time(&self) -> i64 {
        self.release_time
    }

    /// Prize collected when this client is visited.
    pub fn prize(&self) -> i64 {
        self.prize
    }

    /// Whether every solution must visit this client.
    pub fn required(&self) -> bool {
        self.required
    }

    /// Mutually exclusive group this client belongs to, if any.
    pub fn group(&self) -> Option<usize> {
        self.group
    }
}

/// A depot location where routes start and end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Depot {
    x: i64,
    y: i64,
}

impl Depot {
    /// Creates a depot at the given coordinates.
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// X-coordinate.
    pub fn x(&self) -> i64 {
        self.x
    }

    /// Y-coordinate.
    pub fn y(&self) -> i64 {
        self.y
    }
}

/// A set of mutually exclusive clients.
///
/// At most one member may be visited; when the group is `required`,
/// exactly one member must be visited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientGroup {
    clients: Vec<usize>,
    required: bool,
}

impl ClientGroup {
    /// Creates a group over the given client location indices.
    pub fn new(clients: Vec<usize>, required: bool) -> Self {
        Self { clients, required }
    }

    /// Member client location indices.
    pub fn clients(&self) -> &[usize] {
        &self.clients
    }

    /// Whether exactly one member must be visited.
    pub fn required(&self) -> bool {
        self.required
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_defaults() {
        let c = Client::new(3, 4);
        assert_eq!(c.x(), 3);
        assert_eq!(c.y(), 4);
        assert_eq!(c.delivery(), 0);
        assert_eq!(c.pickup(), 0);
        assert_eq!(c.release_time(), 0);
        assert!(c.required());
        assert!(c.group().is_none());
    }

    #[test]
    fn test_client_builder() {
        let c = Client::new(0, 0)
            .with_delivery(7)
            .with_pickup(2)
            .with_service_duration(5)
            .with_time_window(10, 50)
            .with_release_time(4);
        assert_eq!(c.delivery(), 7);
        assert_eq!(c.pickup(), 2);
        assert_eq!(c.service_duration(), 5);
        assert_eq!(c.tw_early(), 10);
        assert_eq!(c.tw_late(), 50);
        assert_eq!(c.release_time(), 4);
    }

    #[test]
    fn test_prize_makes_optional() {
        let c = Client::new(0, 0).with_prize(100);
        assert!(!c.required());
        assert_eq!(c.prize(), 100);
    }

    #[test]
    fn test_group_membership() {
        let c = Client::new(0, 0).with_group(2);
        assert_eq!(c.group(), Some(2));
        assert!(!c.required());

        let g = ClientGroup::new(vec![1, 2, 3], true);
        assert_eq!(g.clients(), &[1, 2, 3]);
        assert!(g.required());
    }
}
