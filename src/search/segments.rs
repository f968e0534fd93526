//! Constant-time composable route segment summaries.
//!
//! A segment summarises a contiguous stretch of a route. Two adjacent
//! segments concatenate in O(1), which is what gives the local search its
//! constant-time move evaluation: every candidate route is expressed as a
//! handful of existing segments glued together.
//!
//! # Reference
//!
//! Vidal, T., Crainic, T.G., Gendreau, M. & Prins, C. (2013). "A unified
//! solution framework for multi-attribute vehicle routing problems",
//! *European Journal of Operational Research* 234(3), 658-673.

/// Load summary of a contiguous route segment.
///
/// Tracks total delivery, total pickup, and the maximum concurrent load
/// reached anywhere inside the segment. Deliveries are on board from the
/// route start; pickups accumulate towards the route end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSegment {
    delivery: i64,
    pickup: i64,
    load: i64,
}

impl LoadSegment {
    /// Summary of a single visit with the given delivery and pickup demand.
    pub fn client(delivery: i64, pickup: i64) -> Self {
        Self {
            delivery,
            pickup,
            load: delivery.max(pickup),
        }
    }

    /// Summary of an empty stretch (a depot sentinel).
    pub fn empty() -> Self {
        Self {
            delivery: 0,
            pickup: 0,
            load: 0,
        }
    }

    /// Concatenates `self` followed by `after`.
    pub fn merge(self, after: LoadSegment) -> Self {
        Self {
            delivery: self.delivery + after.delivery,
            pickup: self.pickup + after.pickup,
            load: (self.load + after.delivery).max(after.load + self.pickup),
        }
    }

    /// Total delivery demand in this segment.
    pub fn delivery(&self) -> i64 {
        self.delivery
    }

    /// Total pickup demand in this segment.
    pub fn pickup(&self) -> i64 {
        self.pickup
    }

    /// Maximum concurrent load inside this segment.
    pub fn load(&self) -> i64 {
        self.load
    }

    /// Load beyond the given capacity.
    pub fn excess_load(&self, capacity: i64) -> i64 {
        (self.load - capacity).max(0)
    }
}

/// Duration and time-window summary of a contiguous route segment.
///
/// `tw_early`/`tw_late` delimit the start-of-service times at the segment's
/// first visit for which no additional waiting or time warp is incurred.
/// `duration` is the total segment duration under the earliest such
/// schedule, and `time_warp` the warp that no schedule can avoid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationSegment {
    duration: i64,
    time_warp: i64,
    tw_early: i64,
    tw_late: i64,
    release: i64,
}

impl DurationSegment {
    /// Summary of a single client visit.
    pub fn client(service: i64, tw_early: i64, tw_late: i64, release: i64) -> Self {
        Self {
            duration: service,
            time_warp: 0,
            tw_early,
            tw_late,
            release,
        }
    }

    /// Summary of a depot sentinel carrying the vehicle's shift window.
    pub fn depot(tw_early: i64, tw_late: i64) -> Self {
        Self {
            duration: 0,
            time_warp: 0,
            tw_early,
            tw_late,
            release: 0,
        }
    }

    /// Concatenates `self` followed by `after`, travelling `edge_duration`
    /// between them.
    pub fn merge(self, edge_duration: i64, after: DurationSegment) -> Self {
        let delta = self.duration - self.time_warp + edge_duration;
        let wait = (after.tw_early - delta - self.tw_late).max(0);
        let warp = (self.tw_early + delta - after.tw_late).max(0);

        Self {
            duration: self.duration + after.duration + edge_duration + wait,
            time_warp: self.time_warp + after.time_warp + warp,
            tw_early: (after.tw_early - delta).max(self.tw_early) - wait,
            tw_late: (after.tw_late - delta).min(self.tw_late) + warp,
            release: self.release.max(after.release),
        }
    }

    /// Segment duration under the earliest no-extra-wait schedule.
    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// Unavoidable time warp inside this segment.
    ///
    /// When the segment spans a whole route, release times delay departure:
    /// any release beyond `tw_late` turns into additional warp.
    pub fn time_warp(&self) -> i64 {
        self.time_warp + (self.release - self.tw_late).max(0)
    }

    /// Earliest start of service at the segment's first visit, shifted to
    /// honour release times where possible.
    pub fn start_time(&self) -> i64 {
        self.tw_early.max(self.release.min(self.tw_late))
    }

    /// Latest start of service at the first visit without extra warp.
    pub fn tw_late(&self) -> i64 {
        self.tw_late
    }

    /// Earliest start of service at the first visit.
    pub fn tw_early(&self) -> i64 {
        self.tw_early
    }

    /// Largest release time inside the segment.
    pub fn release(&self) -> i64 {
        self.release
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_single_client() {
        let s = LoadSegment::client(10, 4);
        assert_eq!(s.delivery(), 10);
        assert_eq!(s.pickup(), 4);
        assert_eq!(s.load(), 10);
    }

    #[test]
    fn test_load_merge_deliveries() {
        // Two pure deliveries: all load is on board at the start.
        let s = LoadSegment::client(10, 0).merge(LoadSegment::client(5, 0));
        assert_eq!(s.delivery(), 15);
        assert_eq!(s.load(), 15);
        assert_eq!(s.excess_load(12), 3);
        assert_eq!(s.excess_load(20), 0);
    }

    #[test]
    fn test_load_merge_delivery_then_pickup() {
        // Deliver 10 first, then pick up 8: peak is max(10, 8) = 10.
        let s = LoadSegment::client(10, 0).merge(LoadSegment::client(0, 8));
        assert_eq!(s.load(), 10);

        // Pick up 8 first, then deliver 10: the delivery is on board while
        // the pickup accumulates, so the peak is 18.
        let s = LoadSegment::client(0, 8).merge(LoadSegment::client(10, 0));
        assert_eq!(s.load(), 18);
    }

    #[test]
    fn test_load_merge_associative() {
        let a = LoadSegment::client(3, 1);
        let b = LoadSegment::client(0, 7);
        let c = LoadSegment::client(5, 2);
        assert_eq!(a.merge(b).merge(c), a.merge(b.merge(c)));
    }

    #[test]
    fn test_duration_no_windows() {
        let wide = i64::MAX / 4;
        let a = DurationSegment::client(5, 0, wide, 0);
        let b = DurationSegment::client(7, 0, wide, 0);
        let m = a.merge(10, b);
        assert_eq!(m.duration(), 22);
        assert_eq!(m.time_warp(), 0);
    }

    #[test]
    fn test_duration_waiting() {
        // Arrive at b at 5 + 10 = 15, but b opens at 40: wait 25.
        let a = DurationSegment::client(5, 0, 0, 0);
        let b = DurationSegment::client(7, 40, 50, 0);
        let m = a.merge(10, b);
        assert_eq!(m.duration(), 5 + 10 + 25 + 7);
        assert_eq!(m.time_warp(), 0);
    }

    #[test]
    fn test_duration_time_warp() {
        // Starting a at its earliest (t=30), service ends 35, arrival at b
        // is 45 but b closes at 20: warp of 25.
        let a = DurationSegment::client(5, 30, 60, 0);
        let b = DurationSegment::client(7, 0, 20, 0);
        let m = a.merge(10, b);
        assert_eq!(m.time_warp(), 25);
    }

    #[test]
    fn test_duration_release_adds_warp_at_route_level() {
        let seg = DurationSegment::client(5, 0, 100, 150);
        // Release 150 exceeds the latest start 100: 50 units of warp.
        assert_eq!(seg.time_warp(), 50);

        let ok = DurationSegment::client(5, 0, 100, 80);
        assert_eq!(ok.time_warp(), 0);
        assert_eq!(ok.start_time(), 80);
    }

    #[test]
    fn test_duration_merge_matches_simulation() {
        // depot [0, 1000] -> c1 [10, 20], service 5 -> c2 [18, 25], service 3
        // -> depot, edges all 4.
        let depot = DurationSegment::depot(0, 1_000);
        let c1 = DurationSegment::client(5, 10, 20, 0);
        let c2 = DurationSegment::client(3, 18, 25, 0);

        let total = depot.merge(4, c1).merge(4, c2).merge(4, depot);

        // Earliest: leave depot at 6, start c1 at 10, done 15, arrive c2 at
        // 19, done 22, back at depot 26. Duration 26 - 6 = 20, no warp.
        assert_eq!(total.time_warp(), 0);
        assert_eq!(total.duration(), 20);
        assert_eq!(total.start_time(), 6);
    }
}
