//! Search-state routes with prefix/suffix segment summaries.
//!
//! During local search every vehicle slot holds a [`SearchRoute`]: the
//! visit sequence plus cached summaries that let operators price candidate
//! routes without touching the full sequence. Positions are 1-based for
//! clients; position `0` is the start depot sentinel and `len + 1` the end
//! depot sentinel.

use crate::evaluation::CostEvaluator;
use crate::models::ProblemData;

use super::segments::{DurationSegment, LoadSegment};

/// A route slot inside the local search.
#[derive(Debug, Clone)]
pub struct SearchRoute {
    idx: usize,
    vehicle_type: usize,
    visits: Vec<usize>,
    // cum_dist[p]: travel distance from the start depot to the location at
    // position p. Length len + 2.
    cum_dist: Vec<i64>,
    // dur_before[p]: duration segment spanning positions 0..=p.
    dur_before: Vec<DurationSegment>,
    // dur_after[p]: duration segment spanning positions p..=len+1.
    dur_after: Vec<DurationSegment>,
    // load_before[p] / load_after[p]: load over the same spans.
    load_before: Vec<LoadSegment>,
    load_after: Vec<LoadSegment>,
    // Move counter value when this route was last structurally changed.
    last_modified: u64,
}

impl SearchRoute {
    /// Creates a route slot for the given vehicle type, initially empty.
    pub fn new(data: &ProblemData, idx: usize, vehicle_type: usize) -> Self {
        let mut route = Self {
            idx,
            vehicle_type,
            visits: Vec::with_capacity(data.num_clients()),
            cum_dist: Vec::with_capacity(data.num_clients() + 2),
            dur_before: Vec::with_capacity(data.num_clients() + 2),
            dur_after: Vec::with_capacity(data.num_clients() + 2),
            load_before: Vec::with_capacity(data.num_clients() + 2),
            load_after: Vec::with_capacity(data.num_clients() + 2),
            last_modified: 0,
        };
        route.update(data);
        route
    }

    /// Slot index.
    pub fn idx(&self) -> usize {
        self.idx
    }

    /// Vehicle type served by this slot.
    pub fn vehicle_type(&self) -> usize {
        self.vehicle_type
    }

    /// Matrix profile of this slot's vehicle type.
    pub fn profile(&self, data: &ProblemData) -> usize {
        data.vehicle_type(self.vehicle_type).profile()
    }

    /// Number of clients in the route.
    pub fn len(&self) -> usize {
        self.visits.len()
    }

    /// Returns `true` if the route has no clients.
    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    /// Client visits, in order.
    pub fn visits(&self) -> &[usize] {
        &self.visits
    }

    /// Replaces the visit sequence and refreshes all summaries.
    pub fn set_visits(&mut self, data: &ProblemData, visits: Vec<usize>, at_move: u64) {
        self.visits = visits;
        self.last_modified = at_move;
        self.update(data);
    }

    /// Move counter value of the last structural change.
    pub fn last_modified(&self) -> u64 {
        self.last_modified
    }

    /// Location at the given position (depot sentinels included).
    #[inline]
    pub fn loc(&self, data: &ProblemData, pos: usize) -> usize {
        let vt = data.vehicle_type(self.vehicle_type);
        if pos == 0 {
            vt.start_depot()
        } else if pos == self.visits.len() + 1 {
            vt.end_depot()
        } else {
            self.visits[pos - 1]
        }
    }

    /// Refreshes forward summaries from the start depot to the end depot
    /// and reverse summaries back from the end depot.
    pub fn update(&mut self, data: &ProblemData) {
        let vt = data.vehicle_type(self.vehicle_type);
        let profile = vt.profile();
        let len = self.visits.len();

        self.cum_dist.clear();
        self.dur_before.clear();
        self.load_before.clear();

        self.cum_dist.push(0);
        self.dur_before
            .push(DurationSegment::depot(vt.tw_early(), vt.tw_late()));
        self.load_before.push(LoadSegment::empty());

        for pos in 1..=len + 1 {
            let prev = self.loc(data, pos - 1);
            let here = self.loc(data, pos);
            let node_dur = self.node_dur(data, pos);
            let node_load = self.node_load(data, pos);

            let dist = self.cum_dist[pos - 1] + data.dist(profile, prev, here);
            let dur = self.dur_before[pos - 1].merge(data.dur(profile, prev, here), node_dur);
            let load = self.load_before[pos - 1].merge(node_load);

            self.cum_dist.push(dist);
            self.dur_before.push(dur);
            self.load_before.push(load);
        }

        self.dur_after.clear();
        self.load_after.clear();
        self.dur_after
            .resize(len + 2, DurationSegment::depot(vt.tw_early(), vt.tw_late()));
        self.load_after.resize(len + 2, LoadSegment::empty());

        for pos in (0..=len).rev() {
            let here = self.loc(data, pos);
            let next = self.loc(data, pos + 1);
            let node_dur = self.node_dur(data, pos);
            let node_load = self.node_load(data, pos);

            let dur = node_dur.merge(data.dur(profile, here, next), self.dur_after[pos + 1]);
            let load = node_load.merge(self.load_after[pos + 1]);

            self.dur_after[pos] = dur;
            self.load_after[pos] = load;
        }
    }

    /// Duration segment of the single location at `pos`.
    pub fn node_dur(&self, data: &ProblemData, pos: usize) -> DurationSegment {
        let loc = self.loc(data, pos);
        if data.is_depot(loc) {
            let vt = data.vehicle_type(self.vehicle_type);
            DurationSegment::depot(vt.tw_early(), vt.tw_late())
        } else {
            let client = data.client(loc);
            DurationSegment::client(
                client.service_duration(),
                client.tw_early(),
                client.tw_late(),
                client.release_time(),
            )
        }
    }

    /// Load segment of the single location at `pos`.
    pub fn node_load(&self, data: &ProblemData, pos: usize) -> LoadSegment {
        let loc = self.loc(data, pos);
        if data.is_depot(loc) {
            LoadSegment::empty()
        } else {
            let client = data.client(loc);
            LoadSegment::client(client.delivery(), client.pickup())
        }
    }

    /// Travel distance between positions `from` and `to` along the route.
    #[inline]
    pub fn dist_between(&self, from: usize, to: usize) -> i64 {
        self.cum_dist[to] - self.cum_dist[from]
    }

    /// Total route distance.
    pub fn distance(&self) -> i64 {
        self.cum_dist[self.visits.len() + 1]
    }

    /// Duration segment over the whole route, depot sentinels included.
    pub fn dur_total(&self) -> DurationSegment {
        self.dur_before[self.visits.len() + 1]
    }

    /// Load segment over the whole route.
    pub fn load_total(&self) -> LoadSegment {
        self.load_before[self.visits.len() + 1]
    }

    /// Forward duration segment spanning positions `0..=pos`.
    pub fn dur_before(&self, pos: usize) -> DurationSegment {
        self.dur_before[pos]
    }

    /// Reverse duration segment spanning positions `pos..=len+1`.
    pub fn dur_after(&self, pos: usize) -> DurationSegment {
        self.dur_after[pos]
    }

    /// Forward load segment spanning positions `0..=pos`.
    pub fn load_before(&self, pos: usize) -> LoadSegment {
        self.load_before[pos]
    }

    /// Reverse load segment spanning positions `pos..=len+1`.
    pub fn load_after(&self, pos: usize) -> LoadSegment {
        self.load_after[pos]
    }

    /// Penalised cost of this route under the given evaluator.
    pub fn cost(&self, data: &ProblemData, eval: &CostEvaluator) -> i64 {
        let vt = data.vehicle_type(self.vehicle_type);

        if self.is_empty() {
            return 0;
        }

        let distance = self.distance();
        let duration = self.dur_total().duration();

        distance
            + vt.fixed_cost()
            + eval.load_penalty(self.load_total().excess_load(vt.capacity()))
            + eval.tw_penalty(self.dur_total().time_warp())
            + eval.dist_penalty((distance - vt.max_distance()).max(0))
            + eval.dur_penalty((duration - vt.max_duration()).max(0))
    }

    /// Verifies that cached summaries match a fresh recomputation.
    ///
    /// Used by the search to detect state desynchronisation after a move.
    pub fn summaries_in_sync(&self, data: &ProblemData) -> bool {
        let mut fresh = self.clone();
        fresh.update(data);
        fresh.cum_dist == self.cum_dist
            && fresh.dur_before == self.dur_before
            && fresh.dur_after == self.dur_after
            && fresh.load_before == self.load_before
            && fresh.load_after == self.load_after
    }
}

/// A building block of a candidate route: an existing stretch of some
/// route, the same stretch traversed in reverse, or a single client.
///
/// Positions are inclusive and must not include depot sentinels.
#[derive(Debug, Clone, Copy)]
pub enum Piece<'a> {
    /// Positions `start..=end` of `route`, forward order. Empty when
    /// `start > end`.
    Segment {
        /// Source route.
        route: &'a SearchRoute,
        /// First position, inclusive.
        start: usize,
        /// Last position, inclusive.
        end: usize,
    },
    /// Positions `start..=end` of `route`, traversed from `end` down to
    /// `start`.
    Reversed {
        /// Source route.
        route: &'a SearchRoute,
        /// First position, inclusive.
        start: usize,
        /// Last position, inclusive.
        end: usize,
    },
    /// A single client location.
    Node(usize),
}

/// Running totals while composing a candidate route from pieces.
struct Composition {
    distance: i64,
    load: LoadSegment,
    dur: DurationSegment,
    last_loc: usize,
    num_clients: usize,
}

/// Computes the penalised cost of the candidate route obtained by visiting
/// the given pieces in order between the depot sentinels of the vehicle
/// type of `slot_vehicle_type`.
///
/// A leading piece that is a route prefix (and a trailing piece that is a
/// route suffix) of a slot with the same vehicle type splices the cached
/// forward (reverse) summaries in O(1). Other pieces are re-merged from
/// per-node segments, which is O(piece length) — constant for the one- and
/// two-client stretches the node operators produce.
pub fn evaluate_composition(
    data: &ProblemData,
    eval: &CostEvaluator,
    slot_vehicle_type: usize,
    pieces: &[Piece],
) -> i64 {
    let vt = data.vehicle_type(slot_vehicle_type);
    let profile = vt.profile();

    let mut pieces = pieces;
    let mut state = Composition {
        distance: 0,
        load: LoadSegment::empty(),
        dur: DurationSegment::depot(vt.tw_early(), vt.tw_late()),
        last_loc: vt.start_depot(),
        num_clients: 0,
    };

    // Splice a cached prefix: positions 0..=end of a same-typed route.
    if let Some((Piece::Segment { route, start, end }, rest)) = pieces.split_first() {
        if *start == 1
            && *start <= *end
            && *end <= route.len()
            && route.vehicle_type() == slot_vehicle_type
        {
            state.distance = route.dist_between(0, *end);
            state.load = route.load_before(*end);
            state.dur = route.dur_before(*end);
            state.last_loc = route.loc(data, *end);
            state.num_clients = *end;
            pieces = rest;
        }
    }

    let mut end_depot_merged = false;

    // Splice a cached suffix: positions start..=len+1 of a same-typed route.
    let suffix = match pieces.split_last() {
        Some((Piece::Segment { route, start, end }, rest))
            if *end == route.len()
                && *start <= *end
                && *start >= 1
                && route.vehicle_type() == slot_vehicle_type =>
        {
            pieces = rest;
            Some((*route, *start))
        }
        _ => None,
    };

    for piece in pieces {
        match *piece {
            Piece::Segment { route, start, end } => {
                if start > end {
                    continue;
                }
                for pos in start..=end {
                    extend_node(data, profile, &mut state, route, pos);
                }
            }
            Piece::Reversed { route, start, end } => {
                if start > end {
                    continue;
                }
                for pos in (start..=end).rev() {
                    extend_node(data, profile, &mut state, route, pos);
                }
            }
            Piece::Node(loc) => {
                let client = data.client(loc);
                push_client(
                    data,
                    profile,
                    &mut state,
                    loc,
                    LoadSegment::client(client.delivery(), client.pickup()),
                    DurationSegment::client(
                        client.service_duration(),
                        client.tw_early(),
                        client.tw_late(),
                        client.release_time(),
                    ),
                );
            }
        }
    }

    if let Some((route, start)) = suffix {
        let first = route.loc(data, start);
        state.distance += data.dist(profile, state.last_loc, first)
            + route.dist_between(start, route.len() + 1);
        state.load = state.load.merge(route.load_after(start));
        state.dur = state
            .dur
            .merge(data.dur(profile, state.last_loc, first), route.dur_after(start));
        state.num_clients += route.len() + 1 - start;
        end_depot_merged = true;
    }

    if state.num_clients == 0 {
        return 0;
    }

    if !end_depot_merged {
        state.distance += data.dist(profile, state.last_loc, vt.end_depot());
        state.dur = state.dur.merge(
            data.dur(profile, state.last_loc, vt.end_depot()),
            DurationSegment::depot(vt.tw_early(), vt.tw_late()),
        );
    }

    let duration = state.dur.duration();

    state.distance
        + vt.fixed_cost()
        + eval.load_penalty(state.load.excess_load(vt.capacity()))
        + eval.tw_penalty(state.dur.time_warp())
        + eval.dist_penalty((state.distance - vt.max_distance()).max(0))
        + eval.dur_penalty((duration - vt.max_duration()).max(0))
}

fn extend_node(
    data: &ProblemData,
    profile: usize,
    state: &mut Composition,
    route: &SearchRoute,
    pos: usize,
) {
    let loc = route.loc(data, pos);
    push_client(
        data,
        profile,
        state,
        loc,
        route.node_load(data, pos),
        route.node_dur(data, pos),
    );
}

fn push_client(
    data: &ProblemData,
    profile: usize,
    state: &mut Composition,
    loc: usize,
    load: LoadSegment,
    dur: DurationSegment,
) {
    state.distance += data.dist(profile, state.last_loc, loc);
    state.load = state.load.merge(load);
    state.dur = state.dur.merge(data.dur(profile, state.last_loc, loc), dur);
    state.last_loc = loc;
    state.num_clients += 1;
}
