//! Crossover between parent solutions.
//!
//! - [`selective_route_exchange`] — SREX (Nagata & Kobayashi, 2010)
//! - [`heterogeneous_selective_route_exchange`] — Per-vehicle-type variant

mod srex;

pub use srex::{heterogeneous_selective_route_exchange, selective_route_exchange};
