//! Domain model types.
//!
//! - [`Client`], [`Depot`], [`ClientGroup`] — Location records
//! - [`VehicleType`] — Fleet description
//! - [`ProblemData`] — Immutable problem instance
//! - [`Route`], [`RouteSpec`] — A vehicle-typed visit sequence
//! - [`Solution`] — A multiset of routes plus unassigned clients

mod client;
mod problem;
mod route;
mod solution;
mod vehicle;

pub use client::{Client, ClientGroup, Depot};
pub use problem::ProblemData;
pub use route::{Route, RouteSpec};
pub use solution::Solution;
pub use vehicle::VehicleType;
