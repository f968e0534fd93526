//! # hypervrp
//!
//! Metaheuristic solver engine for vehicle routing problems with capacity,
//! time-window, duration, distance, backhaul, and grouping constraints.
//! Searches for a set of depot-to-depot routes that visits every required
//! client exactly once and minimises distance plus penalties for constraint
//! violations.
//!
//! ## Modules
//!
//! - [`models`] — Immutable problem data and solution types
//! - [`distance`] — Dense distance/duration matrices
//! - [`construct`] — Randomised sweep construction for initial solutions
//! - [`evaluation`] — Penalised cost evaluation and adaptive penalty management
//! - [`search`] — Granular neighbourhoods and local search with node/route operators
//! - [`crossover`] — Selective route exchange between parent solutions
//! - [`perturb`] — Destroy and repair perturbation
//! - [`population`] — Diversity-managed population with biased fitness
//! - [`solver`] — Iterated local search and genetic drivers, acceptance,
//!   stopping, statistics, and configuration
//!
//! The engine is single-threaded and deterministic: given a fixed seed,
//! problem, and parameter set, two runs produce identical results.

pub mod construct;
pub mod crossover;
pub mod distance;
mod error;
pub mod evaluation;
pub mod models;
pub mod perturb;
pub mod population;
mod random;
pub mod search;
pub mod solver;

pub use error::SolverError;
pub use random::RandomNumberGenerator;

/// Largest value any matrix entry should take. Entries beyond this risk
/// overflow once multiplied by penalty terms and aggregated over routes.
pub const MAX_VALUE: i64 = 1 << 51;
