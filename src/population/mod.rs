//! Population management and diversity.
//!
//! - [`broken_pairs_distance`] — Pairwise solution diversity in `[0, 1]`
//! - [`Population`], [`PopulationParams`] — Feasible/infeasible
//!   sub-populations with biased fitness and tournament selection

mod diversity;
mod population;

pub use diversity::broken_pairs_distance;
pub use population::{Population, PopulationParams};
