//! Solver error types.

use thiserror::Error;

/// Errors surfaced by the solver engine.
///
/// Construction-time validation failures (`InvalidData`, `InvalidRoute`,
/// `InvalidParameter`, `UnknownOperator`, `Config`) never leave a partially
/// initialised engine behind. `InvariantViolation` indicates internal state
/// desynchronisation inside the search and is fatal for the run.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The problem instance is malformed (bad matrix shape, out-of-range
    /// depot or group index, and similar).
    #[error("invalid problem data: {0}")]
    InvalidData(String),

    /// A route violates a structural constraint (depot in visit sequence,
    /// duplicated client, unknown vehicle type).
    #[error("invalid route: {0}")]
    InvalidRoute(String),

    /// A solver parameter is outside its documented domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A configuration file names an operator that is not registered.
    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    /// The configuration file could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// A configuration or statistics file could not be read or written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal search state desynchronised. Names the last applied
    /// operator and the affected route slots.
    #[error("search invariant violated after {operator} on routes {routes:?}")]
    InvariantViolation {
        /// Name of the last applied operator.
        operator: String,
        /// Route slots touched by that operator.
        routes: Vec<usize>,
    },
}
