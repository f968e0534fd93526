//! Stopping criteria.

use std::time::{Duration, Instant};

/// Decides when the driver loop halts. Polled once per iteration with the
/// penalised cost of the best solution so far.
#[derive(Debug, Clone)]
pub enum StoppingCriterion {
    /// Stop after a fixed number of iterations.
    MaxIterations {
        /// Iteration budget.
        max_iterations: usize,
        /// Iterations counted so far.
        current: usize,
    },
    /// Stop once the wall-clock budget is spent.
    MaxRuntime {
        /// Runtime budget.
        max_runtime: Duration,
        /// When polling started; set on the first poll.
        started: Option<Instant>,
    },
    /// Stop as soon as the best cost reaches the given target.
    TargetCost {
        /// Cost at or below which the run stops.
        target: i64,
    },
    /// Stop when any of the inner criteria fires.
    Any(Vec<StoppingCriterion>),
}

impl StoppingCriterion {
    /// Stop after `max_iterations` driver iterations.
    pub fn max_iterations(max_iterations: usize) -> Self {
        Self::MaxIterations {
            max_iterations,
            current: 0,
        }
    }

    /// Stop after `max_runtime` of wall-clock time.
    pub fn max_runtime(max_runtime: Duration) -> Self {
        Self::MaxRuntime {
            max_runtime,
            started: None,
        }
    }

    /// Stop once the best cost is at or below `target`.
    pub fn target_cost(target: i64) -> Self {
        Self::TargetCost { target }
    }

    /// Polls the criterion. Returns `true` when the run should halt.
    pub fn should_stop(&mut self, best_cost: i64) -> bool {
        match self {
            StoppingCriterion::MaxIterations {
                max_iterations,
                current,
            } => {
                let stop = *current >= *max_iterations;
                *current += 1;
                stop
            }
            StoppingCriterion::MaxRuntime {
                max_runtime,
                started,
            } => {
                let begin = *started.get_or_insert_with(Instant::now);
                begin.elapsed() >= *max_runtime
            }
            StoppingCriterion::TargetCost { target } => best_cost <= *target,
            StoppingCriterion::Any(criteria) => {
                // Poll all inner criteria so each sees every iteration.
                let mut stop = false;
                for criterion in criteria.iter_mut() {
                    stop |= criterion.should_stop(best_cost);
                }
                stop
            }
        }
    }

    /// The wall-clock budget of this criterion, when one exists. Used to
    /// parameterise time-decaying acceptance.
    pub fn runtime_budget(&self) -> Option<Duration> {
        match self {
            StoppingCriterion::MaxRuntime { max_runtime, .. } => Some(*max_runtime),
            StoppingCriterion::Any(criteria) => criteria.iter().find_map(|c| c.runtime_budget()),
            _ => None,
        }
    }
}
