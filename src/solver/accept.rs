//! Acceptance criteria.

use std::time::{Duration, Instant};

use crate::SolverError;

/// Decides whether a candidate solution replaces the incumbent, given the
/// penalised costs of the best, current, and candidate solutions.
#[derive(Debug, Clone)]
pub enum AcceptanceCriterion {
    /// Record-to-record travel: accept iff the candidate is within a
    /// time-decaying fraction of the best cost. The threshold interpolates
    /// linearly from `start_pct` to `end_pct` over `max_runtime`.
    RecordToRecord {
        /// Threshold fraction at the start of the run.
        start_pct: f64,
        /// Threshold fraction at the end of the run.
        end_pct: f64,
        /// Runtime over which the threshold decays.
        max_runtime: Duration,
        /// When the run started.
        started: Instant,
    },
    /// Accept only candidates strictly better than the current solution.
    Greedy,
}

impl AcceptanceCriterion {
    /// Creates a record-to-record criterion.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidParameter`] when either percentage is
    /// negative or `end_pct` exceeds `start_pct`.
    pub fn record_to_record(
        start_pct: f64,
        end_pct: f64,
        max_runtime: Duration,
    ) -> Result<Self, SolverError> {
        if start_pct < 0.0 || end_pct < 0.0 || end_pct > start_pct {
            return Err(SolverError::InvalidParameter(
                "need 0 <= end_pct <= start_pct".into(),
            ));
        }

        Ok(Self::RecordToRecord {
            start_pct,
            end_pct,
            max_runtime,
            started: Instant::now(),
        })
    }

    /// Applies the criterion to the three penalised costs.
    pub fn accept(&self, best: i64, current: i64, candidate: i64) -> bool {
        match *self {
            AcceptanceCriterion::RecordToRecord {
                start_pct,
                end_pct,
                max_runtime,
                started,
            } => {
                let elapsed = started.elapsed().as_secs_f64() / max_runtime.as_secs_f64().max(f64::MIN_POSITIVE);
                let pct = (start_pct - end_pct) * (1.0 - elapsed) + end_pct;
                let threshold = (pct * best as f64).max(0.0);
                (candidate.saturating_sub(best)) as f64 <= threshold
            }
            AcceptanceCriterion::Greedy => candidate < current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_to_record_validation() {
        assert!(AcceptanceCriterion::record_to_record(-0.1, 0.0, Duration::from_secs(1)).is_err());
        assert!(AcceptanceCriterion::record_to_record(0.01, 0.05, Duration::from_secs(1)).is_err());
        assert!(AcceptanceCriterion::record_to_record(0.05, 0.0, Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn test_record_to_record_accepts_within_threshold() {
        let accept =
            AcceptanceCriterion::record_to_record(0.10, 0.10, Duration::from_secs(3600)).unwrap();
        // Threshold is 10% of best = 100.
        assert!(accept.accept(1_000, 1_500, 1_050));
        assert!(accept.accept(1_000, 1_500, 1_100));
        assert!(!accept.accept(1_000, 1_500, 1_101));
    }

    #[test]
    fn test_record_to_record_accepts_improvements() {
        let accept =
            AcceptanceCriterion::record_to_record(0.0, 0.0, Duration::from_secs(3600)).unwrap();
        assert!(accept.accept(1_000, 1_500, 900));
        assert!(!accept.accept(1_000, 1_500, 1_001));
    }

    #[test]
    fn test_greedy_compares_to_current() {
        let accept = AcceptanceCriterion::Greedy;
        assert!(accept.accept(1_000, 1_500, 1_400));
        assert!(!accept.accept(1_000, 1_500, 1_500));
    }
}
