//! Per-iteration solver statistics.

use std::io::Write;
use std::path::Path;

use crate::SolverError;

/// One iteration's snapshot of solver state.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationStats {
    /// Driver iteration number, starting at 1.
    pub iteration: usize,
    /// Penalised cost of the incumbent.
    pub current_cost: i64,
    /// Penalised cost of the best solution so far.
    pub best_cost: i64,
    /// Size of the feasible sub-population (zero for trajectory drivers).
    pub num_feasible: usize,
    /// Size of the infeasible sub-population (zero for trajectory drivers).
    pub num_infeasible: usize,
    /// Penalty multipliers `[load, time_warp, distance, duration]`.
    pub penalties: [f64; 4],
    /// Feasibility fractions per dimension in the current penalty window.
    pub feasibility: [f64; 4],
}

/// Collects per-iteration statistics and writes them as CSV.
///
/// Collection can be disabled, in which case `record` is a no-op and the
/// run carries no per-iteration overhead.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    rows: Vec<IterationStats>,
    collecting: bool,
}

impl Statistics {
    /// Creates a collecting statistics object.
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            collecting: true,
        }
    }

    /// Creates a disabled statistics object that records nothing.
    pub fn disabled() -> Self {
        Self {
            rows: Vec::new(),
            collecting: false,
        }
    }

    /// Whether this object records rows.
    pub fn is_collecting(&self) -> bool {
        self.collecting
    }

    /// Records one iteration snapshot.
    pub fn record(&mut self, row: IterationStats) {
        if self.collecting {
            self.rows.push(row);
        }
    }

    /// Recorded rows, in iteration order.
    pub fn rows(&self) -> &[IterationStats] {
        &self.rows
    }

    /// Number of recorded rows.
    pub fn num_iterations(&self) -> usize {
        self.rows.len()
    }

    /// Writes all rows as CSV to the given writer.
    pub fn to_csv<W: Write>(&self, writer: W) -> Result<(), SolverError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "iteration",
            "current_cost",
            "best_cost",
            "num_feasible",
            "num_infeasible",
            "load_penalty",
            "tw_penalty",
            "dist_penalty",
            "dur_penalty",
            "feas_load",
            "feas_tw",
            "feas_dist",
            "feas_dur",
        ])?;

        for row in &self.rows {
            csv_writer.write_record([
                row.iteration.to_string(),
                row.current_cost.to_string(),
                row.best_cost.to_string(),
                row.num_feasible.to_string(),
                row.num_infeasible.to_string(),
                row.penalties[0].to_string(),
                row.penalties[1].to_string(),
                row.penalties[2].to_string(),
                row.penalties[3].to_string(),
                row.feasibility[0].to_string(),
                row.feasibility[1].to_string(),
                row.feasibility[2].to_string(),
                row.feasibility[3].to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Writes all rows as CSV to the given file path.
    pub fn to_csv_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SolverError> {
        let file = std::fs::File::create(path)?;
        self.to_csv(file)
    }
}

impl From<csv::Error> for SolverError {
    fn from(err: csv::Error) -> Self {
        match err.into_kind() {
            csv::ErrorKind::Io(io) => SolverError::Io(io),
            other => SolverError::InvalidParameter(format!("csv error: {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(iteration: usize) -> IterationStats {
        IterationStats {
            iteration,
            current_cost: 120,
            best_cost: 100,
            num_feasible: 3,
            num_infeasible: 2,
            penalties: [20.0, 6.0, 6.0, 6.0],
            feasibility: [0.5, 1.0, 1.0, 1.0],
        }
    }

    #[test]
    fn test_record_and_rows() {
        let mut stats = Statistics::new();
        stats.record(sample_row(1));
        stats.record(sample_row(2));
        assert_eq!(stats.num_iterations(), 2);
        assert_eq!(stats.rows()[1].iteration, 2);
    }

    #[test]
    fn test_disabled_records_nothing() {
        let mut stats = Statistics::disabled();
        stats.record(sample_row(1));
        assert_eq!(stats.num_iterations(), 0);
        assert!(!stats.is_collecting());
    }

    #[test]
    fn test_csv_output_shape() {
        let mut stats = Statistics::new();
        stats.record(sample_row(1));

        let mut buffer = Vec::new();
        stats.to_csv(&mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("iteration,current_cost,best_cost"));
        assert!(lines[1].starts_with("1,120,100,3,2,"));
    }
}
