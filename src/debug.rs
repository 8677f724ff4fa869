//! Failure records for unsolvable randomization problems.
//!
//! When every enabled strategy fails, the resulting `RandomizationError`
//! carries a `RandomizationDebugInfo`: which strategies ran, how much
//! effort each spent, the violating values they saw, and which constraint
//! tuples failed. Without `debug` mode only the most recent violating
//! attempt per strategy is kept; with it, every attempt is retained up to
//! a retention cap.

use std::fmt;

use serde::Serialize;

use crate::value::Assignment;

/// Cap on retained attempt records in `debug` mode.
pub(crate) const MAX_DEBUG_RECORDS: usize = 10_000;

/// The solver strategy a report or failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Strategy {
    Naive,
    Sparse,
    Thorough,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Naive => f.write_str("naive"),
            Strategy::Sparse => f.write_str("sparse"),
            Strategy::Thorough => f.write_str("thorough"),
        }
    }
}

/// How a strategy attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StrategyOutcome {
    /// Ran out of iterations without finding a satisfying assignment.
    Exhausted,
    /// Preconditions were not met; the strategy did not run.
    Refused(String),
    /// The strategy proved the problem has no solutions.
    Unsatisfiable,
}

impl fmt::Display for StrategyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyOutcome::Exhausted => f.write_str("exhausted"),
            StrategyOutcome::Refused(reason) => write!(f, "refused: {reason}"),
            StrategyOutcome::Unsatisfiable => f.write_str("proved unsatisfiable"),
        }
    }
}

/// Effort counters for one strategy attempt.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyReport {
    pub strategy: Strategy,
    /// Attempts for the naive strategy; search-node visits otherwise.
    pub iterations: usize,
    /// Widest per-variable candidate quota reached (sparse only).
    pub width: Option<usize>,
    pub outcome: StrategyOutcome,
}

/// One violating attempt: the values tried and what they violated.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
    pub attempt: usize,
    /// Possibly partial; the sparse strategy records its deepest prefix.
    pub values: Assignment,
    /// Variable tuples of the constraints that failed.
    pub failing: Vec<Vec<String>>,
    /// Panic messages from predicates that faulted during evaluation.
    pub faults: Vec<String>,
}

/// The failure record contributed by one strategy (or by the pipeline
/// itself, when `strategy` is `None`).
#[derive(Debug, Clone, Serialize)]
pub struct RandomizationFail {
    pub strategy: Option<Strategy>,
    pub variables: Vec<String>,
    /// Variable tuples of every constraint in play.
    pub constraints: Vec<Vec<String>>,
    pub attempts: Vec<AttemptRecord>,
}

/// Diagnostics carried by a `RandomizationError`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RandomizationDebugInfo {
    pub reports: Vec<StrategyReport>,
    pub failures: Vec<RandomizationFail>,
    /// True when attempt records were dropped to respect the retention cap.
    pub truncated: bool,
}

impl fmt::Display for RandomizationDebugInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "randomization failure:")?;
        for report in &self.reports {
            write!(f, "  {}: {} iterations", report.strategy, report.iterations)?;
            if let Some(width) = report.width {
                write!(f, ", width {width}")?;
            }
            writeln!(f, ", {}", report.outcome)?;
        }
        for failure in &self.failures {
            write!(f, "{failure}")?;
        }
        if self.truncated {
            writeln!(f, "  (attempt records truncated)")?;
        }
        Ok(())
    }
}

fn write_tuple(f: &mut fmt::Formatter<'_>, tuple: &[String]) -> fmt::Result {
    write!(f, "({})", tuple.join(", "))
}

impl fmt::Display for RandomizationFail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.strategy {
            Some(strategy) => writeln!(f, "  {strategy} failure:")?,
            None => writeln!(f, "  failure:")?,
        }
        writeln!(f, "    variables: {}", self.variables.join(", "))?;
        write!(f, "    constraints:")?;
        for tuple in &self.constraints {
            write!(f, " ")?;
            write_tuple(f, tuple)?;
        }
        writeln!(f)?;
        for record in &self.attempts {
            write!(f, "    attempt {}: ", record.attempt)?;
            for (i, (name, value)) in record.values.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{name}={value}")?;
            }
            if !record.failing.is_empty() {
                write!(f, "  failing:")?;
                for tuple in &record.failing {
                    write!(f, " ")?;
                    write_tuple(f, tuple)?;
                }
            }
            for fault in &record.faults {
                write!(f, "  fault: {fault}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Collects failure records during one `solve` call. Dropped unseen on
/// success; materialized into the error on universal failure.
pub(crate) struct DebugSink {
    debug: bool,
    info: RandomizationDebugInfo,
    records: usize,
}

impl DebugSink {
    pub(crate) fn new(debug: bool) -> Self {
        Self {
            debug,
            info: RandomizationDebugInfo::default(),
            records: 0,
        }
    }

    pub(crate) fn report(&mut self, report: StrategyReport) {
        self.info.reports.push(report);
    }

    /// Open a failure record; returns its index for `attempt`.
    pub(crate) fn begin_fail(
        &mut self,
        strategy: Option<Strategy>,
        variables: Vec<String>,
        constraints: Vec<Vec<String>>,
    ) -> usize {
        self.info.failures.push(RandomizationFail {
            strategy,
            variables,
            constraints,
            attempts: Vec::new(),
        });
        self.info.failures.len() - 1
    }

    pub(crate) fn attempt(&mut self, fail: usize, record: AttemptRecord) {
        let attempts = &mut self.info.failures[fail].attempts;
        if !self.debug {
            // Keep only the most recent violating attempt.
            attempts.clear();
            attempts.push(record);
            return;
        }
        if self.records >= MAX_DEBUG_RECORDS {
            self.info.truncated = true;
            return;
        }
        self.records += 1;
        attempts.push(record);
    }

    pub(crate) fn into_info(self) -> RandomizationDebugInfo {
        self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn record(attempt: usize) -> AttemptRecord {
        let mut values = Assignment::new();
        values.insert("a".to_string(), Value::Int(attempt as i64));
        AttemptRecord {
            attempt,
            values,
            failing: vec![vec!["a".to_string(), "b".to_string()]],
            faults: vec![],
        }
    }

    #[test]
    fn test_non_debug_keeps_last_attempt_only() {
        let mut sink = DebugSink::new(false);
        let fail = sink.begin_fail(Some(Strategy::Naive), vec!["a".to_string()], vec![]);
        for i in 0..5 {
            sink.attempt(fail, record(i));
        }
        let info = sink.into_info();
        assert_eq!(info.failures[0].attempts.len(), 1);
        assert_eq!(info.failures[0].attempts[0].attempt, 4);
        assert!(!info.truncated);
    }

    #[test]
    fn test_debug_retains_attempts_up_to_cap() {
        let mut sink = DebugSink::new(true);
        let fail = sink.begin_fail(Some(Strategy::Naive), vec!["a".to_string()], vec![]);
        for i in 0..MAX_DEBUG_RECORDS + 10 {
            sink.attempt(fail, record(i));
        }
        let info = sink.into_info();
        assert_eq!(info.failures[0].attempts.len(), MAX_DEBUG_RECORDS);
        assert!(info.truncated);
    }

    #[test]
    fn test_display_mentions_strategy_and_tuple() {
        let mut sink = DebugSink::new(false);
        let fail = sink.begin_fail(
            Some(Strategy::Sparse),
            vec!["a".to_string(), "b".to_string()],
            vec![vec!["a".to_string(), "b".to_string()]],
        );
        sink.attempt(fail, record(3));
        sink.report(StrategyReport {
            strategy: Strategy::Sparse,
            iterations: 17,
            width: Some(4),
            outcome: StrategyOutcome::Exhausted,
        });
        let rendered = sink.into_info().to_string();
        assert!(rendered.contains("sparse"));
        assert!(rendered.contains("(a, b)"));
        assert!(rendered.contains("width 4"));
    }
}
