//! Batch statistics.
//!
//! The aggregator only counts. Correct rejections of impossible cases and
//! expected no-solution answers count as passes.

use std::{collections::BTreeMap, fmt, time::Duration};

use crate::{algorithm::Algorithm, classify::Verdict};

/// Per-outcome counters for a slice of a batch.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OutcomeCounts {
    /// Correct answers and correct malformed-input rejections.
    pub ok: u64,
    /// Answers the harness disproved.
    pub validation_failures: u64,
    /// Outputs that could not be decoded.
    pub parse_errors: u64,
    /// No-solution answers to impossible cases.
    pub expected_no_solution: u64,
    /// No-solution answers to satisfiable cases.
    pub unexpected_no_solution: u64,
    /// Correct rejections of impossible cases.
    pub impossible: u64,
    /// Killed runs.
    pub timeouts: u64,
    /// Runs that failed at the process level.
    pub process_errors: u64,
    passing_time: Duration,
    timed_passes: u32,
}

impl OutcomeCounts {
    /// Counts one verdict, with the solver time when known.
    pub fn record(&mut self, verdict: &Verdict, time: Option<Duration>) {
        let counter = match verdict {
            Verdict::Ok => &mut self.ok,
            Verdict::Fail { .. } => &mut self.validation_failures,
            Verdict::ParseError { .. } => &mut self.parse_errors,
            Verdict::NoSolution { expected: true } => &mut self.expected_no_solution,
            Verdict::NoSolution { expected: false } => &mut self.unexpected_no_solution,
            Verdict::Impossible => &mut self.impossible,
            Verdict::Timeout => &mut self.timeouts,
            Verdict::ProcessError { .. } => &mut self.process_errors,
        };
        *counter += 1;
        if let Some(time) = time.filter(|_| verdict.is_pass()) {
            self.passing_time = self.passing_time.saturating_add(time);
            self.timed_passes = self.timed_passes.saturating_add(1);
        }
    }

    /// Number of recorded runs.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.ok
            + self.validation_failures
            + self.parse_errors
            + self.expected_no_solution
            + self.unexpected_no_solution
            + self.impossible
            + self.timeouts
            + self.process_errors
    }

    /// Number of passing runs.
    #[must_use]
    pub const fn passed(&self) -> u64 {
        self.ok + self.impossible + self.expected_no_solution
    }

    /// Number of runs that did not pass.
    #[must_use]
    pub const fn failed(&self) -> u64 {
        self.total() - self.passed()
    }

    /// Passed over total.
    #[must_use]
    pub const fn pass_rate(&self) -> PassRate {
        PassRate {
            passed: self.passed(),
            total: self.total(),
        }
    }

    /// Mean solver time over passing runs that reported one.
    #[must_use]
    pub fn mean_passing_time(&self) -> Option<Duration> {
        self.passing_time.checked_div(self.timed_passes)
    }
}

/// A pass rate that renders as `passed/total (pct%)`.
///
/// # Examples
/// ```
/// use kextend_core::PassRate;
///
/// assert_eq!(PassRate { passed: 2, total: 3 }.to_string(), "2/3 (66.6%)");
/// assert_eq!(PassRate { passed: 0, total: 0 }.to_string(), "0/0 (n/a)");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PassRate {
    /// Passing runs.
    pub passed: u64,
    /// All runs.
    pub total: u64,
}

impl PassRate {
    /// The rate in tenths of a percent, rounded down; `None` for an empty
    /// slice.
    #[must_use]
    pub fn per_mille(self) -> Option<u64> {
        self.passed.saturating_mul(1000).checked_div(self.total)
    }
}

impl fmt::Display for PassRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.per_mille() {
            Some(per_mille) => write!(
                f,
                "{}/{} ({}.{}%)",
                self.passed,
                self.total,
                per_mille.checked_div(10).unwrap_or(0),
                per_mille.checked_rem(10).unwrap_or(0)
            ),
            None => write!(f, "{}/{} (n/a)", self.passed, self.total),
        }
    }
}

/// Accumulates verdicts across a batch, overall and sliced by algorithm and
/// by case source.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Aggregator {
    overall: OutcomeCounts,
    by_algorithm: BTreeMap<Algorithm, OutcomeCounts>,
    by_source: BTreeMap<String, OutcomeCounts>,
}

impl Aggregator {
    /// An empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one run.
    pub fn record(
        &mut self,
        source: &str,
        algorithm: Algorithm,
        verdict: &Verdict,
        time: Option<Duration>,
    ) {
        self.overall.record(verdict, time);
        self.by_algorithm
            .entry(algorithm)
            .or_default()
            .record(verdict, time);
        self.by_source
            .entry(source.to_owned())
            .or_default()
            .record(verdict, time);
    }

    /// Counts over the whole batch.
    #[must_use]
    pub const fn overall(&self) -> &OutcomeCounts {
        &self.overall
    }

    /// Counts per algorithm.
    #[must_use]
    pub const fn by_algorithm(&self) -> &BTreeMap<Algorithm, OutcomeCounts> {
        &self.by_algorithm
    }

    /// Counts per case source, such as `tricky` or `fuzz`.
    #[must_use]
    pub const fn by_source(&self) -> &BTreeMap<String, OutcomeCounts> {
        &self.by_source
    }

    /// Whether every recorded run passed.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.overall.failed() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::ok(Verdict::Ok, true)]
    #[case::impossible(Verdict::Impossible, true)]
    #[case::expected(Verdict::NoSolution { expected: true }, true)]
    #[case::unexpected(Verdict::NoSolution { expected: false }, false)]
    #[case::timeout(Verdict::Timeout, false)]
    #[case::fail(Verdict::Fail { reasons: vec!["bad".into()] }, false)]
    fn passes_follow_the_verdict(#[case] verdict: Verdict, #[case] passes: bool) {
        let mut counts = OutcomeCounts::default();
        counts.record(&verdict, None);
        assert_eq!(counts.total(), 1);
        assert_eq!(counts.passed(), u64::from(passes));
    }

    #[test]
    fn mean_time_only_counts_passes() {
        let mut counts = OutcomeCounts::default();
        counts.record(&Verdict::Ok, Some(Duration::from_millis(10)));
        counts.record(&Verdict::Impossible, Some(Duration::from_millis(30)));
        counts.record(&Verdict::Timeout, Some(Duration::from_secs(30)));
        assert_eq!(counts.mean_passing_time(), Some(Duration::from_millis(20)));
        assert_eq!(OutcomeCounts::default().mean_passing_time(), None);
    }

    #[test]
    fn slices_by_algorithm_and_source() {
        let mut aggregator = Aggregator::new();
        aggregator.record("tricky", Algorithm::Exact, &Verdict::Ok, None);
        aggregator.record("tricky", Algorithm::Approximate, &Verdict::Timeout, None);
        aggregator.record("fuzz", Algorithm::Exact, &Verdict::Impossible, None);

        assert_eq!(aggregator.overall().total(), 3);
        assert_eq!(aggregator.overall().pass_rate().to_string(), "2/3 (66.6%)");
        assert_eq!(aggregator.by_algorithm()[&Algorithm::Exact].passed(), 2);
        assert_eq!(aggregator.by_algorithm()[&Algorithm::Approximate].timeouts, 1);
        assert_eq!(aggregator.by_source()["tricky"].total(), 2);
        assert!(!aggregator.all_passed());
    }

    #[test]
    fn full_marks_render_as_one_hundred_percent() {
        let rate = PassRate { passed: 4, total: 4 };
        assert_eq!(rate.to_string(), "4/4 (100.0%)");
    }
}
