//! Classification of a single solver execution.
//!
//! A run moves through [`ExecutionStage`]s from `Pending` to a terminal
//! stage, and ends with exactly one [`Verdict`]. Every per-test problem is
//! data here: nothing in this module returns an error.

use std::{fmt, time::Duration};

use tracing::{debug, trace};

use crate::{
    case::TestCase,
    error::{InputFormatError, define_codes},
    output::{
        Diagnostic, ParseFailure, Solution, SolverOutcome, parse_output, recognise_diagnostic,
        reported_time,
    },
    verify::SolutionChecker,
};

/// Longest excerpt of solver output kept in a process error.
const EXCERPT_CHARS: usize = 200;

/// Process-level failure categories.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ProcessErrorKind {
    /// The solver executable could not be started.
    SpawnFailed,
    /// The solver could not open its input file.
    UnreadableInput,
    /// The solver exited unsuccessfully without a recognised diagnostic.
    NonZeroExit {
        /// Exit status, when the process was not killed by a signal.
        code: Option<i32>,
    },
    /// Reading the solver's output streams failed.
    Io,
}

impl fmt::Display for ProcessErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpawnFailed => f.write_str("spawn failed"),
            Self::UnreadableInput => f.write_str("unreadable input"),
            Self::NonZeroExit { code: Some(code) } => write!(f, "exit status {code}"),
            Self::NonZeroExit { code: None } => f.write_str("terminated by signal"),
            Self::Io => f.write_str("i/o error"),
        }
    }
}

/// Everything captured from a solver that ran to completion.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Capture {
    /// Standard output, decoded lossily as UTF-8.
    pub stdout: String,
    /// Standard error, decoded lossily as UTF-8.
    pub stderr: String,
    /// Exit status, `None` when killed by a signal.
    pub exit_code: Option<i32>,
    /// Wall-clock time measured by the harness.
    pub elapsed: Duration,
}

impl Capture {
    /// A successful run that printed `stdout`.
    #[must_use]
    pub fn success(stdout: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
            elapsed,
        }
    }

    fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }

    fn excerpt(&self) -> String {
        let line = [&self.stderr, &self.stdout]
            .into_iter()
            .flat_map(|stream| stream.lines())
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("no output");
        line.chars().take(EXCERPT_CHARS).collect()
    }
}

/// How a solver invocation ended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RunOutcome {
    /// The process exited on its own.
    Completed(Capture),
    /// The process exceeded its budget and was killed.
    TimedOut {
        /// Time waited before the kill.
        elapsed: Duration,
    },
    /// The process could not be run or observed.
    Failed {
        /// Failure category.
        kind: ProcessErrorKind,
        /// Human-readable detail.
        detail: String,
    },
}

/// The test case a run was given.
#[derive(Clone, Copy, Debug)]
pub enum CaseInput<'a> {
    /// A well-formed instance.
    Parsed(&'a TestCase),
    /// A file the harness itself could not parse; the solver should reject
    /// it too.
    Malformed(&'a InputFormatError),
}

impl<'a> From<&'a TestCase> for CaseInput<'a> {
    fn from(case: &'a TestCase) -> Self {
        Self::Parsed(case)
    }
}

impl<'a> From<&'a InputFormatError> for CaseInput<'a> {
    fn from(error: &'a InputFormatError) -> Self {
        Self::Malformed(error)
    }
}

/// Final judgement on one run.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Verdict {
    /// The answer, or the refusal, is correct.
    Ok,
    /// The solver claimed something the harness disproved.
    Fail {
        /// Each violated invariant with its offending indices.
        reasons: Vec<String>,
    },
    /// The solver's output could not be decoded.
    ParseError {
        /// Why decoding failed.
        failure: ParseFailure,
    },
    /// The solver finished and reported no answer.
    NoSolution {
        /// Whether the instance truly has no answer.
        expected: bool,
    },
    /// The solver rejected an instance that has no answer.
    Impossible,
    /// The solver ran out of time and was killed.
    Timeout,
    /// The solver could not be run or failed unrecognisably.
    ProcessError {
        /// Failure category.
        kind: ProcessErrorKind,
        /// Human-readable detail.
        detail: String,
    },
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            Self::Fail { reasons } => write!(f, "validation failed: {}", reasons.join("; ")),
            Self::ParseError { failure } => write!(f, "unparseable output: {failure}"),
            Self::NoSolution { expected: true } => f.write_str("no solution (expected)"),
            Self::NoSolution { expected: false } => f.write_str("no solution (unexpected)"),
            Self::Impossible => f.write_str("correctly rejected as impossible"),
            Self::Timeout => f.write_str("timed out"),
            Self::ProcessError { kind, detail } => write!(f, "process error ({kind}): {detail}"),
        }
    }
}

define_codes! {
    /// The fixed outcome taxonomy used in records and summaries.
    enum OutcomeKind for Verdict {
        /// The answer, or the refusal, is correct.
        Ok => Ok => "OK",
        /// The solver claimed something the harness disproved.
        ValidationFailure => Fail { .. } => "VALIDATION_FAILURE",
        /// The solver's output could not be decoded.
        ParseError => ParseError { .. } => "PARSE_ERROR",
        /// The solver reported no answer.
        NoSolution => NoSolution { .. } => "NO_SOLUTION",
        /// The solver rejected an instance that has no answer.
        Impossible => Impossible => "IMPOSSIBLE",
        /// The solver was killed after its budget.
        Timeout => Timeout => "TIMEOUT",
        /// The solver could not be run or failed unrecognisably.
        ProcessError => ProcessError { .. } => "PROCESS_ERROR",
    }
}

impl Verdict {
    /// Whether the run counts as a pass. Correct rejections and expected
    /// no-solution answers pass.
    ///
    /// # Examples
    /// ```
    /// use kextend_core::Verdict;
    ///
    /// assert!(Verdict::Impossible.is_pass());
    /// assert!(Verdict::NoSolution { expected: true }.is_pass());
    /// assert!(!Verdict::NoSolution { expected: false }.is_pass());
    /// ```
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(
            self,
            Self::Ok | Self::Impossible | Self::NoSolution { expected: true }
        )
    }

    fn fail(reason: impl Into<String>) -> Self {
        Self::Fail {
            reasons: vec![reason.into()],
        }
    }
}

/// Stages of one test execution.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ExecutionStage {
    /// Not yet started.
    Pending,
    /// The solver process finished.
    Ran,
    /// The output decoded.
    ParsedOk,
    /// The output could not be decoded.
    ParseFailed,
    /// The solver was killed after its budget.
    TimedOut,
    /// The solver could not be run or failed unrecognisably.
    ProcessErrored,
    /// The answer or refusal was judged.
    Verified,
}

impl ExecutionStage {
    /// Whether `next` may follow `self`.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Ran | Self::ProcessErrored)
                | (
                    Self::Ran,
                    Self::ParsedOk
                        | Self::ParseFailed
                        | Self::TimedOut
                        | Self::ProcessErrored
                        | Self::Verified
                )
                | (Self::ParsedOk | Self::ParseFailed, Self::Verified)
        )
    }
}

/// Classification of one run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Classification {
    /// Final judgement.
    pub verdict: Verdict,
    /// Stages visited, starting at [`ExecutionStage::Pending`].
    pub stages: Vec<ExecutionStage>,
    /// Cost the solver reported, when it claimed an answer.
    pub reported_cost: Option<u64>,
    /// Solver time, preferring the solver's own `TIME_MS` report.
    pub solver_time: Option<Duration>,
    /// Non-failing observations such as skipped checks.
    pub notes: Vec<String>,
}

impl Classification {
    fn pending() -> Self {
        Self {
            verdict: Verdict::Ok,
            stages: vec![ExecutionStage::Pending],
            reported_cost: None,
            solver_time: None,
            notes: Vec::new(),
        }
    }

    /// The last stage reached.
    #[must_use]
    pub fn stage(&self) -> ExecutionStage {
        self.stages
            .last()
            .copied()
            .unwrap_or(ExecutionStage::Pending)
    }

    fn advance(&mut self, next: ExecutionStage) {
        let current = self.stage();
        if current.can_advance_to(next) {
            trace!(from = ?current, to = ?next, "stage transition");
        } else {
            debug!(from = ?current, to = ?next, "unexpected stage transition");
        }
        self.stages.push(next);
    }

    fn finish(mut self, stage: ExecutionStage, verdict: Verdict) -> Self {
        self.advance(stage);
        self.verdict = verdict;
        self
    }
}

/// Turns run outcomes into verdicts.
#[derive(Clone, Copy, Debug, Default)]
pub struct Classifier {
    strict_order: bool,
}

impl Classifier {
    /// A classifier that reports non-canonical copy order as a note.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            strict_order: false,
        }
    }

    /// Treats non-canonical copy order as a validation failure.
    #[must_use]
    pub const fn with_strict_order(mut self, strict: bool) -> Self {
        self.strict_order = strict;
        self
    }

    /// Classifies one run of `input`.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use kextend_core::{Capture, Classifier, OutcomeKind, RunOutcome, TestCase};
    ///
    /// let case = TestCase::parse("2\n0 1\n0 0\n2\n0 0\n0 0\n1\n")?;
    /// let run = RunOutcome::Completed(Capture::success("2\n0 1\n0 0\n1\n", Duration::ZERO));
    /// let classification = Classifier::new().classify((&case).into(), &run);
    /// assert_eq!(classification.verdict.code(), OutcomeKind::Ok);
    /// # Ok::<(), kextend_core::InputFormatError>(())
    /// ```
    #[must_use]
    pub fn classify(&self, input: CaseInput<'_>, run: &RunOutcome) -> Classification {
        let classification = match run {
            RunOutcome::TimedOut { elapsed } => {
                let mut pending = Classification::pending();
                pending.advance(ExecutionStage::Ran);
                pending.solver_time = Some(*elapsed);
                pending.finish(ExecutionStage::TimedOut, Verdict::Timeout)
            }
            RunOutcome::Failed { kind, detail } => Classification::pending().finish(
                ExecutionStage::ProcessErrored,
                Verdict::ProcessError {
                    kind: *kind,
                    detail: detail.clone(),
                },
            ),
            RunOutcome::Completed(capture) => self.classify_capture(input, capture),
        };
        debug!(
            outcome = %classification.verdict.code(),
            stage = ?classification.stage(),
            "classified run"
        );
        classification
    }

    fn classify_capture(&self, input: CaseInput<'_>, capture: &Capture) -> Classification {
        let mut classification = Classification::pending();
        classification.advance(ExecutionStage::Ran);
        classification.solver_time = reported_time(&capture.stdout).or(Some(capture.elapsed));

        let combined = format!("{}\n{}", capture.stdout, capture.stderr);
        let diagnostic = recognise_diagnostic(&combined);

        let case = match input {
            CaseInput::Parsed(case) => case,
            CaseInput::Malformed(error) => {
                let verdict = judge_malformed(error, diagnostic, capture, &mut classification);
                return classification.finish(ExecutionStage::Verified, verdict);
            }
        };

        if !capture.succeeded() {
            return match diagnostic {
                Some(diagnostic) => {
                    let verdict = judge_rejection(case, diagnostic);
                    classification.finish(ExecutionStage::Verified, verdict)
                }
                None => classification.finish(
                    ExecutionStage::ProcessErrored,
                    Verdict::ProcessError {
                        kind: ProcessErrorKind::NonZeroExit {
                            code: capture.exit_code,
                        },
                        detail: capture.excerpt(),
                    },
                ),
            };
        }

        match parse_output(&capture.stdout, &case.dimensions()) {
            Ok(SolverOutcome::NotFound) => {
                classification.advance(ExecutionStage::ParsedOk);
                classification.finish(
                    ExecutionStage::Verified,
                    Verdict::NoSolution {
                        expected: case.is_impossible(),
                    },
                )
            }
            Ok(SolverOutcome::Found(solution)) => {
                classification.advance(ExecutionStage::ParsedOk);
                classification.reported_cost = Some(solution.reported_cost);
                let verdict = self.judge_solution(case, &solution, &mut classification.notes);
                classification.finish(ExecutionStage::Verified, verdict)
            }
            Err(failure) => {
                classification.advance(ExecutionStage::ParseFailed);
                match diagnostic {
                    Some(diagnostic) => {
                        let verdict = judge_rejection(case, diagnostic);
                        classification.finish(ExecutionStage::Verified, verdict)
                    }
                    None => {
                        classification.verdict = Verdict::ParseError { failure };
                        classification
                    }
                }
            }
        }
    }

    fn judge_solution(&self, case: &TestCase, solution: &Solution, notes: &mut Vec<String>) -> Verdict {
        let report = SolutionChecker::new(case, solution)
            .with_strict_order(self.strict_order)
            .collect_all();
        let mut reasons: Vec<String> = report.violations.iter().map(ToString::to_string).collect();
        if case.is_impossible() {
            reasons.insert(0, impossible_claim(case));
        }
        notes.extend(report.warnings.iter().map(|w| format!("warning: {w}")));
        if !report.mappings_checked {
            notes.push("mappings unavailable; copy check skipped".to_owned());
        }
        if reasons.is_empty() {
            Verdict::Ok
        } else {
            Verdict::Fail { reasons }
        }
    }
}

fn impossible_claim(case: &TestCase) -> String {
    let dims = case.dimensions();
    if case.target_too_small() {
        format!(
            "solver claimed an answer but n2={} < n1={}",
            dims.target_order, dims.pattern_order
        )
    } else {
        format!(
            "solver claimed {} copies but only C({},{})={} distinct images exist",
            dims.copies,
            dims.target_order,
            dims.pattern_order,
            case.max_distinct_images()
        )
    }
}

fn judge_rejection(case: &TestCase, diagnostic: Diagnostic) -> Verdict {
    let dims = case.dimensions();
    match diagnostic {
        Diagnostic::UnreadableInput => Verdict::ProcessError {
            kind: ProcessErrorKind::UnreadableInput,
            detail: "solver could not open its input file".to_owned(),
        },
        Diagnostic::MalformedInput => {
            Verdict::fail("solver rejected a well-formed input as malformed")
        }
        Diagnostic::TargetTooSmall if case.target_too_small() => Verdict::Impossible,
        Diagnostic::TargetTooSmall => Verdict::fail(format!(
            "solver claimed the target is too small but n2={} >= n1={}",
            dims.target_order, dims.pattern_order
        )),
        Diagnostic::ImpossibleCopies if case.is_impossible() => Verdict::Impossible,
        Diagnostic::ImpossibleCopies => Verdict::fail(format!(
            "solver rejected k={} but C({},{})={} distinct images exist",
            dims.copies,
            dims.target_order,
            dims.pattern_order,
            case.max_distinct_images()
        )),
        Diagnostic::NoSolution => Verdict::NoSolution {
            expected: case.is_impossible(),
        },
    }
}

fn judge_malformed(
    error: &InputFormatError,
    diagnostic: Option<Diagnostic>,
    capture: &Capture,
    classification: &mut Classification,
) -> Verdict {
    match diagnostic {
        Some(Diagnostic::MalformedInput) => {
            classification
                .notes
                .push(format!("solver rejected malformed input: {error}"));
            Verdict::Ok
        }
        Some(Diagnostic::UnreadableInput) => Verdict::ProcessError {
            kind: ProcessErrorKind::UnreadableInput,
            detail: capture.excerpt(),
        },
        _ => Verdict::fail(format!(
            "input is malformed ({error}) but the solver did not reject it"
        )),
    }
}
