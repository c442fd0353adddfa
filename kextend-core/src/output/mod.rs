//! Decoding of solver output.
//!
//! Solvers print either a labelled, human-oriented report (the verbose
//! dialect) or a bare matrix followed by the cost (the compact dialect).
//! [`Dialect::sniff`] picks the parser; both produce the same
//! [`SolverOutcome`]. Parsing is pure: the same text and dimensions always
//! decode to the same outcome.

mod compact;
mod diagnostics;
mod verbose;

use std::{fmt, time::Duration};

use thiserror::Error;

use crate::{
    case::Dimensions,
    error::{GraphError, define_codes},
    graph::Graph,
    mapping::Mapping,
};

pub use self::diagnostics::{Diagnostic, recognise_diagnostic};

/// Markers a solver prints when it searched and found no answer.
const NO_SOLUTION_MARKERS: [&str; 2] = ["No solution found", "Nie znaleziono"];

/// A solver's claimed answer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Solution {
    /// The extended target graph `G'2`.
    pub extended: Graph,
    /// The reported copies, or `None` when the dialect omits them.
    pub mappings: Option<Vec<Mapping>>,
    /// The extension cost the solver printed.
    pub reported_cost: u64,
}

/// Decoded result of a solver run that printed something parseable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SolverOutcome {
    /// The solver claims an answer.
    Found(Solution),
    /// The solver reported that no answer exists.
    NotFound,
}

/// The two output dialects solvers use.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Dialect {
    /// Labelled sections with cost, mappings and extended graph.
    Verbose,
    /// `n`, `n` matrix rows, then the cost.
    Compact,
}

impl Dialect {
    /// Detects the dialect of `text`.
    ///
    /// # Examples
    /// ```
    /// use kextend_core::Dialect;
    ///
    /// assert_eq!(Dialect::sniff("=== Results ===\nExtension cost: 0\n"), Dialect::Verbose);
    /// assert_eq!(Dialect::sniff("1\n0\n0\n"), Dialect::Compact);
    /// ```
    #[must_use]
    pub fn sniff(text: &str) -> Self {
        let verbose = text.lines().any(|line| {
            line.contains("===")
                || line.contains("Results")
                || verbose::COST_LABELS.iter().any(|label| line.contains(label))
        });
        if verbose { Self::Verbose } else { Self::Compact }
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Verbose => "verbose",
            Self::Compact => "compact",
        }
    }

    /// Decodes `text` with this dialect's parser.
    ///
    /// # Errors
    /// Returns a [`ParseFailure`] when the text does not follow the dialect.
    pub fn parse(self, text: &str, dims: &Dimensions) -> Result<SolverOutcome, ParseFailure> {
        if reports_no_solution(text) {
            return Ok(SolverOutcome::NotFound);
        }
        match self {
            Self::Verbose => verbose::parse(text, dims),
            Self::Compact => compact::parse(text, dims),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why solver output could not be decoded.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ParseFailure {
    /// The solver printed nothing.
    #[error("solver output is empty")]
    EmptyOutput,
    /// A required section was absent.
    #[error("{dialect} output lacks the {section} section")]
    MissingSection {
        /// Dialect being decoded.
        dialect: Dialect,
        /// Name of the missing section.
        section: &'static str,
    },
    /// A number could not be read.
    #[error("line {line}: `{token}` is not a non-negative integer")]
    InvalidInteger {
        /// One-based output line.
        line: usize,
        /// Offending text.
        token: String,
    },
    /// The matrix size differs from the target order.
    #[error("extended graph has {actual} vertices, expected {expected}")]
    DimensionMismatch {
        /// Target order.
        expected: usize,
        /// Order printed by the solver.
        actual: usize,
    },
    /// A matrix row had the wrong number of entries.
    #[error("line {line}: row {row} has {actual} entries, expected {expected}")]
    RowLength {
        /// One-based output line.
        line: usize,
        /// Zero-based row index.
        row: usize,
        /// Target order.
        expected: usize,
        /// Entries present.
        actual: usize,
    },
    /// The output ended before the matrix was complete.
    #[error("extended graph has {actual} of {expected} rows")]
    MissingRows {
        /// Target order.
        expected: usize,
        /// Rows found.
        actual: usize,
    },
    /// A copy numbered zero.
    #[error("line {line}: copy {copy} is outside 1..={copies}")]
    CopyOutOfRange {
        /// One-based output line.
        line: usize,
        /// Copy number printed.
        copy: usize,
        /// Requested copy count.
        copies: usize,
    },
    /// A mapped pattern vertex that does not exist.
    #[error("line {line}: copy {copy} maps vertex {vertex}, outside a pattern with {order} vertices")]
    SourceOutOfRange {
        /// One-based output line.
        line: usize,
        /// Copy number.
        copy: usize,
        /// Offending pattern vertex.
        vertex: usize,
        /// Pattern order.
        order: usize,
    },
    /// The same copy number appeared twice.
    #[error("line {line}: copy {copy} is listed more than once")]
    DuplicateCopy {
        /// One-based output line of the repeat.
        line: usize,
        /// Repeated copy number.
        copy: usize,
    },
    /// Content after the final expected value.
    #[error("line {line}: unexpected trailing content")]
    TrailingContent {
        /// One-based output line.
        line: usize,
    },
    /// The decoded rows do not form a graph.
    #[error("extended graph is malformed: {error}")]
    InvalidMatrix {
        /// Underlying graph error.
        #[source]
        error: GraphError,
    },
}

define_codes! {
    /// Stable codes describing [`ParseFailure`] variants.
    enum ParseFailureCode for ParseFailure {
        /// The solver printed nothing.
        EmptyOutput => EmptyOutput => "PARSE_EMPTY_OUTPUT",
        /// A required section was absent.
        MissingSection => MissingSection { .. } => "PARSE_MISSING_SECTION",
        /// A number could not be read.
        InvalidInteger => InvalidInteger { .. } => "PARSE_INVALID_INTEGER",
        /// The matrix size differs from the target order.
        DimensionMismatch => DimensionMismatch { .. } => "PARSE_DIMENSION_MISMATCH",
        /// A matrix row had the wrong number of entries.
        RowLength => RowLength { .. } => "PARSE_ROW_LENGTH",
        /// The output ended before the matrix was complete.
        MissingRows => MissingRows { .. } => "PARSE_MISSING_ROWS",
        /// A copy numbered zero.
        CopyOutOfRange => CopyOutOfRange { .. } => "PARSE_COPY_OUT_OF_RANGE",
        /// The same copy number appeared twice.
        DuplicateCopy => DuplicateCopy { .. } => "PARSE_DUPLICATE_COPY",
        /// A mapped pattern vertex that does not exist.
        SourceOutOfRange => SourceOutOfRange { .. } => "PARSE_SOURCE_OUT_OF_RANGE",
        /// Content after the final expected value.
        TrailingContent => TrailingContent { .. } => "PARSE_TRAILING_CONTENT",
        /// The decoded rows do not form a graph.
        InvalidMatrix => InvalidMatrix { .. } => "PARSE_INVALID_MATRIX",
    }
}

/// Sniffs the dialect of `text` and decodes it.
///
/// # Errors
/// Returns a [`ParseFailure`] when the output is empty or malformed.
///
/// # Examples
/// ```
/// use kextend_core::{parse_output, Dimensions, SolverOutcome};
///
/// let dims = Dimensions { pattern_order: 1, target_order: 1, copies: 1 };
/// let outcome = parse_output("1\n0\n0\n", &dims)?;
/// assert!(matches!(outcome, SolverOutcome::Found(_)));
/// # Ok::<(), kextend_core::ParseFailure>(())
/// ```
pub fn parse_output(text: &str, dims: &Dimensions) -> Result<SolverOutcome, ParseFailure> {
    if text.trim().is_empty() {
        return Err(ParseFailure::EmptyOutput);
    }
    Dialect::sniff(text).parse(text, dims)
}

/// Whether `text` contains a no-solution marker.
#[must_use]
pub fn reports_no_solution(text: &str) -> bool {
    NO_SOLUTION_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Self-reported solver time from a `TIME_MS: <millis>` line.
///
/// Fractional milliseconds are kept to nanosecond precision.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use kextend_core::reported_time;
///
/// assert_eq!(reported_time("TIME_MS: 12.5\n"), Some(Duration::from_micros(12_500)));
/// assert_eq!(reported_time("no timing"), None);
/// ```
#[must_use]
pub fn reported_time(text: &str) -> Option<Duration> {
    const LABEL: &str = "TIME_MS:";
    let value = text.lines().find_map(|line| {
        let start = line.find(LABEL)? + LABEL.len();
        line.get(start..)?.split_whitespace().next()
    })?;
    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    let millis: u64 = whole.parse().ok()?;
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let nanos = fraction
        .chars()
        .chain(std::iter::repeat('0'))
        .take(6)
        .collect::<String>()
        .parse::<u64>()
        .ok()?;
    Some(Duration::from_millis(millis) + Duration::from_nanos(nanos))
}

/// Reads one whitespace-separated matrix row; every token must be a
/// non-negative integer.
pub(crate) fn matrix_row(line: usize, content: &str) -> Result<Vec<u32>, ParseFailure> {
    content
        .split_whitespace()
        .map(|token| parse_number(line, token))
        .collect()
}

/// Assembles decoded rows, each tagged with its output line, into a graph.
pub(crate) fn build_graph(rows: Vec<(usize, Vec<u32>)>) -> Result<Graph, ParseFailure> {
    let lines: Vec<usize> = rows.iter().map(|&(line, _)| line).collect();
    Graph::from_rows(rows.into_iter().map(|(_, entries)| entries)).map_err(|error| match error {
        GraphError::NotSquare {
            row,
            expected,
            actual,
        } => ParseFailure::RowLength {
            line: lines.get(row).copied().unwrap_or_default(),
            row,
            expected,
            actual,
        },
        error => ParseFailure::InvalidMatrix { error },
    })
}

pub(crate) fn parse_number<T: std::str::FromStr>(line: usize, token: &str) -> Result<T, ParseFailure> {
    token.parse().map_err(|_| ParseFailure::InvalidInteger {
        line,
        token: token.to_owned(),
    })
}
