//! Recognition of solver diagnostics.
//!
//! Solvers announce refusals with fixed phrases on stdout or stderr. The
//! classifier only accepts a refusal when it agrees with its own analysis of
//! the test case.

use std::fmt;

/// A refusal or failure a solver announced.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Diagnostic {
    /// The input file could not be opened.
    UnreadableInput,
    /// The input file was rejected as malformed.
    MalformedInput,
    /// The target has fewer vertices than the pattern.
    TargetTooSmall,
    /// More copies were requested than distinct images exist.
    ImpossibleCopies,
    /// The search finished without an answer.
    NoSolution,
}

impl Diagnostic {
    /// Phrase table, checked in order. Each entry matches when every phrase
    /// in its list occurs.
    const TABLE: [(&'static [&'static str], Self); 11] = [
        (&["ERROR: Cannot open file"], Self::UnreadableInput),
        (&["ERROR: Cannot read"], Self::MalformedInput),
        (&["ERROR: Invalid"], Self::MalformedInput),
        (&["n2=", "< n1="], Self::TargetTooSmall),
        (&["n2 < n1"], Self::TargetTooSmall),
        (&["ERROR: Impossible"], Self::ImpossibleCopies),
        (&["cannot add new vertices"], Self::ImpossibleCopies),
        (&["k > C(n2,n1)"], Self::ImpossibleCopies),
        (&["exceeds the maximum number"], Self::ImpossibleCopies),
        (&["No solution found"], Self::NoSolution),
        (&["Nie znaleziono"], Self::NoSolution),
    ];

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnreadableInput => "unreadable input",
            Self::MalformedInput => "malformed input",
            Self::TargetTooSmall => "target too small",
            Self::ImpossibleCopies => "impossible copy count",
            Self::NoSolution => "no solution",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finds the first known diagnostic in `text`.
///
/// # Examples
/// ```
/// use kextend_core::{recognise_diagnostic, Diagnostic};
///
/// assert_eq!(
///     recognise_diagnostic("ERROR: Impossible - k > C(n2,n1)"),
///     Some(Diagnostic::ImpossibleCopies),
/// );
/// assert_eq!(recognise_diagnostic("all good"), None);
/// ```
#[must_use]
pub fn recognise_diagnostic(text: &str) -> Option<Diagnostic> {
    Diagnostic::TABLE
        .iter()
        .find(|(phrases, _)| phrases.iter().all(|phrase| text.contains(phrase)))
        .map(|&(_, diagnostic)| diagnostic)
}
