//! Independent verification of solver answers.
//!
//! Each check recomputes its verdict from the test case and the decoded
//! solver report; nothing the solver claims is trusted. The
//! [`SolutionChecker`] bundles the checks and can stop at the first
//! violation or collect all of them.

mod copies;
mod cost;
mod embedding;
mod order;

use thiserror::Error;

use crate::{case::TestCase, output::Solution};

pub use self::{
    copies::{CopyViolation, CopyViolationCode, verify_copies},
    cost::{CostViolation, CostViolationCode, extension_cost, verify_cost},
    embedding::{EmbeddingViolation, EmbeddingViolationCode, verify_embedding},
    order::{OrderViolation, verify_canonical_order},
};

/// Enumerates the checks applied to a solver answer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SolutionCheck {
    /// The extension keeps every target edge and matches the reported cost.
    Cost,
    /// `k` distinct valid embeddings into the extended graph.
    Copies,
    /// Copies are listed in strictly increasing lexicographic order.
    CanonicalOrder,
}

impl SolutionCheck {
    /// Returns all checks in evaluation order.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Cost, Self::Copies, Self::CanonicalOrder]
    }
}

/// A failed check.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum SolutionViolation {
    /// The extension or its cost is wrong.
    #[error(transparent)]
    Cost(#[from] CostViolation),
    /// The copies are invalid.
    #[error(transparent)]
    Copies(#[from] CopyViolation),
    /// The copies are not in canonical order.
    #[error(transparent)]
    Order(#[from] OrderViolation),
}

/// Everything collected from a full verification pass.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SolutionReport {
    /// Recomputed extension cost, when the extension is structurally valid.
    pub actual_cost: Option<u64>,
    /// Violations that make the answer wrong.
    pub violations: Vec<SolutionViolation>,
    /// Findings that do not fail the answer, such as non-canonical order
    /// outside strict mode.
    pub warnings: Vec<SolutionViolation>,
    /// Whether the copies were available and checked.
    pub mappings_checked: bool,
}

impl SolutionReport {
    /// Whether the answer passed every enforced check.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Runs verification checks for one solver answer.
///
/// When the answer carries no mappings, as with the compact output dialect,
/// copy and order checks are skipped and the report says so through
/// [`SolutionReport::mappings_checked`].
#[derive(Debug)]
pub struct SolutionChecker<'a> {
    case: &'a TestCase,
    solution: &'a Solution,
    strict_order: bool,
}

impl<'a> SolutionChecker<'a> {
    /// Creates a checker for `solution` against `case`.
    #[must_use]
    pub fn new(case: &'a TestCase, solution: &'a Solution) -> Self {
        Self {
            case,
            solution,
            strict_order: false,
        }
    }

    /// Treats non-canonical copy order as a violation instead of a warning.
    #[must_use]
    pub fn with_strict_order(mut self, strict: bool) -> Self {
        self.strict_order = strict;
        self
    }

    fn mappings_available(&self) -> bool {
        self.solution.mappings.is_some()
    }

    /// Runs every check and returns the recomputed cost, or the first
    /// enforced violation.
    ///
    /// # Errors
    /// Returns the first [`SolutionViolation`] encountered.
    pub fn check_all(&self) -> Result<u64, SolutionViolation> {
        let mut cost = None;
        self.run_with_mode(SolutionCheck::all(), &mut EvaluationMode::FailFast, &mut cost)?;
        Ok(cost.unwrap_or(0))
    }

    /// Runs every check and gathers all findings.
    #[must_use]
    pub fn collect_all(&self) -> SolutionReport {
        let mut violations = Vec::new();
        let mut warnings = Vec::new();
        let mut actual_cost = None;
        let _ = self.run_with_mode(
            SolutionCheck::all(),
            &mut EvaluationMode::Collect {
                violations: &mut violations,
                warnings: &mut warnings,
            },
            &mut actual_cost,
        );
        SolutionReport {
            actual_cost,
            violations,
            warnings,
            mappings_checked: self.mappings_available(),
        }
    }

    fn run_with_mode(
        &self,
        checks: impl IntoIterator<Item = SolutionCheck>,
        mode: &mut EvaluationMode<'_>,
        actual_cost: &mut Option<u64>,
    ) -> Result<(), SolutionViolation> {
        let solution = self.solution;
        for check in checks {
            match check {
                SolutionCheck::Cost => {
                    match verify_cost(self.case.target(), &solution.extended, solution.reported_cost)
                    {
                        Ok(cost) => *actual_cost = Some(cost),
                        Err(violation) => {
                            if let CostViolation::CostMismatch { actual, .. } = violation {
                                *actual_cost = Some(actual);
                            }
                            mode.record(violation.into())?;
                        }
                    }
                }
                SolutionCheck::Copies => {
                    let Some(mappings) = &solution.mappings else {
                        continue;
                    };
                    if let Err(violation) = verify_copies(
                        self.case.pattern(),
                        &solution.extended,
                        mappings,
                        self.case.copies(),
                    ) {
                        mode.record(violation.into())?;
                    }
                }
                SolutionCheck::CanonicalOrder => {
                    let Some(mappings) = &solution.mappings else {
                        continue;
                    };
                    if let Err(violation) = verify_canonical_order(mappings) {
                        if self.strict_order {
                            mode.record(violation.into())?;
                        } else {
                            mode.warn(violation.into());
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

enum EvaluationMode<'a> {
    FailFast,
    Collect {
        violations: &'a mut Vec<SolutionViolation>,
        warnings: &'a mut Vec<SolutionViolation>,
    },
}

impl EvaluationMode<'_> {
    fn record(&mut self, violation: SolutionViolation) -> Result<(), SolutionViolation> {
        match self {
            Self::FailFast => Err(violation),
            Self::Collect { violations, .. } => {
                violations.push(violation);
                Ok(())
            }
        }
    }

    fn warn(&mut self, warning: SolutionViolation) {
        if let Self::Collect { warnings, .. } = self {
            warnings.push(warning);
        }
    }
}

#[cfg(test)]
mod tests;
