//! Recomputes the extension cost and compares it with the reported value.

use thiserror::Error;

use crate::{error::define_codes, graph::Graph};

/// Why a reported extension and its cost do not agree with the target.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum CostViolation {
    /// The extended graph has a different vertex count from the target.
    #[error("extended graph has {extended} vertices but the target has {original}")]
    OrderMismatch {
        /// Target order.
        original: usize,
        /// Extended graph order.
        extended: usize,
    },
    /// The extension dropped edges that were present in the target.
    #[error("extension removed edges: E'2({u},{v})={extended} < E2({u},{v})={original}")]
    EdgeRemoved {
        /// Tail of the edge.
        u: usize,
        /// Head of the edge.
        v: usize,
        /// Multiplicity in the target.
        original: u32,
        /// Multiplicity in the extended graph.
        extended: u32,
    },
    /// The reported cost differs from the recomputed one.
    #[error("reported cost {reported} but the extension adds {actual} edges")]
    CostMismatch {
        /// Value printed by the solver.
        reported: u64,
        /// Recomputed cost.
        actual: u64,
    },
}

define_codes! {
    /// Stable codes describing [`CostViolation`] variants.
    enum CostViolationCode for CostViolation {
        /// The extended graph has a different vertex count from the target.
        OrderMismatch => OrderMismatch { .. } => "COST_ORDER_MISMATCH",
        /// The extension dropped edges that were present in the target.
        EdgeRemoved => EdgeRemoved { .. } => "COST_EDGE_REMOVED",
        /// The reported cost differs from the recomputed one.
        CostMismatch => CostMismatch { .. } => "COST_MISMATCH",
    }
}

/// Number of edges added to `original` to obtain `extended`.
///
/// # Errors
/// Returns [`CostViolation::OrderMismatch`] when the graphs differ in order
/// and [`CostViolation::EdgeRemoved`] for the first entry, in row-major
/// order, that decreased.
///
/// # Examples
/// ```
/// use kextend_core::{extension_cost, Graph};
///
/// let target = Graph::from_rows(vec![vec![0, 1], vec![0, 0]])?;
/// let extended = Graph::from_rows(vec![vec![1, 3], vec![0, 0]])?;
/// assert_eq!(extension_cost(&target, &extended), Ok(3));
/// # Ok::<(), kextend_core::GraphError>(())
/// ```
pub fn extension_cost(original: &Graph, extended: &Graph) -> Result<u64, CostViolation> {
    if original.order() != extended.order() {
        return Err(CostViolation::OrderMismatch {
            original: original.order(),
            extended: extended.order(),
        });
    }
    let mut cost = 0_u64;
    for (u, (before, after)) in original.rows().zip(extended.rows()).enumerate() {
        for (v, (&was, &now)) in before.iter().zip(after).enumerate() {
            if now < was {
                return Err(CostViolation::EdgeRemoved {
                    u,
                    v,
                    original: was,
                    extended: now,
                });
            }
            cost += u64::from(now - was);
        }
    }
    Ok(cost)
}

/// Recomputes the extension cost and checks it against `reported`.
///
/// # Errors
/// Returns the structural violation from [`extension_cost`] or
/// [`CostViolation::CostMismatch`] when the values disagree.
pub fn verify_cost(original: &Graph, extended: &Graph, reported: u64) -> Result<u64, CostViolation> {
    let actual = extension_cost(original, extended)?;
    if actual != reported {
        return Err(CostViolation::CostMismatch { reported, actual });
    }
    Ok(actual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[rstest]
    #[case::unchanged(vec![vec![0, 2], vec![1, 0]], 0)]
    #[case::loops_and_parallel(vec![vec![1, 4], vec![1, 0]], 3)]
    fn cost_counts_added_multiplicity(#[case] rows: Vec<Vec<u32>>, #[case] expected: u64) -> TestResult {
        let target = Graph::from_rows(vec![vec![0, 2], vec![1, 0]])?;
        let extended = Graph::from_rows(rows)?;
        assert_eq!(verify_cost(&target, &extended, expected)?, expected);
        Ok(())
    }

    #[test]
    fn removed_edge_is_distinct_from_wrong_total() -> TestResult {
        let target = Graph::from_rows(vec![vec![0, 2], vec![1, 0]])?;
        let shrunk = Graph::from_rows(vec![vec![3, 1], vec![1, 0]])?;
        let err = verify_cost(&target, &shrunk, 2).expect_err("edge (0,1) shrank");
        assert_eq!(
            err,
            CostViolation::EdgeRemoved {
                u: 0,
                v: 1,
                original: 2,
                extended: 1,
            }
        );
        Ok(())
    }

    #[test]
    fn wrong_total_reports_both_values() -> TestResult {
        let target = Graph::from_rows(vec![vec![0, 0], vec![0, 0]])?;
        let extended = Graph::from_rows(vec![vec![0, 1], vec![1, 0]])?;
        let err = verify_cost(&target, &extended, 1).expect_err("cost is two");
        assert_eq!(err, CostViolation::CostMismatch { reported: 1, actual: 2 });
        assert_eq!(err.code().as_str(), "COST_MISMATCH");
        Ok(())
    }

    #[test]
    fn order_mismatch_is_reported_first() -> TestResult {
        let err = extension_cost(&Graph::empty(2), &Graph::empty(3))
            .expect_err("orders differ");
        assert_eq!(err.code(), CostViolationCode::OrderMismatch);
        Ok(())
    }
}
