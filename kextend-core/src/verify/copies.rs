//! Checks that a solver reported `k` valid and pairwise distinct copies.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::{
    error::define_codes,
    graph::Graph,
    mapping::Mapping,
    verify::embedding::{EmbeddingViolation, verify_embedding},
};

/// Why a set of reported copies is not a valid answer.
///
/// Copy numbers are one-based, matching solver output.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum CopyViolation {
    /// The number of reported mappings differs from `k`.
    #[error("expected {expected} mappings but {actual} were reported")]
    CountMismatch {
        /// Requested copy count.
        expected: usize,
        /// Reported mapping count.
        actual: usize,
    },
    /// A copy is not an embedding.
    #[error("copy {copy}: {violation}")]
    Embedding {
        /// One-based copy number.
        copy: usize,
        #[source]
        /// The embedding failure.
        violation: EmbeddingViolation,
    },
    /// Two copies use the same set of host vertices.
    #[error("copies {first} and {second} share the vertex set {image:?}")]
    DuplicateImage {
        /// One-based number of the earlier copy.
        first: usize,
        /// One-based number of the later copy.
        second: usize,
        /// The shared vertex set.
        image: Vec<usize>,
    },
}

define_codes! {
    /// Stable codes describing [`CopyViolation`] variants.
    enum CopyViolationCode for CopyViolation {
        /// The number of reported mappings differs from `k`.
        CountMismatch => CountMismatch { .. } => "COPIES_COUNT_MISMATCH",
        /// A copy is not an embedding.
        Embedding => Embedding { .. } => "COPIES_INVALID_EMBEDDING",
        /// Two copies use the same set of host vertices.
        DuplicateImage => DuplicateImage { .. } => "COPIES_DUPLICATE_IMAGE",
    }
}

/// Verifies that `mappings` holds exactly `copies` embeddings of `pattern`
/// into `host` with pairwise distinct images.
///
/// Embeddings are checked first, in copy order; duplicates are reported for
/// the first colliding pair `(i, j)` with `i < j` in lexicographic order.
///
/// # Errors
/// Returns the first [`CopyViolation`] found.
pub fn verify_copies(
    pattern: &Graph,
    host: &Graph,
    mappings: &[Mapping],
    copies: usize,
) -> Result<(), CopyViolation> {
    if mappings.len() != copies {
        return Err(CopyViolation::CountMismatch {
            expected: copies,
            actual: mappings.len(),
        });
    }

    for (index, mapping) in mappings.iter().enumerate() {
        verify_embedding(pattern, host, mapping).map_err(|violation| CopyViolation::Embedding {
            copy: index + 1,
            violation,
        })?;
    }

    let images: Vec<BTreeSet<usize>> = mappings.iter().map(Mapping::image).collect();
    for (i, earlier) in images.iter().enumerate() {
        if let Some(offset) = images
            .iter()
            .skip(i + 1)
            .position(|later| later == earlier)
        {
            return Err(CopyViolation::DuplicateImage {
                first: i + 1,
                second: i + offset + 2,
                image: earlier.iter().copied().collect(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn path() -> Result<Graph, crate::GraphError> {
        Graph::from_rows(vec![vec![0, 1, 0], vec![0, 0, 1], vec![0, 0, 0]])
    }

    fn complete(order: usize) -> Result<Graph, crate::GraphError> {
        Graph::from_rows(
            (0..order)
                .map(|u| (0..order).map(|v| u32::from(u != v)).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn accepts_distinct_copies() -> TestResult {
        let mappings = [
            Mapping::from_targets([0, 1, 2]),
            Mapping::from_targets([0, 1, 3]),
            Mapping::from_targets([3, 2, 1]),
        ];
        verify_copies(&path()?, &complete(4)?, &mappings, 3)?;
        Ok(())
    }

    #[test]
    fn permuted_copy_counts_as_duplicate() -> TestResult {
        let mappings = [
            Mapping::from_targets([0, 1, 2]),
            Mapping::from_targets([0, 1, 3]),
            Mapping::from_targets([2, 1, 0]),
        ];
        let err = verify_copies(&path()?, &complete(4)?, &mappings, 3)
            .expect_err("copies 1 and 3 share a vertex set");
        assert_eq!(
            err,
            CopyViolation::DuplicateImage {
                first: 1,
                second: 3,
                image: vec![0, 1, 2],
            }
        );
        Ok(())
    }

    #[rstest]
    #[case::too_few(1)]
    #[case::too_many(3)]
    fn count_must_match_k(#[case] copies: usize) -> TestResult {
        let mappings = [
            Mapping::from_targets([0, 1, 2]),
            Mapping::from_targets([1, 2, 3]),
        ];
        let err = verify_copies(&path()?, &complete(4)?, &mappings, copies)
            .expect_err("count mismatch");
        assert_eq!(err.code(), CopyViolationCode::CountMismatch);
        Ok(())
    }

    #[test]
    fn embedding_failures_name_the_copy() -> TestResult {
        let host = path()?;
        let mappings = [
            Mapping::from_targets([0, 1, 2]),
            Mapping::from_targets([2, 1, 0]),
        ];
        let err = verify_copies(&path()?, &host, &mappings, 2).expect_err("reversed path");
        match err {
            CopyViolation::Embedding { copy, violation } => {
                assert_eq!(copy, 2);
                assert!(matches!(
                    violation,
                    EmbeddingViolation::MultiplicityShortfall { .. }
                ));
            }
            other => panic!("expected embedding violation, got {other:?}"),
        }
        Ok(())
    }
}
