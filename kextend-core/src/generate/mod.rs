//! Test case generation.
//!
//! [`structured`] holds hand-designed families that target specific solver
//! weaknesses; [`fuzz`] draws random instances from an explicit seeded RNG so
//! every case can be regenerated from its seed alone.

pub mod fuzz;
pub mod structured;

use thiserror::Error;

use crate::{case::TestCase, error::InputFormatError, error::define_codes, graph::Graph};

/// A generated test case and where it came from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GeneratedCase {
    /// File-name friendly identifier, unique within its source.
    pub name: String,
    /// Generator that produced the case, used to slice results.
    pub source: String,
    /// Seed the case was drawn from, for random generators.
    pub seed: Option<u64>,
    /// The instance itself.
    pub case: TestCase,
}

impl GeneratedCase {
    pub(crate) fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        pattern: Graph,
        target: Graph,
        copies: usize,
    ) -> Result<Self, GenerateError> {
        Ok(Self {
            name: name.into(),
            source: source.into(),
            seed: None,
            case: TestCase::new(pattern, target, copies)?,
        })
    }

    pub(crate) fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Errors raised while generating cases.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum GenerateError {
    /// A generator configuration value was out of range.
    #[error("invalid generator configuration: {reason}")]
    InvalidConfig {
        /// Human-friendly explanation.
        reason: String,
    },
    /// A generated instance was not a valid test case.
    #[error("generated an invalid case: {error}")]
    Case {
        #[from]
        /// Validation failure for the instance.
        error: InputFormatError,
    },
}

define_codes! {
    /// Stable codes describing [`GenerateError`] variants.
    enum GenerateErrorCode for GenerateError {
        /// A generator configuration value was out of range.
        InvalidConfig => InvalidConfig { .. } => "GENERATE_INVALID_CONFIG",
        /// A generated instance was not a valid test case.
        Case => Case { .. } => "GENERATE_INVALID_CASE",
    }
}

/// Raises entries of `target` so that `pattern` embeds at `positions`,
/// where pattern vertex `i` lands on `positions[i]`.
pub(crate) fn plant(pattern: &Graph, target: &Graph, positions: &[usize]) -> Graph {
    Graph::from_fn(target.order(), |x, y| {
        let required = match (
            positions.iter().position(|&p| p == x),
            positions.iter().position(|&p| p == y),
        ) {
            (Some(u), Some(v)) => pattern.edge_count(u, v),
            _ => 0,
        };
        target.edge_count(x, y).max(required)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Mapping, verify_embedding};

    #[test]
    fn planting_embeds_the_pattern_at_the_positions() {
        let pattern = Graph::from_fn(2, |u, v| u32::from(u == 0 && v == 1) * 3);
        let target = Graph::from_fn(4, |u, v| u32::from(u == 3 && v == 1));
        let planted = plant(&pattern, &target, &[3, 1]);
        assert_eq!(planted.edge_count(3, 1), 3);
        assert_eq!(planted.size(), 3);
        assert!(verify_embedding(&pattern, &planted, &Mapping::from_targets([3, 1])).is_ok());
    }
}
