//! Canonical ordering of reported copies.

use thiserror::Error;

use crate::mapping::Mapping;

/// Copies that are not listed in strictly increasing lexicographic order of
/// their assignment tuples.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("copy {earlier} ({earlier_mapping}) does not precede copy {later} ({later_mapping})")]
pub struct OrderViolation {
    /// One-based number of the earlier copy.
    pub earlier: usize,
    /// One-based number of the later copy.
    pub later: usize,
    /// Assignments of the earlier copy.
    pub earlier_mapping: Mapping,
    /// Assignments of the later copy.
    pub later_mapping: Mapping,
}

/// Checks that consecutive copies are strictly increasing.
///
/// # Errors
/// Returns the first adjacent pair that is out of order or equal.
pub fn verify_canonical_order(mappings: &[Mapping]) -> Result<(), OrderViolation> {
    match mappings
        .windows(2)
        .enumerate()
        .find(|(_, pair)| matches!(pair, [a, b] if a >= b))
    {
        Some((index, [earlier, later])) => Err(OrderViolation {
            earlier: index + 1,
            later: index + 2,
            earlier_mapping: earlier.clone(),
            later_mapping: later.clone(),
        }),
        _ => Ok(()),
    }
}
