//! Partial vertex assignments from the pattern into the target.

use std::{
    collections::{BTreeSet, HashMap},
    fmt,
};

/// Assignment of pattern vertices `0..n1` to target vertices.
///
/// A mapping may be partial while a solver report is being decoded;
/// verification rejects incomplete mappings. Ordering compares assignment
/// tuples lexicographically.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Mapping {
    targets: Vec<Option<usize>>,
}

impl Mapping {
    /// Creates a mapping for `sources` pattern vertices with nothing assigned.
    #[must_use]
    pub fn unassigned(sources: usize) -> Self {
        Self {
            targets: vec![None; sources],
        }
    }

    /// Creates a complete mapping where pattern vertex `i` maps to
    /// `targets[i]`.
    ///
    /// # Examples
    /// ```
    /// use kextend_core::Mapping;
    ///
    /// let mapping = Mapping::from_targets([2, 0]);
    /// assert_eq!(mapping.get(0), Some(2));
    /// assert!(mapping.is_complete());
    /// ```
    #[must_use]
    pub fn from_targets(targets: impl IntoIterator<Item = usize>) -> Self {
        Self {
            targets: targets.into_iter().map(Some).collect(),
        }
    }

    /// Number of pattern vertices this mapping covers.
    #[must_use]
    pub fn sources(&self) -> usize {
        self.targets.len()
    }

    /// Assigns `source` to `target`, replacing any earlier assignment.
    ///
    /// Returns `false` and leaves the mapping untouched when `source` is not
    /// a pattern vertex.
    pub fn set(&mut self, source: usize, target: usize) -> bool {
        match self.targets.get_mut(source) {
            Some(slot) => {
                *slot = Some(target);
                true
            }
            None => false,
        }
    }

    /// Target assigned to `source`, if any.
    #[must_use]
    pub fn get(&self, source: usize) -> Option<usize> {
        self.targets.get(source).copied().flatten()
    }

    /// Whether every pattern vertex is assigned.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.targets.iter().all(Option::is_some)
    }

    /// Whether no two assigned vertices share a target.
    #[must_use]
    pub fn is_injection(&self) -> bool {
        self.first_collision().is_none()
    }

    /// First pair of sources, in index order, that share a target, together
    /// with that target.
    #[must_use]
    pub fn first_collision(&self) -> Option<(usize, usize, usize)> {
        let mut seen: HashMap<usize, usize> = HashMap::with_capacity(self.targets.len());
        for (source, target) in self.assignments() {
            if let Some(&first) = seen.get(&target) {
                return Some((first, source, target));
            }
            seen.insert(target, source);
        }
        None
    }

    /// Set of target vertices used by the mapping.
    #[must_use]
    pub fn image(&self) -> BTreeSet<usize> {
        self.targets.iter().flatten().copied().collect()
    }

    /// Iterates over assigned `(source, target)` pairs in source order.
    pub fn assignments(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.targets
            .iter()
            .enumerate()
            .filter_map(|(source, target)| target.map(|t| (source, t)))
    }
}

impl fmt::Display for Mapping {
    /// Writes the mapping as `0->a, 1->b`, the form solvers print.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (source, target) in self.assignments() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{source}->{target}")?;
            first = false;
        }
        Ok(())
    }
}
