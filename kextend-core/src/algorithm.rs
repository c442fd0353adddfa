//! Solver algorithm selection.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Which solver algorithm a run exercises.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Algorithm {
    /// Exhaustive search that should find the minimum extension.
    Exact,
    /// Heuristic search.
    Approximate,
}

impl Algorithm {
    /// Both algorithms, exact first.
    #[must_use]
    pub const fn all() -> [Self; 2] {
        [Self::Exact, Self::Approximate]
    }

    /// Stable lowercase name, also the positional solver argument.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Approximate => "approx",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An algorithm name that is neither `exact` nor `approx`.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("unknown algorithm `{0}`; expected `exact` or `approx`")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "approx" | "approximate" => Ok(Self::Approximate),
            _ => Err(UnknownAlgorithm(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("exact", Algorithm::Exact)]
    #[case("APPROX", Algorithm::Approximate)]
    #[case(" approximate ", Algorithm::Approximate)]
    fn parses_known_names(#[case] text: &str, #[case] expected: Algorithm) {
        assert_eq!(text.parse::<Algorithm>(), Ok(expected));
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "greedy".parse::<Algorithm>().expect_err("unknown name");
        assert_eq!(err, UnknownAlgorithm("greedy".into()));
    }
}
