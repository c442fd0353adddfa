//! Test cases and the plain-text solver input format.
//!
//! The input format is line based: `n1`, `n1` rows of the pattern matrix,
//! `n2`, `n2` rows of the target matrix and an optional copy count `k`
//! that defaults to one. Blank lines are ignored.

use std::{
    io::{self, Write},
    iter::Peekable,
    num::NonZeroUsize,
};

use crate::{
    error::{GraphRole, InputFormatError},
    graph::Graph,
};

/// The sizes a solver report is decoded against.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Dimensions {
    /// Vertices in the pattern graph.
    pub pattern_order: usize,
    /// Vertices in the target graph.
    pub target_order: usize,
    /// Requested number of distinct copies.
    pub copies: usize,
}

/// One instance handed to a solver: find `copies` distinct embeddings of
/// `pattern` into a minimal extension of `target`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestCase {
    pattern: Graph,
    target: Graph,
    copies: NonZeroUsize,
}

impl TestCase {
    /// Creates a test case.
    ///
    /// # Errors
    /// Returns [`InputFormatError::EmptyPattern`] for a pattern without
    /// vertices and [`InputFormatError::ZeroCopies`] when `copies` is zero.
    pub fn new(pattern: Graph, target: Graph, copies: usize) -> Result<Self, InputFormatError> {
        if pattern.order() == 0 {
            return Err(InputFormatError::EmptyPattern);
        }
        let copies = NonZeroUsize::new(copies).ok_or(InputFormatError::ZeroCopies)?;
        Ok(Self {
            pattern,
            target,
            copies,
        })
    }

    /// Parses the solver input format.
    ///
    /// # Errors
    /// Returns an [`InputFormatError`] describing the first problem found.
    ///
    /// # Examples
    /// ```
    /// use kextend_core::TestCase;
    ///
    /// let case = TestCase::parse("2\n0 1\n0 0\n3\n0 0 0\n0 0 0\n0 0 0\n2\n")?;
    /// assert_eq!(case.copies(), 2);
    /// assert_eq!(case.max_distinct_images(), 3);
    /// # Ok::<(), kextend_core::InputFormatError>(())
    /// ```
    pub fn parse(text: &str) -> Result<Self, InputFormatError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .peekable();
        if lines.peek().is_none() {
            return Err(InputFormatError::Empty);
        }

        let pattern = read_graph(&mut lines, GraphRole::Pattern)?;
        let target = read_graph(&mut lines, GraphRole::Target)?;
        let copies = match lines.next() {
            Some((line, content)) => read_single(line, content)?,
            None => 1,
        };
        if let Some((line, _)) = lines.next() {
            return Err(InputFormatError::TrailingContent { line });
        }
        Self::new(pattern, target, copies)
    }

    /// The pattern graph `G1`.
    #[must_use]
    pub fn pattern(&self) -> &Graph {
        &self.pattern
    }

    /// The target graph `G2`.
    #[must_use]
    pub fn target(&self) -> &Graph {
        &self.target
    }

    /// Requested number of distinct copies `k`.
    #[must_use]
    pub fn copies(&self) -> usize {
        self.copies.get()
    }

    /// Sizes used to decode solver reports for this case.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            pattern_order: self.pattern.order(),
            target_order: self.target.order(),
            copies: self.copies(),
        }
    }

    /// Number of distinct vertex images available, `C(n2, n1)`.
    #[must_use]
    pub fn max_distinct_images(&self) -> u128 {
        binomial(self.target.order(), self.pattern.order())
    }

    /// Whether the target is smaller than the pattern.
    #[must_use]
    pub fn target_too_small(&self) -> bool {
        self.target.order() < self.pattern.order()
    }

    /// Whether no valid answer exists: the target is too small or more
    /// copies are requested than distinct images exist.
    #[must_use]
    pub fn is_impossible(&self) -> bool {
        self.target_too_small() || (self.copies() as u128) > self.max_distinct_images()
    }

    /// Writes the case in the solver input format.
    ///
    /// # Errors
    /// Propagates failures from `writer`.
    pub fn write_input(&self, mut writer: impl Write) -> io::Result<()> {
        write!(writer, "{}{}{}", self.pattern, self.target, self.copies)?;
        writeln!(writer)
    }

    /// Renders the case in the solver input format.
    #[must_use]
    pub fn to_input_string(&self) -> String {
        format!("{}{}{}\n", self.pattern, self.target, self.copies)
    }
}

/// Binomial coefficient `C(n, r)`, saturating at [`u128::MAX`].
///
/// # Examples
/// ```
/// use kextend_core::binomial;
///
/// assert_eq!(binomial(5, 2), 10);
/// assert_eq!(binomial(2, 5), 0);
/// ```
#[must_use]
pub fn binomial(n: usize, r: usize) -> u128 {
    if r > n {
        return 0;
    }
    let r = r.min(n - r);
    let mut result: u128 = 1;
    for i in 0..r {
        // result * (n - i) is divisible by (i + 1) at every step.
        let Some(product) = result.checked_mul((n - i) as u128) else {
            return u128::MAX;
        };
        result = product / (i as u128 + 1);
    }
    result
}

fn read_graph<'a, I>(lines: &mut Peekable<I>, role: GraphRole) -> Result<Graph, InputFormatError>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let (line, content) = lines.next().ok_or_else(|| InputFormatError::Truncated {
        what: format!("the {role} vertex count"),
    })?;
    let order = read_single(line, content)?;
    let mut rows = Vec::with_capacity(order);
    for row in 0..order {
        let (line, content) = lines.next().ok_or_else(|| InputFormatError::Truncated {
            what: format!("{role} row {row}"),
        })?;
        let entries = content
            .split_whitespace()
            .map(|token| parse_token::<u32>(line, token))
            .collect::<Result<Vec<_>, _>>()?;
        if entries.len() != order {
            return Err(InputFormatError::RowLength {
                line,
                graph: role,
                row,
                expected: order,
                actual: entries.len(),
            });
        }
        rows.push(entries);
    }
    Graph::from_rows(rows).map_err(|error| InputFormatError::Graph { graph: role, error })
}

fn read_single(line: usize, content: &str) -> Result<usize, InputFormatError> {
    let mut tokens = content.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(token), None) => parse_token(line, token),
        _ => Err(InputFormatError::InvalidCount { line }),
    }
}

fn parse_token<T: std::str::FromStr>(line: usize, token: &str) -> Result<T, InputFormatError> {
    token.parse().map_err(|_| InputFormatError::InvalidInteger {
        line,
        token: token.to_owned(),
    })
}
