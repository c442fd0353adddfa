//! Error types for the kextend core library.
//!
//! Every error and verdict enum exposed by the crate carries a stable,
//! machine-readable code generated by [`define_codes!`].

use std::fmt;

use thiserror::Error;

macro_rules! define_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this code.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl std::fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this value."
            )]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

pub(crate) use define_codes;

/// Identifies which of the two graphs in a test case a message refers to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GraphRole {
    /// The pattern graph `G1` whose copies are embedded.
    Pattern,
    /// The target graph `G2` that is extended.
    Target,
}

impl fmt::Display for GraphRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pattern => "G1",
            Self::Target => "G2",
        })
    }
}

/// An error raised when constructing or mutating a [`crate::Graph`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum GraphError {
    /// A row of the adjacency matrix had the wrong number of entries.
    #[error("row {row} has {actual} entries but the graph has {expected} vertices")]
    NotSquare {
        /// Zero-based row index.
        row: usize,
        /// Number of vertices implied by the row count.
        expected: usize,
        /// Number of entries present in the row.
        actual: usize,
    },
    /// A vertex index fell outside the graph.
    #[error("vertex {vertex} is outside a graph with {order} vertices")]
    VertexOutOfRange {
        /// The offending vertex.
        vertex: usize,
        /// Number of vertices in the graph.
        order: usize,
    },
    /// Adding edges would overflow the multiplicity counter.
    #[error("multiplicity of edge ({u}, {v}) would overflow")]
    MultiplicityOverflow {
        /// Tail of the edge.
        u: usize,
        /// Head of the edge.
        v: usize,
    },
}

define_codes! {
    /// Stable codes describing [`GraphError`] variants.
    enum GraphErrorCode for GraphError {
        /// A row of the adjacency matrix had the wrong number of entries.
        NotSquare => NotSquare { .. } => "GRAPH_NOT_SQUARE",
        /// A vertex index fell outside the graph.
        VertexOutOfRange => VertexOutOfRange { .. } => "GRAPH_VERTEX_OUT_OF_RANGE",
        /// Adding edges would overflow the multiplicity counter.
        MultiplicityOverflow => MultiplicityOverflow { .. } => "GRAPH_MULTIPLICITY_OVERFLOW",
    }
}

/// An error raised while reading a solver input file.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum InputFormatError {
    /// The file contained no non-blank lines.
    #[error("input is empty")]
    Empty,
    /// The file ended before a required line.
    #[error("input ended before {what}")]
    Truncated {
        /// Description of the missing element.
        what: String,
    },
    /// A token could not be read as a non-negative integer.
    #[error("line {line}: `{token}` is not a non-negative integer")]
    InvalidInteger {
        /// One-based line number in the input text.
        line: usize,
        /// The offending token.
        token: String,
    },
    /// A vertex count line held more than one value.
    #[error("line {line}: expected a single vertex count")]
    InvalidCount {
        /// One-based line number in the input text.
        line: usize,
    },
    /// A matrix row had the wrong number of entries.
    #[error("line {line}: {graph} row {row} has {actual} entries, expected {expected}")]
    RowLength {
        /// One-based line number in the input text.
        line: usize,
        /// Graph the row belongs to.
        graph: GraphRole,
        /// Zero-based row index.
        row: usize,
        /// Number of vertices of the graph.
        expected: usize,
        /// Number of entries present.
        actual: usize,
    },
    /// The pattern graph declared zero vertices.
    #[error("pattern graph must have at least one vertex")]
    EmptyPattern,
    /// The copy count was zero.
    #[error("copy count must be at least 1")]
    ZeroCopies,
    /// Non-blank content followed the copy count.
    #[error("line {line}: unexpected trailing content")]
    TrailingContent {
        /// One-based line number in the input text.
        line: usize,
    },
    /// The rows read for a graph did not form a valid matrix.
    #[error("invalid {graph} matrix: {error}")]
    Graph {
        /// Graph being read.
        graph: GraphRole,
        #[source]
        /// Underlying construction error.
        error: GraphError,
    },
}

define_codes! {
    /// Stable codes describing [`InputFormatError`] variants.
    enum InputFormatErrorCode for InputFormatError {
        /// The file contained no non-blank lines.
        Empty => Empty => "INPUT_EMPTY",
        /// The file ended before a required line.
        Truncated => Truncated { .. } => "INPUT_TRUNCATED",
        /// A token could not be read as a non-negative integer.
        InvalidInteger => InvalidInteger { .. } => "INPUT_INVALID_INTEGER",
        /// A vertex count line held more than one value.
        InvalidCount => InvalidCount { .. } => "INPUT_INVALID_COUNT",
        /// A matrix row had the wrong number of entries.
        RowLength => RowLength { .. } => "INPUT_ROW_LENGTH",
        /// The pattern graph declared zero vertices.
        EmptyPattern => EmptyPattern => "INPUT_EMPTY_PATTERN",
        /// The copy count was zero.
        ZeroCopies => ZeroCopies => "INPUT_ZERO_COPIES",
        /// Non-blank content followed the copy count.
        TrailingContent => TrailingContent { .. } => "INPUT_TRAILING_CONTENT",
        /// The rows read for a graph did not form a valid matrix.
        InvalidGraph => Graph { .. } => "INPUT_INVALID_GRAPH",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::not_square(
        GraphError::NotSquare { row: 1, expected: 3, actual: 2 },
        GraphErrorCode::NotSquare,
        "GRAPH_NOT_SQUARE",
    )]
    #[case::out_of_range(
        GraphError::VertexOutOfRange { vertex: 4, order: 2 },
        GraphErrorCode::VertexOutOfRange,
        "GRAPH_VERTEX_OUT_OF_RANGE",
    )]
    fn graph_error_codes_are_stable(
        #[case] error: GraphError,
        #[case] code: GraphErrorCode,
        #[case] text: &str,
    ) {
        assert_eq!(error.code(), code);
        assert_eq!(error.code().as_str(), text);
        assert_eq!(code.to_string(), text);
    }

    #[test]
    fn input_errors_render_line_context() {
        let error = InputFormatError::RowLength {
            line: 4,
            graph: GraphRole::Target,
            row: 0,
            expected: 3,
            actual: 2,
        };
        assert_eq!(error.code(), InputFormatErrorCode::RowLength);
        assert_eq!(
            error.to_string(),
            "line 4: G2 row 0 has 2 entries, expected 3"
        );
    }
}
