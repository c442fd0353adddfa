//! Checks that a single mapping embeds the pattern into a host graph.

use thiserror::Error;

use crate::{error::define_codes, graph::Graph, mapping::Mapping};

/// Why a mapping fails to embed the pattern.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum EmbeddingViolation {
    /// The mapping covers a different number of vertices than the pattern.
    #[error("mapping covers {actual} vertices but the pattern has {expected}")]
    SourceCountMismatch {
        /// Pattern order.
        expected: usize,
        /// Vertices covered by the mapping.
        actual: usize,
    },
    /// A pattern vertex has no image.
    #[error("vertex {vertex} is unmapped")]
    Incomplete {
        /// The unassigned pattern vertex.
        vertex: usize,
    },
    /// Two pattern vertices share an image.
    #[error("vertices {first} and {second} both map to {target}")]
    NotInjective {
        /// Earlier pattern vertex.
        first: usize,
        /// Later pattern vertex.
        second: usize,
        /// Shared host vertex.
        target: usize,
    },
    /// A pattern vertex maps outside the host.
    #[error("vertex {vertex} maps to {target}, outside a host with {order} vertices")]
    TargetOutOfRange {
        /// Pattern vertex.
        vertex: usize,
        /// Offending image.
        target: usize,
        /// Host order.
        order: usize,
    },
    /// The host has fewer parallel edges than the pattern demands.
    #[error(
        "E1({u},{v})={required} exceeds E'2({mapped_u},{mapped_v})={available}"
    )]
    MultiplicityShortfall {
        /// Pattern tail.
        u: usize,
        /// Pattern head.
        v: usize,
        /// Image of `u`.
        mapped_u: usize,
        /// Image of `v`.
        mapped_v: usize,
        /// Multiplicity in the pattern.
        required: u32,
        /// Multiplicity in the host.
        available: u32,
    },
}

define_codes! {
    /// Stable codes describing [`EmbeddingViolation`] variants.
    enum EmbeddingViolationCode for EmbeddingViolation {
        /// The mapping covers a different number of vertices than the pattern.
        SourceCountMismatch => SourceCountMismatch { .. } => "EMBEDDING_SOURCE_COUNT",
        /// A pattern vertex has no image.
        Incomplete => Incomplete { .. } => "EMBEDDING_INCOMPLETE",
        /// Two pattern vertices share an image.
        NotInjective => NotInjective { .. } => "EMBEDDING_NOT_INJECTIVE",
        /// A pattern vertex maps outside the host.
        TargetOutOfRange => TargetOutOfRange { .. } => "EMBEDDING_TARGET_OUT_OF_RANGE",
        /// The host has fewer parallel edges than the pattern demands.
        MultiplicityShortfall => MultiplicityShortfall { .. } => "EMBEDDING_MULTIPLICITY_SHORTFALL",
    }
}

/// Verifies that `mapping` embeds `pattern` into `host`.
///
/// Checks run in order: completeness, injectivity, range, then the
/// multiplicity inequality `E1(u,v) <= E'2(f(u), f(v))` for every ordered
/// pair including self-loops. The first failing check is reported.
///
/// # Errors
/// Returns the first [`EmbeddingViolation`] found.
///
/// # Examples
/// ```
/// use kextend_core::{verify_embedding, Graph, Mapping};
///
/// let edge = Graph::from_rows(vec![vec![0, 1], vec![0, 0]])?;
/// let host = Graph::from_rows(vec![vec![0, 0, 0], vec![0, 0, 1], vec![0, 0, 0]])?;
/// assert!(verify_embedding(&edge, &host, &Mapping::from_targets([1, 2])).is_ok());
/// assert!(verify_embedding(&edge, &host, &Mapping::from_targets([2, 1])).is_err());
/// # Ok::<(), kextend_core::GraphError>(())
/// ```
pub fn verify_embedding(
    pattern: &Graph,
    host: &Graph,
    mapping: &Mapping,
) -> Result<(), EmbeddingViolation> {
    let order = pattern.order();
    if mapping.sources() != order {
        return Err(EmbeddingViolation::SourceCountMismatch {
            expected: order,
            actual: mapping.sources(),
        });
    }

    let mut images = Vec::with_capacity(order);
    for vertex in 0..order {
        let target = mapping
            .get(vertex)
            .ok_or(EmbeddingViolation::Incomplete { vertex })?;
        images.push(target);
    }

    if let Some((first, second, target)) = mapping.first_collision() {
        return Err(EmbeddingViolation::NotInjective {
            first,
            second,
            target,
        });
    }

    if let Some((vertex, &target)) = images
        .iter()
        .enumerate()
        .find(|(_, target)| **target >= host.order())
    {
        return Err(EmbeddingViolation::TargetOutOfRange {
            vertex,
            target,
            order: host.order(),
        });
    }

    for (u, &mapped_u) in images.iter().enumerate() {
        for (v, &mapped_v) in images.iter().enumerate() {
            let required = pattern.edge_count(u, v);
            let available = host.edge_count(mapped_u, mapped_v);
            if required > available {
                return Err(EmbeddingViolation::MultiplicityShortfall {
                    u,
                    v,
                    mapped_u,
                    mapped_v,
                    required,
                    available,
                });
            }
        }
    }
    Ok(())
}
