//! Directed multigraphs stored as dense adjacency matrices.

use std::fmt;

use crate::error::GraphError;

/// A directed multigraph whose entry `(u, v)` counts the parallel edges from
/// `u` to `v`. Self-loops live on the diagonal.
///
/// Multiplicities are stored row-major in a single buffer so rows can be
/// borrowed as slices.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Graph {
    order: usize,
    multiplicities: Vec<u32>,
}

impl Graph {
    /// Creates a graph with `order` vertices and no edges.
    ///
    /// # Examples
    /// ```
    /// use kextend_core::Graph;
    ///
    /// let graph = Graph::empty(3);
    /// assert_eq!(graph.order(), 3);
    /// assert_eq!(graph.size(), 0);
    /// ```
    #[must_use]
    pub fn empty(order: usize) -> Self {
        Self {
            order,
            multiplicities: vec![0; order.saturating_mul(order)],
        }
    }

    /// Builds a graph whose multiplicity for `(u, v)` is `entry(u, v)`.
    ///
    /// # Examples
    /// ```
    /// use kextend_core::Graph;
    ///
    /// let clique = Graph::from_fn(3, |u, v| u32::from(u != v));
    /// assert_eq!(clique.size(), 6);
    /// ```
    #[must_use]
    pub fn from_fn(order: usize, mut entry: impl FnMut(usize, usize) -> u32) -> Self {
        let mut multiplicities = Vec::with_capacity(order.saturating_mul(order));
        for u in 0..order {
            for v in 0..order {
                multiplicities.push(entry(u, v));
            }
        }
        Self {
            order,
            multiplicities,
        }
    }

    /// Builds a graph from adjacency rows.
    ///
    /// # Errors
    /// Returns [`GraphError::NotSquare`] when any row length differs from the
    /// number of rows.
    ///
    /// # Examples
    /// ```
    /// use kextend_core::Graph;
    ///
    /// let graph = Graph::from_rows(vec![vec![0, 2], vec![1, 0]])?;
    /// assert_eq!(graph.edge_count(0, 1), 2);
    /// # Ok::<(), kextend_core::GraphError>(())
    /// ```
    pub fn from_rows<R>(rows: impl IntoIterator<Item = R>) -> Result<Self, GraphError>
    where
        R: AsRef<[u32]>,
    {
        let rows: Vec<R> = rows.into_iter().collect();
        let order = rows.len();
        let mut multiplicities = Vec::with_capacity(order.saturating_mul(order));
        for (row, entries) in rows.iter().enumerate() {
            let entries = entries.as_ref();
            if entries.len() != order {
                return Err(GraphError::NotSquare {
                    row,
                    expected: order,
                    actual: entries.len(),
                });
            }
            multiplicities.extend_from_slice(entries);
        }
        Ok(Self {
            order,
            multiplicities,
        })
    }

    /// Number of vertices.
    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Returns the number of parallel edges from `u` to `v`, or zero when
    /// either endpoint lies outside the graph.
    #[must_use]
    pub fn edge_count(&self, u: usize, v: usize) -> u32 {
        self.index(u, v)
            .and_then(|index| self.multiplicities.get(index).copied())
            .unwrap_or(0)
    }

    /// Total number of edges counted with multiplicity.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.multiplicities.iter().map(|&m| u64::from(m)).sum()
    }

    /// In-degree plus out-degree of `v`. A self-loop contributes to both.
    #[must_use]
    pub fn degree(&self, v: usize) -> u64 {
        (0..self.order)
            .map(|w| u64::from(self.edge_count(v, w)) + u64::from(self.edge_count(w, v)))
            .sum()
    }

    /// Iterates over the adjacency rows.
    pub fn rows(&self) -> impl Iterator<Item = &[u32]> + '_ {
        self.multiplicities.chunks(self.order.max(1))
    }

    /// Adds `additional` parallel edges from `u` to `v`.
    ///
    /// Multiplicities never decrease, so repeated extensions only grow the
    /// graph.
    ///
    /// # Errors
    /// Returns [`GraphError::VertexOutOfRange`] for an endpoint outside the
    /// graph and [`GraphError::MultiplicityOverflow`] when the counter would
    /// overflow.
    pub fn extend_edge(&mut self, u: usize, v: usize, additional: u32) -> Result<(), GraphError> {
        for vertex in [u, v] {
            if vertex >= self.order {
                return Err(GraphError::VertexOutOfRange {
                    vertex,
                    order: self.order,
                });
            }
        }
        let slot = self
            .index(u, v)
            .and_then(|index| self.multiplicities.get_mut(index))
            .ok_or(GraphError::VertexOutOfRange {
                vertex: u,
                order: self.order,
            })?;
        *slot = slot
            .checked_add(additional)
            .ok_or(GraphError::MultiplicityOverflow { u, v })?;
        Ok(())
    }

    /// Raises the multiplicity of `(u, v)` to at least `minimum`.
    ///
    /// # Errors
    /// Returns [`GraphError::VertexOutOfRange`] for an endpoint outside the
    /// graph.
    pub fn raise_edge(&mut self, u: usize, v: usize, minimum: u32) -> Result<(), GraphError> {
        let current = self.edge_count(u, v);
        self.extend_edge(u, v, minimum.saturating_sub(current))
    }

    fn index(&self, u: usize, v: usize) -> Option<usize> {
        if u >= self.order || v >= self.order {
            return None;
        }
        u.checked_mul(self.order)?.checked_add(v)
    }
}

impl fmt::Display for Graph {
    /// Writes the graph as `n` followed by `n` whitespace-separated rows.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.order)?;
        if self.order == 0 {
            return Ok(());
        }
        for row in self.rows() {
            let mut first = true;
            for entry in row {
                if !first {
                    f.write_str(" ")?;
                }
                write!(f, "{entry}")?;
                first = false;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
