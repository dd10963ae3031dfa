/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::concurrent_adjacency::{AdjacencyError, ConcurrentAdjacency};

/// An immutable graph giving access to the _predecessors_ and to the
/// outdegree of each node.
///
/// This is the representation needed by a Jacobi-style PageRank iteration,
/// in which the new rank of a node is computed from the ranks of its
/// predecessors. Predecessor lists contain no duplicates and no self-loops,
/// but they are not sorted.
///
/// Graphs are usually built by [parallel ingestion](super::ingest::ingest)
/// or, for small graphs, by [`from_arcs`](Self::from_arcs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InGraph {
    predecessors: Box<[Box<[usize]>]>,
    outdegrees: Box<[usize]>,
    num_arcs: u64,
}

impl InGraph {
    pub(crate) fn new(predecessors: Box<[Box<[usize]>]>, outdegrees: Box<[usize]>) -> Self {
        debug_assert_eq!(predecessors.len(), outdegrees.len());
        let num_arcs = predecessors.iter().map(|p| p.len() as u64).sum();
        debug_assert_eq!(num_arcs, outdegrees.iter().map(|&d| d as u64).sum::<u64>());
        Self {
            predecessors,
            outdegrees,
            num_arcs,
        }
    }

    /// Creates a graph with `num_nodes` nodes from an iterator of arcs,
    /// sequentially.
    ///
    /// Arcs are filtered as in [`ConcurrentAdjacency::insert`].
    ///
    /// # Examples
    ///
    /// ```
    /// use pagerank_rt::graphs::InGraph;
    ///
    /// let g = InGraph::from_arcs(3, [(0, 1), (0, 1), (1, 1), (2, 1), (2, 7)]).unwrap();
    /// assert_eq!(g.num_arcs(), 2);
    /// assert_eq!(g.outdegree(0), 1);
    /// assert_eq!(g.num_dangling(), 1);
    /// ```
    pub fn from_arcs(
        num_nodes: usize,
        arcs: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<Self, AdjacencyError> {
        let adj = ConcurrentAdjacency::new(num_nodes);
        for (src, dst) in arcs {
            adj.insert(src, dst)?;
        }
        Ok(adj.into_graph())
    }

    /// Returns the number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.outdegrees.len()
    }

    /// Returns the number of (distinct, accepted) arcs.
    pub fn num_arcs(&self) -> u64 {
        self.num_arcs
    }

    /// Returns the predecessors of `node`, in no particular order.
    #[inline(always)]
    pub fn predecessors(&self, node: usize) -> &[usize] {
        &self.predecessors[node]
    }

    /// Returns the outdegree of `node`.
    #[inline(always)]
    pub fn outdegree(&self, node: usize) -> usize {
        self.outdegrees[node]
    }

    /// Returns the outdegrees of all nodes.
    pub fn outdegrees(&self) -> &[usize] {
        &self.outdegrees
    }

    /// Returns true if `node` has no successors.
    #[inline(always)]
    pub fn is_dangling(&self, node: usize) -> bool {
        self.outdegrees[node] == 0
    }

    /// Returns the number of dangling nodes.
    pub fn num_dangling(&self) -> usize {
        self.outdegrees.iter().filter(|&&d| d == 0).count()
    }
}
