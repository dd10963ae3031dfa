/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Summary of a PageRank computation.

use super::pagerank::{PageRankResult, Termination};
use crate::graphs::InGraph;
use dary_heap::QuaternaryHeap;
use kahan::KahanSum;
use std::cmp::{Ordering, Reverse};
use std::fmt::{Display, Formatter};

/// A node with its rank, ordered by rank and then by decreasing index, so
/// that the greatest entry is the highest-ranked node with the lowest index.
#[derive(Debug, Clone, Copy)]
struct Ranked {
    node: usize,
    rank: f64,
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .total_cmp(&other.rank)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Returns the `k` nodes with the highest rank, with their rank, in
/// decreasing order of rank.
///
/// Ties are broken by increasing node index. If `k` is larger than the
/// number of nodes, all nodes are returned.
///
/// # Examples
///
/// ```
/// use pagerank_rt::rank::report::top_k;
///
/// let rank = [0.1, 0.3, 0.2, 0.3, 0.1];
/// assert_eq!(top_k(&rank, 3), vec![(1, 0.3), (3, 0.3), (2, 0.2)]);
/// ```
pub fn top_k(rank: &[f64], k: usize) -> Vec<(usize, f64)> {
    if k == 0 {
        return vec![];
    }
    // A min-heap of the best k entries seen so far
    let mut heap = QuaternaryHeap::with_capacity(k.min(rank.len()) + 1);
    for (node, &rank) in rank.iter().enumerate() {
        heap.push(Reverse(Ranked { node, rank }));
        if heap.len() > k {
            heap.pop();
        }
    }
    // Ascending order of Reverse is descending order of Ranked
    heap.into_sorted_vec()
        .into_iter()
        .map(|Reverse(r)| (r.node, r.rank))
        .collect()
}

/// The statistics printed at the end of a PageRank computation.
///
/// The [`Display`] implementation prints the number of nodes, dangling nodes
/// and (valid) arcs, the termination state, the sum of ranks, and the `k`
/// highest-ranked nodes; the last table is omitted if `k` is larger than the
/// number of nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct RankReport {
    pub num_nodes: usize,
    pub num_dangling: usize,
    pub num_arcs: u64,
    pub iterations: usize,
    pub termination: Termination,
    pub rank_sum: f64,
    pub top: Option<Vec<(usize, f64)>>,
}

impl RankReport {
    /// Builds the report of `result`, computed on `graph`, listing the `k`
    /// highest-ranked nodes.
    pub fn new(graph: &InGraph, result: &PageRankResult, k: usize) -> Self {
        let mut rank_sum = KahanSum::<f64>::new();
        for &x in result.rank.iter() {
            rank_sum += x;
        }
        Self {
            num_nodes: graph.num_nodes(),
            num_dangling: graph.num_dangling(),
            num_arcs: graph.num_arcs(),
            iterations: result.iterations,
            termination: result.termination,
            rank_sum: rank_sum.sum(),
            top: (k <= graph.num_nodes()).then(|| top_k(&result.rank, k)),
        }
    }
}

impl Display for RankReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Number of nodes: {}", self.num_nodes)?;
        writeln!(f, "Number of dead-end nodes: {}", self.num_dangling)?;
        writeln!(f, "Number of valid arcs: {}", self.num_arcs)?;
        match self.termination {
            Termination::Converged => {
                writeln!(f, "Converged after {} iterations", self.iterations)?
            }
            Termination::Exhausted => {
                writeln!(f, "Did not converge after {} iterations", self.iterations)?
            }
        }
        writeln!(f, "Sum of ranks: {:.4}   (should be 1)", self.rank_sum)?;
        if let Some(top) = &self.top {
            writeln!(f, "Top {} nodes:", top.len())?;
            for (node, rank) in top {
                writeln!(f, "  {} {:.6}", node, rank)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_k_ties() {
        let rank = [0.25; 4];
        assert_eq!(top_k(&rank, 2), vec![(0, 0.25), (1, 0.25)]);
        assert_eq!(top_k(&rank, 0), vec![]);
        assert_eq!(top_k(&rank, 10).len(), 4);
    }

    #[test]
    fn test_top_k_large() {
        let rank = (0..1000)
            .map(|i| ((i * 37) % 1000) as f64)
            .collect::<Vec<_>>();
        let top = top_k(&rank, 5);
        assert_eq!(
            top.iter().map(|&(_, r)| r).collect::<Vec<_>>(),
            vec![999.0, 998.0, 997.0, 996.0, 995.0]
        );
        for (node, r) in top {
            assert_eq!(rank[node], r);
        }
    }

    #[test]
    fn test_display() {
        // 0 → 1, 1 → 0, 2 → 0
        let graph = InGraph::from_arcs(3, [(0, 1), (1, 0), (2, 0), (2, 0)]).unwrap();
        let result = PageRankResult {
            rank: vec![0.5, 0.4, 0.1].into_boxed_slice(),
            iterations: 7,
            l1_error: 1E-8,
            termination: Termination::Converged,
        };
        let report = RankReport::new(&graph, &result, 2);
        assert_eq!(
            report.to_string(),
            "Number of nodes: 3\n\
             Number of dead-end nodes: 0\n\
             Number of valid arcs: 3\n\
             Converged after 7 iterations\n\
             Sum of ranks: 1.0000   (should be 1)\n\
             Top 2 nodes:\n  \
             0 0.500000\n  \
             1 0.400000\n"
        );

        let report = RankReport::new(&graph, &result, 4);
        assert!(report.top.is_none());
        assert!(report.to_string().ends_with("(should be 1)\n"));
    }

    #[test]
    fn test_exhausted() {
        let graph = InGraph::from_arcs(1, []).unwrap();
        let result = PageRankResult {
            rank: vec![1.0].into_boxed_slice(),
            iterations: 100,
            l1_error: 1.0,
            termination: Termination::Exhausted,
        };
        let report = RankReport::new(&graph, &result, 1).to_string();
        assert!(report.contains("Did not converge after 100 iterations\n"));
        assert!(report.contains("Number of dead-end nodes: 1\n"));
    }
}
