/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/// Granularity of the per-node tasks submitted to a
/// [`TaskPool`](crate::thread_pool::TaskPool), specified by nodes or arcs.
///
/// The map phase of [`PageRank`](crate::rank::PageRank) submits one task per
/// block of consecutive nodes. The natural unit is a number of nodes, but
/// since the cost of a node is proportional to its indegree it is sometimes
/// more convenient to specify the amount of work in arcs: the conversion is
/// done by [`node_granularity`](Self::node_granularity) using the average
/// degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Each task is formed by the specified number of nodes.
    Nodes(usize),
    /// Each task is formed by a number of nodes that has, tentatively, sum of
    /// indegrees equal to the specified number of arcs.
    Arcs(u64),
}

impl core::default::Default for Granularity {
    /// Returns a granularity of one node per task.
    fn default() -> Self {
        Self::Nodes(1)
    }
}

impl Granularity {
    /// Returns a node granularity for a graph with the given number of nodes
    /// and arcs.
    ///
    /// The result is always at least one.
    pub fn node_granularity(&self, num_nodes: usize, num_arcs: u64) -> usize {
        match *self {
            Self::Nodes(n) => n.max(1),
            Self::Arcs(n) => {
                let average_degree = num_arcs as f64 / num_nodes.max(1) as f64;
                if average_degree == 0.0 {
                    return num_nodes.max(1);
                }
                (n as f64 / average_degree)
                    .ceil()
                    .clamp(1.0, usize::MAX as f64) as usize
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_granularity() {
        assert_eq!(Granularity::default().node_granularity(100, 1000), 1);
        assert_eq!(Granularity::Nodes(0).node_granularity(100, 1000), 1);
        assert_eq!(Granularity::Nodes(7).node_granularity(100, 1000), 7);
        // average degree 10
        assert_eq!(Granularity::Arcs(100).node_granularity(100, 1000), 10);
        assert_eq!(Granularity::Arcs(1).node_granularity(100, 1000), 1);
        // no arcs: a single task
        assert_eq!(Granularity::Arcs(100).node_granularity(100, 0), 100);
    }
}
