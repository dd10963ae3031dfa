/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! An adjacency structure supporting concurrent arc insertion.
//!
//! For each node we keep the deduplicated list of its predecessors, protected
//! by its own lock, so insertions with different destinations never contend.
//! Outdegrees are kept in a single array protected by a global lock: the
//! critical section is a single increment, so contention is limited.
//!
//! An arc is counted in the outdegree of its source only on the path that
//! actually adds the source to the predecessor list of the destination, so
//! duplicated arcs are counted once even if they are inserted concurrently.

use super::in_graph::InGraph;
use std::collections::TryReserveError;
use std::sync::Mutex;
use thiserror::Error;

/// Initial number of slots of a predecessor list.
const INITIAL_CAPACITY: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdjacencyError {
    /// Either the allocator failed (`source` is set) or the slot limit of
    /// the store was reached.
    #[error("Could not grow the predecessor list of node {node} to {requested} slots")]
    OutOfMemory {
        node: usize,
        requested: usize,
        source: Option<TryReserveError>,
    },
}

/// A mutable adjacency store that can be shared among threads.
///
/// Arcs are added with [`insert`](Self::insert); once all insertions are
/// done, [`into_graph`](Self::into_graph) freezes the store into an
/// immutable [`InGraph`].
#[derive(Debug)]
pub struct ConcurrentAdjacency {
    incoming: Box<[Mutex<Vec<usize>>]>,
    outdegrees: Mutex<Box<[usize]>>,
    max_slots: usize,
}

impl ConcurrentAdjacency {
    /// Creates an empty store with `num_nodes` nodes.
    pub fn new(num_nodes: usize) -> Self {
        Self::with_max_slots(num_nodes, usize::MAX)
    }

    /// Creates an empty store with `num_nodes` nodes whose predecessor lists
    /// cannot grow beyond `max_slots` slots.
    ///
    /// Reaching the limit is reported by [`insert`](Self::insert) exactly as
    /// an allocation failure.
    pub fn with_max_slots(num_nodes: usize, max_slots: usize) -> Self {
        Self {
            incoming: (0..num_nodes).map(|_| Mutex::new(Vec::new())).collect(),
            outdegrees: Mutex::new(vec![0; num_nodes].into_boxed_slice()),
            max_slots,
        }
    }

    /// Returns the number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.incoming.len()
    }

    /// Adds the arc `source` → `destination`.
    ///
    /// Returns `Ok(true)` if the arc was new. Self-loops, arcs with an
    /// endpoint out of range, and arcs already present are ignored, and
    /// `Ok(false)` is returned.
    ///
    /// If the predecessor list of `destination` cannot be grown, an error is
    /// returned and the store is left unchanged.
    pub fn insert(&self, source: usize, destination: usize) -> Result<bool, AdjacencyError> {
        let n = self.num_nodes();
        if source == destination || source >= n || destination >= n {
            return Ok(false);
        }

        {
            let mut preds = self.incoming[destination].lock().unwrap();
            if preds.contains(&source) {
                return Ok(false);
            }
            if preds.len() >= self.max_slots {
                return Err(AdjacencyError::OutOfMemory {
                    node: destination,
                    requested: preds.len() + 1,
                    source: None,
                });
            }
            if preds.len() == preds.capacity() {
                // Double, but never beyond the slot limit (which exceeds len)
                let doubled = preds.len() + preds.capacity().max(INITIAL_CAPACITY);
                let requested = doubled.min(self.max_slots);
                let additional = requested - preds.len();
                preds
                    .try_reserve_exact(additional)
                    .map_err(|source| AdjacencyError::OutOfMemory {
                        node: destination,
                        requested,
                        source: Some(source),
                    })?;
            }
            preds.push(source);
        }

        self.outdegrees.lock().unwrap()[source] += 1;
        Ok(true)
    }

    /// Returns the current outdegree of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn outdegree(&self, node: usize) -> usize {
        self.outdegrees.lock().unwrap()[node]
    }

    /// Returns a copy of the current predecessor list of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn predecessors(&self, node: usize) -> Vec<usize> {
        self.incoming[node].lock().unwrap().clone()
    }

    /// Freezes the store into an immutable graph.
    pub fn into_graph(self) -> InGraph {
        let predecessors = self
            .incoming
            .into_vec()
            .into_iter()
            .map(|preds| preds.into_inner().unwrap().into_boxed_slice())
            .collect::<Box<[_]>>();
        let outdegrees = self.outdegrees.into_inner().unwrap();
        InGraph::new(predecessors, outdegrees)
    }
}
