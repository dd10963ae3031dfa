/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

pub mod concurrent_adjacency;
pub use concurrent_adjacency::{AdjacencyError, ConcurrentAdjacency};

mod in_graph;
pub use in_graph::InGraph;

pub mod ingest;
pub use ingest::{
    ingest, try_ingest, try_ingest_with_logging, IngestError, IngestOptions, DEFAULT_QUEUE_CAPACITY,
};
