/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Parallel construction of an [`InGraph`] from a stream of arcs.
//!
//! The calling thread acts as the producer: it pushes the arcs of the stream
//! into a [bounded queue](crate::utils::bounded_queue), from which a number
//! of worker threads pop them and [insert](ConcurrentAdjacency::insert) them
//! into a shared [`ConcurrentAdjacency`]. When the stream is exhausted the
//! queue is closed, and the workers exit after draining it. The store is
//! frozen into a graph only after all workers have been joined, as joining
//! (not an empty queue) is what guarantees that every popped arc has been
//! inserted.

use super::concurrent_adjacency::{AdjacencyError, ConcurrentAdjacency};
use super::in_graph::InGraph;
use crate::utils::bounded_queue::{self, QueueError};
use dsi_progress_logger::{no_logging, ConcurrentProgressLog};
use std::convert::Infallible;
use thiserror::Error;

/// Default capacity of the ingestion queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 2048;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("The number of ingestion threads must be positive")]
    NoThreads,
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error("Could not spawn an ingestion thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error(transparent)]
    Adjacency(#[from] AdjacencyError),
    #[error("Could not read the arcs: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Options for [`ingest`] and [`try_ingest`].
#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    /// The number of worker threads popping arcs from the queue.
    pub num_threads: usize,
    /// The capacity of the queue between the producer and the workers.
    pub queue_capacity: usize,
    /// The maximum number of predecessors of a node; exceeding it fails the
    /// ingestion with [`AdjacencyError::OutOfMemory`].
    pub max_slots: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_slots: usize::MAX,
        }
    }
}

/// Builds in parallel a graph with `num_nodes` nodes from an iterator of arcs.
///
/// Self-loops, duplicate arcs, and arcs with an endpoint out of range are
/// discarded.
///
/// # Examples
///
/// ```
/// use pagerank_rt::graphs::{ingest, IngestOptions};
///
/// let arcs = (1..100).map(|i| (i, 0));
/// let options = IngestOptions { num_threads: 4, ..Default::default() };
/// let g = ingest(100, arcs, &options).unwrap();
/// assert_eq!(g.num_arcs(), 99);
/// assert_eq!(g.predecessors(0).len(), 99);
/// ```
pub fn ingest(
    num_nodes: usize,
    arcs: impl IntoIterator<Item = (usize, usize)>,
    options: &IngestOptions,
) -> Result<InGraph, IngestError> {
    try_ingest_with_logging(
        num_nodes,
        arcs.into_iter().map(Ok::<_, Infallible>),
        options,
        no_logging![],
    )
}

/// Builds in parallel a graph from a fallible iterator of arcs.
///
/// The first error returned by the iterator stops the production of arcs and
/// is returned (wrapped in [`IngestError::Source`]) after all workers have
/// been joined. A worker failing to insert an arc exits; once all workers
/// have exited, production stops and the first insertion error is returned.
pub fn try_ingest<E>(
    num_nodes: usize,
    arcs: impl IntoIterator<Item = Result<(usize, usize), E>>,
    options: &IngestOptions,
) -> Result<InGraph, IngestError>
where
    E: std::error::Error + Send + Sync + 'static,
{
    try_ingest_with_logging(num_nodes, arcs, options, no_logging![])
}

/// Like [`try_ingest`], but logs the number of popped arcs using the provided
/// [`ConcurrentProgressLog`].
///
/// Each worker thread updates its own clone of `pl`.
pub fn try_ingest_with_logging<E>(
    num_nodes: usize,
    arcs: impl IntoIterator<Item = Result<(usize, usize), E>>,
    options: &IngestOptions,
    pl: &mut impl ConcurrentProgressLog,
) -> Result<InGraph, IngestError>
where
    E: std::error::Error + Send + Sync + 'static,
{
    if options.num_threads == 0 {
        return Err(IngestError::NoThreads);
    }
    let adj = ConcurrentAdjacency::with_max_slots(num_nodes, options.max_slots);
    let (producer, consumer) = bounded_queue::bounded::<(usize, usize)>(options.queue_capacity)?;

    log::info!(
        "Ingesting arcs for {} nodes using {} threads (queue capacity: {})",
        num_nodes,
        options.num_threads,
        options.queue_capacity
    );

    pl.item_name("arc");
    pl.expected_updates(None);
    pl.start("Ingesting arcs...");

    let (pushed, inserted) = std::thread::scope(|scope| -> Result<(u64, u64), IngestError> {
        let mut workers = Vec::with_capacity(options.num_threads);
        for thread_id in 0..options.num_threads {
            let consumer = consumer.clone();
            let adj = &adj;
            let mut local_pl = pl.clone();
            let worker = std::thread::Builder::new()
                .name(format!("ingest-{thread_id}"))
                .spawn_scoped(scope, move || -> Result<u64, AdjacencyError> {
                    let mut inserted = 0;
                    while let Some((src, dst)) = consumer.pop() {
                        if adj.insert(src, dst)? {
                            inserted += 1;
                        }
                        local_pl.light_update();
                    }
                    Ok(inserted)
                })
                // Returning drops the producer, so already spawned workers exit
                .map_err(IngestError::Spawn)?;
            workers.push(worker);
        }
        // If all workers fail, pushing will fail as well
        drop(consumer);

        let mut source_error = None;
        let mut pushed = 0;
        for arc in arcs {
            match arc {
                Ok(arc) => {
                    if producer.push(arc).is_err() {
                        log::debug!("All ingestion workers exited: stopping");
                        break;
                    }
                    pushed += 1;
                }
                Err(err) => {
                    source_error = Some(err);
                    break;
                }
            }
        }
        producer.close();

        let mut first_error = None;
        let mut inserted = 0;
        for worker in workers {
            match worker.join() {
                Ok(Ok(count)) => inserted += count,
                Ok(Err(err)) => {
                    first_error.get_or_insert(err);
                }
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }

        if let Some(err) = source_error {
            return Err(IngestError::Source(Box::new(err)));
        }
        if let Some(err) = first_error {
            return Err(err.into());
        }
        Ok((pushed, inserted))
    })?;

    pl.done();
    log::info!(
        "Ingested {} arcs, {} accepted ({} discarded as self-loops, duplicates, or out of range)",
        pushed,
        inserted,
        pushed - inserted
    );

    Ok(adj.into_graph())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("broken stream")]
    struct Broken;

    #[test]
    fn test_zero_threads() {
        let options = IngestOptions {
            num_threads: 0,
            ..Default::default()
        };
        assert!(matches!(
            ingest(3, [(0, 1)], &options),
            Err(IngestError::NoThreads)
        ));
    }

    #[test]
    fn test_zero_capacity() {
        let options = IngestOptions {
            num_threads: 1,
            queue_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            ingest(3, [(0, 1)], &options),
            Err(IngestError::Queue(QueueError::ZeroCapacity))
        ));
    }

    #[test]
    fn test_source_error() {
        let options = IngestOptions {
            num_threads: 2,
            queue_capacity: 1,
            ..Default::default()
        };
        let arcs = (0..1000).map(|i| {
            if i == 500 {
                Err(Broken)
            } else {
                Ok((i % 10, 0))
            }
        });
        let err = try_ingest(10, arcs, &options).unwrap_err();
        assert!(matches!(err, IngestError::Source(_)));
        assert_eq!(err.to_string(), "Could not read the arcs: broken stream");
    }

    #[test]
    fn test_slot_limit() {
        let options = IngestOptions {
            num_threads: 1,
            queue_capacity: 4,
            max_slots: 2,
        };
        let within = [(1, 0), (2, 0), (0, 3), (1, 0)];
        assert_eq!(ingest(4, within, &options).unwrap().num_arcs(), 3);
        let beyond = [(1, 0), (2, 0), (3, 0)];
        let err = ingest(4, beyond, &options).unwrap_err();
        assert!(matches!(
            err,
            IngestError::Adjacency(AdjacencyError::OutOfMemory { node: 0, .. })
        ));
    }

    #[test]
    fn test_same_graph_as_sequential() {
        let arcs = (0..10_000usize)
            .map(|i| (i * 7 % 101, i * 13 % 97))
            .collect::<Vec<_>>();
        let expected = InGraph::from_arcs(101, arcs.iter().copied()).unwrap();
        for num_threads in [1, 2, 7] {
            let options = IngestOptions {
                num_threads,
                queue_capacity: 16,
                ..Default::default()
            };
            let g = ingest(101, arcs.iter().copied(), &options).unwrap();
            assert_eq!(g.num_arcs(), expected.num_arcs());
            assert_eq!(g.outdegrees(), expected.outdegrees());
            for node in 0..101 {
                let mut a = g.predecessors(node).to_vec();
                let mut b = expected.predecessors(node).to_vec();
                a.sort_unstable();
                b.sort_unstable();
                assert_eq!(a, b);
            }
        }
    }
}
