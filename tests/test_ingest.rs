/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use dsi_progress_logger::concurrent_progress_logger;
use pagerank_rt::graphs::concurrent_adjacency::AdjacencyError;
use pagerank_rt::graphs::{
    ingest, try_ingest, try_ingest_with_logging, InGraph, IngestError, IngestOptions,
};
use std::cell::Cell;
use pagerank_rt::utils::mtx::MtxReader;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::io::Write;

fn sorted_predecessors(g: &InGraph, node: usize) -> Vec<usize> {
    let mut preds = g.predecessors(node).to_vec();
    preds.sort_unstable();
    preds
}

#[test]
fn test_random_arcs_with_noise() {
    let _ = env_logger::builder().is_test(true).try_init();
    let n = 300;
    let mut rng = SmallRng::seed_from_u64(0);
    // Out-of-range endpoints, self-loops, and many duplicates
    let arcs = (0..20_000)
        .map(|_| (rng.random_range(0..n + 10), rng.random_range(0..n + 10)))
        .collect::<Vec<_>>();
    let distinct = arcs
        .iter()
        .copied()
        .filter(|&(s, d)| s != d && s < n && d < n)
        .collect::<HashSet<_>>();

    for (num_threads, queue_capacity) in [(1, 1), (4, 2048), (16, 3)] {
        let options = IngestOptions {
            num_threads,
            queue_capacity,
            ..Default::default()
        };
        let g = ingest(n, arcs.iter().copied(), &options).unwrap();
        assert_eq!(g.num_nodes(), n);
        assert_eq!(g.num_arcs(), distinct.len() as u64);
        let mut outdegrees = vec![0; n];
        for &(s, _) in &distinct {
            outdegrees[s] += 1;
        }
        assert_eq!(g.outdegrees(), outdegrees.as_slice());
        for node in 0..n {
            let mut expected = distinct
                .iter()
                .filter(|&&(_, d)| d == node)
                .map(|&(s, _)| s)
                .collect::<Vec<_>>();
            expected.sort_unstable();
            assert_eq!(sorted_predecessors(&g, node), expected);
        }
    }
}

#[test]
fn test_duplicates_across_threads() {
    // The same arc pushed many times must be counted once
    let options = IngestOptions {
        num_threads: 8,
        queue_capacity: 4,
        ..Default::default()
    };
    let g = ingest(2, std::iter::repeat((0, 1)).take(10_000), &options).unwrap();
    assert_eq!(g.num_arcs(), 1);
    assert_eq!(g.outdegree(0), 1);
    assert_eq!(g.predecessors(1), &[0]);
}

#[test]
fn test_empty_stream() {
    let g = ingest(5, [], &IngestOptions::default()).unwrap();
    assert_eq!(g.num_nodes(), 5);
    assert_eq!(g.num_arcs(), 0);
    assert_eq!(g.num_dangling(), 5);
}

#[test]
fn test_all_workers_fail() {
    // Every arc after the first one overflows the predecessor list of node 0,
    // so each worker fails on the first arc it cannot insert
    let num_arcs = 100_000;
    let options = IngestOptions {
        num_threads: 4,
        queue_capacity: 1,
        max_slots: 1,
    };
    let produced = Cell::new(0);
    let arcs = (1..=num_arcs)
        .map(|i| (i, 0))
        .inspect(|_| produced.set(produced.get() + 1));
    let err = ingest(num_arcs + 1, arcs, &options).unwrap_err();
    assert!(matches!(
        err,
        IngestError::Adjacency(AdjacencyError::OutOfMemory {
            node: 0,
            requested: 2,
            source: None,
        })
    ));
    // Production stopped as soon as no worker was left
    assert!(produced.get() < 100);
}

#[test]
fn test_from_file() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "%%MatrixMarket matrix coordinate pattern general")?;
    writeln!(file, "% a comment")?;
    writeln!(file, "4 4 6")?;
    for line in ["1 2", "2 3", "3 1", "3 1", "2 2", "4 9", "garbage"] {
        writeln!(file, "{line}")?;
    }
    file.flush()?;

    let mut reader = MtxReader::open(file.path())?;
    let options = IngestOptions {
        num_threads: 3,
        queue_capacity: 2,
        ..Default::default()
    };
    let g = try_ingest(reader.num_nodes(), reader.arcs(), &options)?;
    assert_eq!(reader.num_discarded(), 1);
    assert_eq!(g.num_nodes(), 4);
    assert_eq!(g.num_arcs(), 3);
    assert_eq!(g.outdegrees(), &[1, 1, 1, 0]);
    assert_eq!(sorted_predecessors(&g, 0), vec![2]);
    Ok(())
}

#[test]
fn test_with_logging() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut cpl = concurrent_progress_logger![item_name = "arc"];
    let arcs = (0..1000usize).map(|i| Ok::<_, std::io::Error>((i, (i * 3 + 1) % 1000)));
    let options = IngestOptions {
        num_threads: 4,
        queue_capacity: 16,
        ..Default::default()
    };
    let g = try_ingest_with_logging(1000, arcs, &options, &mut cpl)?;
    assert_eq!(g.num_arcs(), 1000);
    Ok(())
}
