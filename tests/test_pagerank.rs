/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use dsi_progress_logger::no_logging;
use pagerank_rt::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// Returns the ℓ-∞ distance (maximum absolute difference) between two vectors.
fn l_inf_distance(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// A straightforward sequential power method on the successor lists, used as
/// a reference.
fn reference_pagerank(n: usize, arcs: &[(usize, usize)], alpha: f64) -> Vec<f64> {
    let arcs = arcs
        .iter()
        .copied()
        .filter(|&(s, d)| s != d && s < n && d < n)
        .collect::<HashSet<_>>();
    let mut succ = vec![vec![]; n];
    for &(s, d) in &arcs {
        succ[s].push(d);
    }
    let mut rank = vec![1.0 / n as f64; n];
    for _ in 0..10_000 {
        let dangling: f64 = (0..n)
            .filter(|&i| succ[i].is_empty())
            .map(|i| rank[i])
            .sum();
        let mut next = vec![(1.0 - alpha) / n as f64 + alpha * dangling / n as f64; n];
        for (i, s) in succ.iter().enumerate() {
            for &j in s {
                next[j] += alpha * rank[i] / s.len() as f64;
            }
        }
        let delta = l_inf_distance(&rank, &next);
        rank = next;
        if delta < 1E-15 {
            break;
        }
    }
    rank
}

fn random_arcs(n: usize, m: usize, seed: u64) -> Vec<(usize, usize)> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..m)
        .map(|_| (rng.random_range(0..n), rng.random_range(0..n)))
        .collect()
}

#[test]
fn test_two_nodes() {
    let g = InGraph::from_arcs(2, [(0, 1), (1, 0)]).unwrap();
    let pool = TaskPool::new(2).unwrap();
    let mut pr = PageRank::new(&g, &pool);
    pr.alpha(0.9);
    let result = pr.run();
    assert!(result.converged());
    assert!((result.rank[0] - 0.5).abs() < 1E-12);
    assert!((result.rank[1] - 0.5).abs() < 1E-12);
}

#[test]
fn test_cycle_is_uniform() {
    let n = 100;
    let g = InGraph::from_arcs(n, (0..n).map(|i| (i, (i + 1) % n))).unwrap();
    let pool = TaskPool::new(3).unwrap();
    let result = PageRank::new(&g, &pool).run();
    assert_eq!(result.iterations, 1);
    for &x in result.rank.iter() {
        assert!((x - 0.01).abs() < 1E-15);
    }
}

#[test]
fn test_star() {
    // 1 → 0, 2 → 0, 3 → 0, 4 → 0: node 0 is dangling
    let g = InGraph::from_arcs(5, (1..5).map(|i| (i, 0))).unwrap();
    let pool = TaskPool::new(4).unwrap();
    let alpha = 0.85;
    let mut pr = PageRank::new(&g, &pool);
    pr.alpha(alpha).threshold(L1Norm::try_from(1E-14).unwrap());
    let result = pr.run();
    assert!(result.converged());
    // Leaves get only the uniform and dangling contributions, c = x₀:
    // x_leaf = (1 − α) / 5 + α c / 5 and c = x_leaf + 4 α x_leaf
    let leaf = (1.0 - alpha) / 5.0 / (1.0 - alpha * (1.0 + 4.0 * alpha) / 5.0);
    let center = leaf * (1.0 + 4.0 * alpha);
    assert!((result.rank[0] - center).abs() < 1E-12);
    for i in 1..5 {
        assert!((result.rank[i] - leaf).abs() < 1E-12);
    }
}

#[test]
fn test_four_node_star() {
    // 1 → 0, 2 → 0, 3 → 0 with the default configuration (α = 0.9, ε = 1E-7)
    let g = InGraph::from_arcs(4, (1..4).map(|i| (i, 0))).unwrap();
    assert_eq!(g.num_dangling(), 1);
    let config = PageRankConfig::default();
    let pool = TaskPool::new(config.num_threads).unwrap();
    let mut pr = PageRank::new(&g, &pool);
    config.configure(&mut pr).unwrap();
    let result = pr.run();
    assert!(result.converged());
    assert_eq!(result.iterations, 43);
    // x_leaf = (1 − α) / 4 + α c / 4 and c = x_leaf + 3 α x_leaf
    let alpha = config.alpha;
    let leaf = (1.0 - alpha) / 4.0 / (1.0 - alpha * (1.0 + 3.0 * alpha) / 4.0);
    assert!((result.rank[0] - leaf * (1.0 + 3.0 * alpha)).abs() < 1E-5);
    assert!((result.rank[0] - 0.552239).abs() < 1E-5);
    for i in 1..4 {
        assert!((result.rank[i] - 0.149254).abs() < 1E-5);
        assert_eq!(result.rank[i], result.rank[1]);
    }
}

#[test]
fn test_random_graphs_against_reference() {
    let _ = env_logger::builder().is_test(true).try_init();
    for (n, m, seed) in [(10, 20, 0), (100, 300, 1), (1000, 5000, 2)] {
        let arcs = random_arcs(n, m, seed);
        let g = InGraph::from_arcs(n, arcs.iter().copied()).unwrap();
        let expected = reference_pagerank(n, &arcs, 0.85);
        for num_threads in [1, 4] {
            let pool = TaskPool::new(num_threads).unwrap();
            let mut pr = PageRank::new(&g, &pool);
            pr.alpha(0.85)
                .threshold(L1Norm::try_from(1E-13).unwrap())
                .max_iter(MaxIter::try_from(1000).unwrap());
            let result = pr.run();
            assert!(result.converged());
            assert!(
                l_inf_distance(&result.rank, &expected) < 1E-10,
                "n = {n}, threads = {num_threads}"
            );
        }
    }
}

#[test]
fn test_thread_count_and_granularity_do_not_matter() {
    let n = 500;
    let arcs = random_arcs(n, 2000, 42);
    let g = InGraph::from_arcs(n, arcs).unwrap();
    let mut results = vec![];
    for (num_threads, granularity) in [
        (1, Granularity::Nodes(1)),
        (2, Granularity::Nodes(7)),
        (8, Granularity::Arcs(100)),
        (3, Granularity::Nodes(n)),
    ] {
        let pool = TaskPool::new(num_threads).unwrap();
        let mut pr = PageRank::new(&g, &pool);
        pr.granularity(granularity);
        results.push(pr.run());
    }
    // Each node is computed by the same sequence of operations
    for result in &results[1..] {
        assert_eq!(result, &results[0]);
    }
}

#[test]
fn test_l1_error_is_reported_correctly() {
    let n = 50;
    let g = InGraph::from_arcs(n, random_arcs(n, 120, 7)).unwrap();
    let pool = TaskPool::new(2).unwrap();
    let mut pr = PageRank::new(&g, &pool);
    pr.max_iter(MaxIter::try_from(20).unwrap())
        .threshold(L1Norm::try_from(1E-300).unwrap());
    let mut previous: Option<Vec<f64>> = None;
    let result = pr.run_inspect(no_logging![], |stats| {
        let sum: f64 = stats.rank.iter().sum();
        assert!((sum - 1.0).abs() < 1E-12);
        let dangling: f64 = (0..n)
            .filter(|&i| g.is_dangling(i))
            .map(|i| stats.rank[i])
            .sum();
        assert!((dangling - stats.dangling_mass).abs() < 1E-12);
        let prev = previous.get_or_insert_with(|| vec![1.0 / n as f64; n]);
        let l1: f64 = prev
            .iter()
            .zip(stats.rank)
            .map(|(a, b)| (a - b).abs())
            .sum();
        assert!((l1 - stats.l1_error).abs() < 1E-12);
        *prev = stats.rank.to_vec();
    });
    assert_eq!(result.iterations, 20);
    assert_eq!(result.termination, Termination::Exhausted);
}

#[test]
fn test_config() {
    let g = InGraph::from_arcs(3, [(0, 1), (1, 2)]).unwrap();
    let pool = TaskPool::new(1).unwrap();
    let mut pr = PageRank::new(&g, &pool);
    let config = PageRankConfig {
        max_iter: 2,
        threshold: 1E-300,
        ..Default::default()
    };
    config.configure(&mut pr).unwrap();
    assert_eq!(pr.run().iterations, 2);

    let config = PageRankConfig {
        alpha: 0.0,
        ..Default::default()
    };
    assert!(config.configure(&mut pr).is_err());
}
