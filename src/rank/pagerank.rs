/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Parallel Jacobi PageRank on a [`TaskPool`].
//!
//! # The formula
//!
//! We compute the weakly preferential PageRank with uniform preference
//! vector: dangling nodes (nodes without successors) distribute their rank
//! uniformly among all nodes. If *n* is the number of nodes, α the damping
//! factor, *d*⁺(*i*) the outdegree of node *i*, and **x**⁽*ᵗ*⁾ the
//! approximation at iteration *t*, one iteration computes
//!
//! > *xⱼ*⁽*ᵗ* ⁺ ¹⁾ = (1 − α) / *n*  +  α ∑_(*i* → *j*) *yᵢ*  +  α *S* / *n*,
//!
//! where *yᵢ* = *xᵢ*⁽*ᵗ*⁾ / *d*⁺(*i*) is the _normalized_ rank of the
//! non-dangling node *i*, and *S* is the _dangling mass_, that is, the sum
//! of *xᵢ*⁽*ᵗ*⁾ over dangling nodes *i*. Starting from the uniform vector,
//! every approximation is a probability distribution.
//!
//! # Parallelism
//!
//! Each iteration is made of two phases separated by a barrier
//! ([`TaskPool::scope`] waits for the pool to be idle):
//!
//! 1. the _map_ phase submits one task per block of nodes (by default, one
//!    node per task; see [`granularity`](PageRank::granularity)); each task
//!    computes the new ranks of its block from the normalized ranks and
//!    dangling mass of the previous iteration, which are read-only during the
//!    phase, writing only in its own slots of the next rank vector;
//! 2. the two rank vectors are swapped, and the _reduce_ phase submits three
//!    concurrent tasks computing over the new rank vector the dangling mass,
//!    the normalized ranks, and the ℓ₁ distance from the previous vector.
//!
//! Since tasks of the same phase write to disjoint data, and phases never
//! overlap, no locking is needed on rank data. All sums are compensated
//! (Kahan) sums.
//!
//! # Stopping criteria
//!
//! The computation is a do-while loop: it always performs at least one
//! iteration, and then stops when the ℓ₁ distance between successive
//! approximations is at most the [threshold](PageRank::threshold)
//! ([`Termination::Converged`]) or when the [maximum number of
//! iterations](PageRank::max_iter) has been reached
//! ([`Termination::Exhausted`]). If both conditions hold, the computation is
//! considered converged.
//!
//! # Progress reports
//!
//! If a [`ProgressMailbox`] has been [provided](PageRank::progress), it is
//! polled once after each iteration, on the calling thread. If a report was
//! requested, a line containing the iteration number, the index of the
//! highest-ranked node, and its rank is printed on standard error.

pub mod preds {
    //! Predicates implementing stopping conditions.
    //!
    //! [`PageRank`](super::PageRank) evaluates these predicates after each
    //! iteration: they evaluate to true if the computation should be stopped.
    //!
    //! # Examples
    //! ```
    //! # fn main() -> Result<(), Box<dyn std::error::Error>> {
    //! use pagerank_rt::rank::pagerank::preds::{L1Norm, MaxIter, PredParams};
    //! use predicates::prelude::*;
    //!
    //! let threshold = L1Norm::try_from(1E-6)?;
    //! let max_iter = MaxIter::try_from(100)?;
    //! let params = PredParams { iteration: 100, l1_error: 1E-3 };
    //! assert!(!threshold.eval(&params));
    //! assert!(max_iter.eval(&params));
    //! #     Ok(())
    //! # }
    //! ```

    use anyhow::ensure;
    use predicates::{reflection::PredicateReflection, Predicate};
    use std::fmt::Display;

    #[doc(hidden)]
    /// This structure is passed to stopping predicates to provide the
    /// information that is needed to evaluate them.
    #[derive(Debug)]
    pub struct PredParams {
        pub iteration: usize,
        pub l1_error: f64,
    }

    /// Stops after at most the provided number of iterations.
    #[derive(Debug, Clone, Copy)]
    pub struct MaxIter {
        max_iter: usize,
    }

    impl MaxIter {
        pub const DEFAULT_MAX_ITER: usize = 100;

        pub fn max_iter(&self) -> usize {
            self.max_iter
        }
    }

    impl TryFrom<usize> for MaxIter {
        type Error = anyhow::Error;
        fn try_from(max_iter: usize) -> anyhow::Result<Self> {
            ensure!(
                max_iter > 0,
                "The maximum number of iterations must be positive"
            );
            Ok(MaxIter { max_iter })
        }
    }

    impl Default for MaxIter {
        fn default() -> Self {
            MaxIter {
                max_iter: Self::DEFAULT_MAX_ITER,
            }
        }
    }

    impl Display for MaxIter {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_fmt(format_args!("(max iter: {})", self.max_iter))
        }
    }

    impl PredicateReflection for MaxIter {}

    impl Predicate<PredParams> for MaxIter {
        fn eval(&self, pred_params: &PredParams) -> bool {
            pred_params.iteration >= self.max_iter
        }
    }

    /// Stops when the ℓ₁ norm of the difference between successive
    /// approximations is at most a given threshold.
    #[derive(Debug, Clone, Copy)]
    pub struct L1Norm {
        threshold: f64,
    }

    impl L1Norm {
        pub const DEFAULT_THRESHOLD: f64 = 1E-7;

        pub fn threshold(&self) -> f64 {
            self.threshold
        }
    }

    impl TryFrom<Option<f64>> for L1Norm {
        type Error = anyhow::Error;
        fn try_from(threshold: Option<f64>) -> anyhow::Result<Self> {
            Ok(match threshold {
                Some(threshold) => {
                    ensure!(!threshold.is_nan(), "The threshold cannot be NaN");
                    ensure!(threshold > 0.0, "The threshold must be positive");
                    L1Norm { threshold }
                }
                None => Self::default(),
            })
        }
    }

    impl TryFrom<f64> for L1Norm {
        type Error = anyhow::Error;
        fn try_from(threshold: f64) -> anyhow::Result<Self> {
            Some(threshold).try_into()
        }
    }

    impl Default for L1Norm {
        fn default() -> Self {
            L1Norm {
                threshold: Self::DEFAULT_THRESHOLD,
            }
        }
    }

    impl Display for L1Norm {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_fmt(format_args!("(norm: {})", self.threshold))
        }
    }

    impl PredicateReflection for L1Norm {}

    impl Predicate<PredParams> for L1Norm {
        fn eval(&self, pred_params: &PredParams) -> bool {
            pred_params.l1_error <= self.threshold
        }
    }
}

use super::progress::{ProgressMailbox, ProgressReport};
use crate::graphs::InGraph;
use crate::thread_pool::TaskPool;
use crate::utils::{argmax, Granularity};
use dsi_progress_logger::{no_logging, ProgressLog};
use kahan::KahanSum;
use predicates::Predicate;
use preds::{L1Norm, MaxIter, PredParams};

/// Why a PageRank computation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The ℓ₁ distance between the last two approximations was below the
    /// threshold.
    Converged,
    /// The maximum number of iterations was reached.
    Exhausted,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Converged => f.write_str("converged"),
            Termination::Exhausted => f.write_str("exhausted"),
        }
    }
}

/// The outcome of a PageRank computation.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRankResult {
    /// The rank vector.
    pub rank: Box<[f64]>,
    /// The number of iterations performed.
    pub iterations: usize,
    /// The ℓ₁ distance between the last two approximations.
    pub l1_error: f64,
    /// Why the computation stopped.
    pub termination: Termination,
}

impl PageRankResult {
    /// Returns true if the computation converged.
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}

/// Data passed after each iteration to the inspector of
/// [`run_inspect`](PageRank::run_inspect).
#[derive(Debug)]
pub struct IterationStats<'a> {
    /// The number of completed iterations.
    pub iteration: usize,
    /// The current rank vector.
    pub rank: &'a [f64],
    /// The dangling mass of the current rank vector.
    pub dangling_mass: f64,
    /// The ℓ₁ distance between the current and the previous rank vector.
    pub l1_error: f64,
    /// The progress report emitted at the end of this iteration, if any.
    pub report: Option<ProgressReport>,
}

/// Computes PageRank using a parallel Jacobi iteration on a [`TaskPool`].
///
/// The struct is configured via setters and then executed via
/// [`run`](Self::run), which returns a [`PageRankResult`].
///
/// # Examples
///
/// ```
/// use pagerank_rt::graphs::InGraph;
/// use pagerank_rt::rank::pagerank::{preds::L1Norm, PageRank};
/// use pagerank_rt::thread_pool::TaskPool;
///
/// // 0 → 1, 0 → 2, 1 → 2, 2 → 0, 3 → 0, 4 → 3
/// let g = InGraph::from_arcs(5, [(0, 1), (0, 2), (1, 2), (2, 0), (3, 0), (4, 3)]).unwrap();
/// let pool = TaskPool::new(4).unwrap();
///
/// let mut pr = PageRank::new(&g, &pool);
/// pr.alpha(0.9).threshold(L1Norm::try_from(1E-9).unwrap());
/// let result = pr.run();
///
/// assert!(result.converged());
/// assert_eq!(result.rank.len(), 5);
/// assert!((result.rank.iter().sum::<f64>() - 1.0).abs() < 1E-9);
/// ```
pub struct PageRank<'a> {
    graph: &'a InGraph,
    pool: &'a TaskPool,
    alpha: f64,
    threshold: L1Norm,
    max_iter: MaxIter,
    granularity: Granularity,
    mailbox: Option<&'a ProgressMailbox>,
}

impl std::fmt::Debug for PageRank<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRank")
            .field("alpha", &self.alpha)
            .field("threshold", &self.threshold)
            .field("max_iter", &self.max_iter)
            .field("granularity", &self.granularity)
            .finish_non_exhaustive()
    }
}

impl<'a> PageRank<'a> {
    pub const DEFAULT_ALPHA: f64 = 0.85;

    /// Creates a new PageRank computation on `graph` using the threads of
    /// `pool`.
    pub fn new(graph: &'a InGraph, pool: &'a TaskPool) -> Self {
        Self {
            graph,
            pool,
            alpha: Self::DEFAULT_ALPHA,
            threshold: L1Norm::default(),
            max_iter: MaxIter::default(),
            granularity: Granularity::default(),
            mailbox: None,
        }
    }

    /// Sets the damping factor α.
    ///
    /// # Panics
    ///
    /// Panics if `alpha` is not in the open interval (0 . . 1).
    pub fn alpha(&mut self, alpha: f64) -> &mut Self {
        assert!(
            alpha > 0.0 && alpha < 1.0,
            "The damping factor must be in (0 . . 1), got {alpha}"
        );
        self.alpha = alpha;
        self
    }

    /// Sets the ℓ₁ threshold under which the computation is considered
    /// converged.
    pub fn threshold(&mut self, threshold: L1Norm) -> &mut Self {
        self.threshold = threshold;
        self
    }

    /// Sets the maximum number of iterations.
    pub fn max_iter(&mut self, max_iter: MaxIter) -> &mut Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the number of nodes processed by each task of the map phase.
    pub fn granularity(&mut self, granularity: Granularity) -> &mut Self {
        self.granularity = granularity;
        self
    }

    /// Sets the mailbox polled after each iteration for progress requests.
    pub fn progress(&mut self, mailbox: Option<&'a ProgressMailbox>) -> &mut Self {
        self.mailbox = mailbox;
        self
    }

    /// Runs the PageRank computation.
    pub fn run(&self) -> PageRankResult {
        self.run_inspect(no_logging![], |_| {})
    }

    /// Runs the PageRank computation, logging iterations with the given
    /// [`ProgressLog`].
    pub fn run_with_logging(&self, pl: &mut impl ProgressLog) -> PageRankResult {
        self.run_inspect(pl, |_| {})
    }

    /// Runs the PageRank computation, logging iterations with the given
    /// [`ProgressLog`] and passing an [`IterationStats`] to `inspect` after
    /// each iteration.
    pub fn run_inspect(
        &self,
        pl: &mut impl ProgressLog,
        mut inspect: impl FnMut(&IterationStats<'_>),
    ) -> PageRankResult {
        let graph = self.graph;
        let alpha = self.alpha;
        let n = graph.num_nodes();

        log::info!("Alpha: {}", alpha);
        log::info!(
            "Stopping criterion: {} or {}",
            self.threshold,
            self.max_iter
        );

        let inv_n = if n == 0 { 0.0 } else { 1.0 / n as f64 };
        let base = (1.0 - alpha) * inv_n;

        let mut current = vec![inv_n; n].into_boxed_slice();
        let mut next = vec![0.0; n].into_boxed_slice();
        let mut normalized = vec![0.0; n].into_boxed_slice();

        normalize(graph, &current, &mut normalized);
        let mut dangling_mass = dangling_mass(graph, &current);
        log::info!(
            "{} dangling nodes, initial dangling mass: {}",
            graph.num_dangling(),
            dangling_mass
        );

        let node_granularity = self.granularity.node_granularity(n, graph.num_arcs());

        pl.item_name("iteration");
        pl.expected_updates(Some(self.max_iter.max_iter()));
        pl.start(format!(
            "Computing PageRank (alpha={alpha}, granularity={node_granularity}, threads={})...",
            self.pool.num_threads()
        ));

        let mut iteration = 0;
        let (termination, l1_error) = loop {
            let dangling_term = alpha * dangling_mass * inv_n;

            // Map phase: compute the next approximation
            self.pool.scope(|s| {
                let normalized = &normalized;
                for (block, chunk) in next.chunks_mut(node_granularity).enumerate() {
                    let first = block * node_granularity;
                    s.submit(move || {
                        for (offset, x) in chunk.iter_mut().enumerate() {
                            let mut sigma = KahanSum::<f64>::new();
                            for &pred in graph.predecessors(first + offset) {
                                sigma += normalized[pred];
                            }
                            *x = base + alpha * sigma.sum() + dangling_term;
                        }
                    });
                }
            });

            std::mem::swap(&mut current, &mut next);

            // Reduce phase: dangling mass, normalized ranks, and error
            let mut l1_error = 0.0;
            self.pool.scope(|s| {
                let (current, previous) = (&current, &next);
                let normalized = &mut normalized;
                let dangling = &mut dangling_mass;
                let error = &mut l1_error;
                s.submit(move || *dangling = self::dangling_mass(graph, current));
                s.submit(move || normalize(graph, current, normalized));
                s.submit(move || *error = l1_distance(current, previous));
            });

            iteration += 1;
            log::info!("Iteration {}: L1 error = {}", iteration, l1_error);

            let report = match self.mailbox {
                Some(mailbox) if mailbox.take() => argmax(current.iter()).map(|node| {
                    let report = ProgressReport {
                        iteration,
                        node,
                        rank: current[node],
                    };
                    eprintln!("{}", report);
                    report
                }),
                _ => None,
            };

            inspect(&IterationStats {
                iteration,
                rank: &current,
                dangling_mass,
                l1_error,
                report,
            });

            pl.update_and_display();

            let params = PredParams {
                iteration,
                l1_error,
            };
            if self.threshold.eval(&params) {
                break (Termination::Converged, l1_error);
            }
            if self.max_iter.eval(&params) {
                break (Termination::Exhausted, l1_error);
            }
        };

        pl.done();
        log::info!(
            "PageRank {} after {} iteration(s), L1 error = {}",
            termination,
            iteration,
            l1_error
        );

        PageRankResult {
            rank: current,
            iterations: iteration,
            l1_error,
            termination,
        }
    }
}

/// Returns the sum of the ranks of dangling nodes.
fn dangling_mass(graph: &InGraph, rank: &[f64]) -> f64 {
    let mut sum = KahanSum::<f64>::new();
    for (&d, &x) in graph.outdegrees().iter().zip(rank) {
        if d == 0 {
            sum += x;
        }
    }
    sum.sum()
}

/// Stores in `normalized` the ranks divided by the outdegrees.
///
/// Entries of dangling nodes are set to zero: they never appear as
/// predecessors, so they are never read.
fn normalize(graph: &InGraph, rank: &[f64], normalized: &mut [f64]) {
    for ((y, &d), &x) in normalized.iter_mut().zip(graph.outdegrees()).zip(rank) {
        *y = if d == 0 { 0.0 } else { x / d as f64 };
    }
}

/// Returns the ℓ₁ distance between two vectors.
fn l1_distance(a: &[f64], b: &[f64]) -> f64 {
    let mut sum = KahanSum::<f64>::new();
    for (&x, &y) in a.iter().zip(b) {
        sum += (x - y).abs();
    }
    sum.sum()
}
