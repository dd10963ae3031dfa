/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]
// for now we don't need any new feature but we might remove this in the future
#![deny(unstable_features)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(clippy::empty_loop)]
#![deny(unreachable_code)]
#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]
#![deny(unused_doc_comments)]

pub mod graphs;
pub mod rank;
#[cfg(unix)]
pub mod signal;
pub mod thread_pool;
pub mod utils;

#[cfg(feature = "cli")]
pub mod cli;

pub mod prelude {
    pub use crate::graphs::{ingest, try_ingest, InGraph, IngestOptions};
    pub use crate::rank::pagerank::preds::{L1Norm, MaxIter};
    pub use crate::rank::{
        PageRank, PageRankConfig, PageRankResult, ProgressMailbox, RankReport, Termination,
    };
    pub use crate::thread_pool::TaskPool;
    pub use crate::utils::Granularity;
}
