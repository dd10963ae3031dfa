/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

pub mod config;
pub use config::{ConfigError, PageRankConfig};

pub mod pagerank;
pub use pagerank::{IterationStats, PageRank, PageRankResult, Termination};

pub mod progress;
pub use progress::{ProgressMailbox, ProgressReport};

pub mod report;
pub use report::RankReport;
