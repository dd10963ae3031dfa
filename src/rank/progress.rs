/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A one-slot, coalescing mailbox for progress requests.
///
/// Any number of [`notify`](Self::notify) calls between two
/// [`take`](Self::take) calls collapse into a single pending request. Clones
/// share the same slot, so one clone can be handed to a notifier (e.g., a
/// [signal listener](crate::signal::SignalListener)) and another one to
/// [`PageRank`](super::PageRank), which polls it once per iteration.
#[derive(Debug, Clone, Default)]
pub struct ProgressMailbox {
    pending: Arc<AtomicBool>,
}

impl ProgressMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a progress report.
    pub fn notify(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Returns true, clearing the request, if a progress report was requested
    /// since the last call.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Returns true if a request is pending, without clearing it.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

/// A progress report: the current iteration and the currently highest-ranked
/// node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    /// The number of completed iterations.
    pub iteration: usize,
    /// The node with the highest rank (the lowest index among ties).
    pub node: usize,
    /// The rank of `node`.
    pub rank: f64,
}

impl Display for ProgressReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {:.6}", self.iteration, self.node, self.rank)
    }
}
