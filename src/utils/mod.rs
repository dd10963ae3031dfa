/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Miscellaneous utilities.

mod argmax;
pub use argmax::argmax;

pub mod bounded_queue;

mod granularity;
pub use granularity::Granularity;

pub mod mtx;
