/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! A bounded, blocking, multi-consumer FIFO queue.
//!
//! The queue has a fixed capacity: [`Producer::push`] blocks while the queue
//! is full, and [`Consumer::pop`] blocks while it is empty. The end of the
//! stream is signalled by [closing](Producer::close) the producer side: once
//! the queue is closed _and_ drained, every consumer (however many clones
//! exist) sees [`pop`](Consumer::pop) return `None`. Since the queue is
//! strictly FIFO, no consumer can observe the end of the stream before all
//! items pushed before the close have been dequeued by the consumers taken
//! together.
//!
//! Note that dequeuing is not processing: a caller that needs to know that
//! all items have been _processed_ must join the consumer threads.
//!
//! The implementation is a thin layer over [`crossbeam_channel::bounded`],
//! whose send and receive operations park the calling thread instead of
//! spinning.
//!
//! # Examples
//!
//! ```
//! use pagerank_rt::utils::bounded_queue;
//!
//! let (producer, consumer) = bounded_queue::bounded(2).unwrap();
//! let workers = (0..3)
//!     .map(|_| {
//!         let consumer = consumer.clone();
//!         std::thread::spawn(move || {
//!             let mut seen = 0;
//!             while let Some(_item) = consumer.pop() {
//!                 seen += 1;
//!             }
//!             seen
//!         })
//!     })
//!     .collect::<Vec<_>>();
//! drop(consumer);
//!
//! for i in 0..100 {
//!     producer.push(i).unwrap();
//! }
//! producer.close();
//!
//! let total: usize = workers.into_iter().map(|w| w.join().unwrap()).sum();
//! assert_eq!(total, 100);
//! ```

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("The capacity of a bounded queue must be positive")]
    ZeroCapacity,
}

/// The item could not be pushed because all consumers have been dropped.
///
/// The rejected item is returned to the caller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("All consumers of the queue have been dropped")]
pub struct Disconnected<T>(pub T);

/// Creates a new bounded queue with the given capacity, returning its
/// producer and consumer ends.
///
/// The consumer end can be cloned to obtain multiple consumers.
pub fn bounded<T>(capacity: usize) -> Result<(Producer<T>, Consumer<T>), QueueError> {
    if capacity == 0 {
        return Err(QueueError::ZeroCapacity);
    }
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    Ok((Producer { tx }, Consumer { rx }))
}

/// The producer end of a [bounded queue](bounded).
#[derive(Debug)]
pub struct Producer<T> {
    tx: Sender<T>,
}

impl<T> Producer<T> {
    /// Pushes an item at the end of the queue, blocking while the queue is
    /// full.
    ///
    /// Fails, giving back the item, only if all consumers have been dropped.
    pub fn push(&self, item: T) -> Result<(), Disconnected<T>> {
        self.tx.send(item).map_err(|e| Disconnected(e.into_inner()))
    }

    /// Closes the queue.
    ///
    /// Items already in the queue are still delivered; after them, every
    /// consumer receives the end-of-stream marker.
    pub fn close(self) {
        drop(self.tx);
    }

    /// Returns the number of items currently in the queue.
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    /// Returns true if the queue is currently empty.
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    /// Returns the capacity of the queue.
    pub fn capacity(&self) -> usize {
        // Always Some for bounded channels
        self.tx.capacity().unwrap_or(usize::MAX)
    }
}

/// The consumer end of a [bounded queue](bounded).
///
/// Clones share the same queue: each item is delivered to exactly one of
/// them.
#[derive(Debug, Clone)]
pub struct Consumer<T> {
    rx: Receiver<T>,
}

impl<T> Consumer<T> {
    /// Removes the item at the front of the queue, blocking while the queue
    /// is empty.
    ///
    /// Returns `None` once the queue has been closed and all items have been
    /// dequeued.
    pub fn pop(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    /// Returns the number of items currently in the queue.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Returns true if the queue is currently empty.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl<T> IntoIterator for Consumer<T> {
    type Item = T;
    type IntoIter = crossbeam_channel::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rx.into_iter()
    }
}
