/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! A fixed-size pool of persistent worker threads with an idle barrier.
//!
//! Work items are closures submitted with [`TaskPool::submit`] and executed
//! in FIFO order by the first available worker. The method
//! [`TaskPool::wait_until_idle`] blocks until no work item is queued or
//! executing, making it possible to use the pool for bulk-synchronous
//! computations: submit a batch of tasks, wait, submit the next batch.
//!
//! Work items passed to [`submit`](TaskPool::submit) must be `'static`. For
//! tasks borrowing local data, use [`TaskPool::scope`]: the scope does not
//! return before the pool is idle, so its tasks can borrow anything that
//! outlives the call.
//!
//! A panicking work item does not bring down its worker: the panic is caught
//! and counted (see [`num_panicked`](TaskPool::num_panicked)), and the item is
//! considered completed.

use crossbeam_channel::{Receiver, Sender};
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use thiserror::Error;

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("A task pool needs at least one thread")]
    NoThreads,
    #[error("Could not spawn a worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// State shared between the pool handle and its workers.
#[derive(Debug, Default)]
struct Shared {
    /// Number of work items submitted but not completed (queued or running).
    outstanding: Mutex<usize>,
    /// Notified every time `outstanding` goes back to zero.
    idle: Condvar,
    panicked: AtomicUsize,
    /// Set by shutdown; workers discard the items they receive afterwards.
    stopping: AtomicBool,
}

impl Shared {
    fn add_outstanding(&self) {
        *self.outstanding.lock().unwrap() += 1;
    }

    fn task_done(&self) {
        let mut outstanding = self.outstanding.lock().unwrap();
        *outstanding -= 1;
        if *outstanding == 0 {
            self.idle.notify_all();
        }
    }
}

/// A pool of persistent worker threads.
///
/// # Examples
///
/// ```
/// use pagerank_rt::thread_pool::TaskPool;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let pool = TaskPool::new(4).unwrap();
/// let counter = Arc::new(AtomicUsize::new(0));
/// for _ in 0..100 {
///     let counter = counter.clone();
///     pool.submit(move || {
///         counter.fetch_add(1, Ordering::Relaxed);
///     });
/// }
/// pool.wait_until_idle();
/// assert_eq!(counter.load(Ordering::Relaxed), 100);
///
/// // Scoped tasks can borrow local data
/// let mut squares = vec![0; 10];
/// pool.scope(|s| {
///     for (i, x) in squares.iter_mut().enumerate() {
///         s.submit(move || *x = i * i);
///     }
/// });
/// assert_eq!(squares[9], 81);
/// pool.shutdown();
/// ```
#[derive(Debug)]
pub struct TaskPool {
    sender: Option<Sender<Job>>,
    receiver: Receiver<Job>,
    workers: Vec<JoinHandle<()>>,
    shared: Arc<Shared>,
}

impl TaskPool {
    /// Creates a new pool with `num_threads` workers.
    pub fn new(num_threads: usize) -> Result<Self, PoolError> {
        if num_threads == 0 {
            return Err(PoolError::NoThreads);
        }
        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();
        let shared = Arc::new(Shared::default());

        let mut pool = Self {
            sender: Some(sender),
            receiver,
            workers: Vec::with_capacity(num_threads),
            shared,
        };

        for thread_id in 0..num_threads {
            let receiver = pool.receiver.clone();
            let shared = pool.shared.clone();
            let worker = std::thread::Builder::new()
                .name(format!("pagerank-worker-{thread_id}"))
                .spawn(move || worker_loop(receiver, shared));
            match worker {
                Ok(worker) => pool.workers.push(worker),
                // Dropping the pool stops the workers spawned so far
                Err(err) => return Err(PoolError::Spawn(err)),
            }
        }

        log::debug!("Started a task pool with {} threads", num_threads);
        Ok(pool)
    }

    /// Returns the number of worker threads.
    pub fn num_threads(&self) -> usize {
        self.workers.len()
    }

    /// Returns the number of work items that panicked so far.
    pub fn num_panicked(&self) -> usize {
        self.shared.panicked.load(Ordering::Relaxed)
    }

    /// Enqueues a work item.
    pub fn submit<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit_boxed(Box::new(work));
    }

    fn submit_boxed(&self, job: Job) {
        // The sender is taken only by shutdown, which needs exclusive access
        let Some(sender) = &self.sender else {
            unreachable!("Task submitted to a pool that has been shut down");
        };
        self.shared.add_outstanding();
        // Cannot fail, as we keep a receiver
        if sender.send(job).is_err() {
            self.shared.task_done();
        }
    }

    /// Blocks until all submitted work items have completed.
    ///
    /// It is safe to call this method repeatedly and from multiple threads.
    /// Calling it from inside a work item of the same pool deadlocks.
    pub fn wait_until_idle(&self) {
        let mut outstanding = self.shared.outstanding.lock().unwrap();
        while *outstanding > 0 {
            outstanding = self.shared.idle.wait(outstanding).unwrap();
        }
    }

    /// Runs `op` with a [`Scope`] accepting non-`'static` work items, and
    /// waits for the pool to become idle before returning.
    ///
    /// The wait happens even if `op` panics.
    pub fn scope<'scope, R>(&self, op: impl FnOnce(&Scope<'_, 'scope>) -> R) -> R {
        struct IdleGuard<'a>(&'a TaskPool);
        impl Drop for IdleGuard<'_> {
            fn drop(&mut self) {
                self.0.wait_until_idle();
            }
        }

        let _guard = IdleGuard(self);
        op(&Scope {
            pool: self,
            _marker: PhantomData,
        })
    }

    /// Discards all queued work items, waits for the running ones to
    /// complete, and joins the worker threads.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(sender) = self.sender.take() else {
            return;
        };
        self.shared.stopping.store(true, Ordering::Release);
        // Workers exit once the channel is empty and disconnected
        drop(sender);
        let discarded = self
            .receiver
            .try_iter()
            .map(|job| {
                drop(job);
                self.shared.task_done();
            })
            .count();
        if discarded > 0 {
            log::debug!("Discarded {} queued work items", discarded);
        }
        for worker in self.workers.drain(..) {
            // Workers catch panics, so this cannot fail
            let _ = worker.join();
        }
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(receiver: Receiver<Job>, shared: Arc<Shared>) {
    while let Ok(job) = receiver.recv() {
        if shared.stopping.load(Ordering::Acquire) {
            drop(job);
            shared.task_done();
            continue;
        }
        if let Err(payload) = catch_unwind(AssertUnwindSafe(job)) {
            shared.panicked.fetch_add(1, Ordering::Relaxed);
            let msg = payload
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("<non-string payload>");
            log::warn!(
                "A work item panicked on thread {:?}: {}",
                std::thread::current().name().unwrap_or("<unnamed>"),
                msg
            );
        }
        shared.task_done();
    }
}

/// A scope for submitting work items that borrow data living at least as
/// long as `'scope`.
///
/// See [`TaskPool::scope`].
pub struct Scope<'pool, 'scope> {
    pool: &'pool TaskPool,
    // Invariant in 'scope
    _marker: PhantomData<&'scope mut &'scope ()>,
}

impl<'scope> Scope<'_, 'scope> {
    /// Enqueues a work item that may borrow data living for `'scope`.
    pub fn submit<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'scope,
    {
        let job: Box<dyn FnOnce() + Send + 'scope> = Box::new(work);
        // SAFETY: TaskPool::scope waits (also when unwinding) until the pool
        // is idle, that is, until this job has been executed or discarded,
        // before 'scope can end. Jobs are never discarded while a scope is
        // active, as shutdown requires exclusive access to the pool.
        let job: Job =
            unsafe { std::mem::transmute::<Box<dyn FnOnce() + Send + 'scope>, Job>(job) };
        self.pool.submit_boxed(job);
    }

    /// Returns the number of worker threads of the underlying pool.
    pub fn num_threads(&self) -> usize {
        self.pool.num_threads()
    }
}
