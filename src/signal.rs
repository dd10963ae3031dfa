/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Progress requests through `SIGUSR1`.
//!
//! The signal is handled synchronously by a dedicated listener thread
//! waiting in `sigwait(3)`, which turns each delivery into a
//! [notification](ProgressMailbox::notify). For this to work, the signal must
//! be blocked in every thread of the process, which is obtained by calling
//! [`block_progress_signal`] in the main thread before spawning any other
//! thread (signal masks are inherited).

use crate::rank::ProgressMailbox;
use std::io;
use std::os::unix::thread::JoinHandleExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

fn progress_sigset() -> libc::sigset_t {
    // SAFETY: sigset_t is a plain C type initialized by sigemptyset
    unsafe {
        let mut set: libc::sigset_t = std::mem::zeroed();
        libc::sigemptyset(&mut set);
        libc::sigaddset(&mut set, libc::SIGUSR1);
        set
    }
}

/// Blocks `SIGUSR1` in the calling thread, and thus in all threads it will
/// spawn.
pub fn block_progress_signal() -> io::Result<()> {
    let set = progress_sigset();
    // SAFETY: set is a valid signal set and we do not need the old mask
    let rc = unsafe { libc::pthread_sigmask(libc::SIG_BLOCK, &set, std::ptr::null_mut()) };
    if rc != 0 {
        return Err(io::Error::from_raw_os_error(rc));
    }
    Ok(())
}

/// A thread turning `SIGUSR1` deliveries into progress notifications.
///
/// The listener is stopped by [`stop`](Self::stop) or when dropped.
#[derive(Debug)]
pub struct SignalListener {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SignalListener {
    /// Spawns a listener notifying `mailbox`.
    ///
    /// `SIGUSR1` is blocked in the calling thread before spawning the
    /// listener. Threads spawned before this call (or before
    /// [`block_progress_signal`]) might still receive the signal, whose
    /// default action is terminating the process.
    pub fn spawn(mailbox: ProgressMailbox) -> io::Result<Self> {
        block_progress_signal()?;
        let stop = Arc::new(AtomicBool::new(false));
        let handle = std::thread::Builder::new()
            .name("signal-listener".into())
            .spawn({
                let stop = stop.clone();
                move || listen(mailbox, stop)
            })?;
        log::debug!("Listening for SIGUSR1 progress requests");
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Stops and joins the listener thread.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.stop.store(true, Ordering::Release);
        // Wake up the listener; as the signal is blocked, it stays pending
        // until the next sigwait if the listener is not waiting yet
        // SAFETY: the thread has not been joined, so its id is valid
        let thread = handle.as_pthread_t() as libc::pthread_t;
        let rc = unsafe { libc::pthread_kill(thread, libc::SIGUSR1) };
        if rc != 0 {
            log::warn!(
                "Could not wake up the signal listener: {}",
                io::Error::from_raw_os_error(rc)
            );
            // Leave the thread detached rather than waiting forever
            return;
        }
        if handle.join().is_err() {
            log::warn!("The signal listener panicked");
        }
    }
}

impl Drop for SignalListener {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn listen(mailbox: ProgressMailbox, stop: Arc<AtomicBool>) {
    let set = progress_sigset();
    loop {
        let mut signal = 0;
        // SAFETY: set is a valid signal set
        let rc = unsafe { libc::sigwait(&set, &mut signal) };
        if stop.load(Ordering::Acquire) {
            break;
        }
        if rc != 0 {
            log::warn!(
                "Stopping the signal listener: {}",
                io::Error::from_raw_os_error(rc)
            );
            break;
        }
        log::debug!("Received a progress request");
        mailbox.notify();
    }
}
