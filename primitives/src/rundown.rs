//! Rundown protection: a refcount that can be "run down" so a teardown path
//! can wait for every in-flight acquirer to release before freeing shared
//! state out from under them.
//!
//! The shape mirrors `throttle::Semaphore` in the teacher repo: an
//! `AtomicBool` gate guarding whether new acquires are accepted, paired with
//! a `tokio::sync::Notify` woken once the last holder releases.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

use crate::error::{Error, Result};

#[derive(Debug)]
struct Inner {
    acquiring: AtomicBool,
    count: AtomicUsize,
    drained: Notify,
}

/// A clonable rundown guard. Acquire a reference with [`Rundown::acquire`]
/// before touching state protected by the rundown, and release it when
/// done. Once [`Rundown::release_and_wait`] has been called, further
/// acquires fail with [`Error::RundownReleased`].
#[derive(Debug, Clone)]
pub struct Rundown {
    inner: Arc<Inner>,
}

/// An active acquisition. Dropping this releases the reference.
#[derive(Debug)]
pub struct RundownRef {
    inner: Arc<Inner>,
}

impl Default for Rundown {
    fn default() -> Self {
        Self::new()
    }
}

impl Rundown {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                acquiring: AtomicBool::new(true),
                count: AtomicUsize::new(0),
                drained: Notify::new(),
            }),
        }
    }

    /// Take a reference, keeping the rundown alive. Fails once the rundown
    /// has begun (or completed) shutdown.
    pub fn acquire(&self) -> Result<RundownRef> {
        if !self.inner.acquiring.load(Ordering::Acquire) {
            return Err(Error::RundownReleased);
        }
        self.inner.count.fetch_add(1, Ordering::AcqRel);
        // Re-check after incrementing: a release_and_wait call racing with
        // this acquire must not observe a count of zero and return early
        // while we're still about to use the protected state.
        if !self.inner.acquiring.load(Ordering::Acquire) {
            if self.inner.count.fetch_sub(1, Ordering::AcqRel) == 1 {
                self.inner.drained.notify_waiters();
            }
            return Err(Error::RundownReleased);
        }
        Ok(RundownRef {
            inner: self.inner.clone(),
        })
    }

    /// Block new acquires and wait for every outstanding [`RundownRef`] to
    /// drop. Idempotent: calling it more than once just waits again.
    pub async fn release_and_wait(&self) {
        self.inner.acquiring.store(false, Ordering::Release);
        loop {
            // Register for the next wakeup before checking the count: if
            // the last ref drops between the check and the `.await`, its
            // `notify_waiters()` call would otherwise land on no one
            // listening yet and this would hang forever.
            let notified = self.inner.drained.notified();
            if self.inner.count.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for RundownRef {
    fn drop(&mut self) {
        if self.inner.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.drained.notify_waiters();
        }
    }
}
