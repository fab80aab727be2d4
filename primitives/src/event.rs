//! Manual- and auto-reset events, waitable with an absolute deadline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{timeout, Instant};

/// Whether a signaled [`Event`] clears itself after waking one waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reset {
    Manual,
    Auto,
}

/// A waitable flag, analogous to a Win32 event object.
#[derive(Debug)]
pub struct Event {
    reset: Reset,
    signaled: AtomicBool,
    notify: Notify,
}

impl Event {
    pub fn new(reset: Reset) -> Self {
        Self {
            reset,
            signaled: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Set the event, waking all current waiters (manual-reset) or one
    /// (auto-reset — the remaining signal stays latched for the next
    /// `wait`).
    pub fn set(&self) {
        self.signaled.store(true, Ordering::Release);
        match self.reset {
            Reset::Manual => self.notify.notify_waiters(),
            Reset::Auto => self.notify.notify_one(),
        }
    }

    /// Clear the event without waiting.
    pub fn reset(&self) {
        self.signaled.store(false, Ordering::Release);
    }

    /// Wait for the event to become signaled, with no deadline.
    pub async fn wait(&self) {
        loop {
            if self.try_consume() {
                return;
            }
            let notified = self.notify.notified();
            if self.try_consume() {
                return;
            }
            notified.await;
        }
    }

    /// Wait for the event, giving up once `deadline` passes.
    ///
    /// Returns `true` if the event was observed signaled, `false` on
    /// timeout.
    pub async fn wait_until(&self, deadline: Instant) -> bool {
        timeout(deadline.saturating_duration_since(Instant::now()), self.wait())
            .await
            .is_ok()
    }

    /// Wait for the event for up to `dur`.
    pub async fn wait_timeout(&self, dur: Duration) -> bool {
        self.wait_until(Instant::now() + dur).await
    }

    fn try_consume(&self) -> bool {
        match self.reset {
            Reset::Manual => self.signaled.load(Ordering::Acquire),
            Reset::Auto => self
                .signaled
                .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
                .is_ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_reset_wakes_all_and_stays_set() {
        let ev = Event::new(Reset::Manual);
        ev.set();
        ev.wait().await;
        ev.wait().await;
    }

    #[tokio::test]
    async fn auto_reset_consumes_signal_once() {
        let ev = Event::new(Reset::Auto);
        ev.set();
        assert!(ev.wait_timeout(Duration::from_millis(10)).await);
        assert!(!ev.wait_timeout(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn wait_times_out_when_unset() {
        let ev = Event::new(Reset::Manual);
        assert!(!ev.wait_timeout(Duration::from_millis(5)).await);
    }
}
