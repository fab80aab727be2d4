//! Thread creation with an ideal-processor hint, mirroring the platform's
//! `{flags, ideal processor, name, entry, arg}` thread-create contract.
//!
//! Pinning is best-effort: `core_affinity` enumerates the cores available to
//! this process and a failure to pin (core already gone, platform doesn't
//! support it) is logged and otherwise ignored, since an unpinned worker
//! thread is still correct, just not NUMA-optimal.

use core_affinity::CoreId;

/// Thread creation flags. `HIGH_PRIORITY` is advisory — see [`spawn`]'s doc
/// comment. A plain bitset rather than a `bitflags` enum since the platform
/// only ever defines this one bit today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThreadFlags(u32);

impl ThreadFlags {
    pub const NONE: Self = Self(0);
    pub const HIGH_PRIORITY: Self = Self(1 << 0);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ThreadFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Parameters for [`spawn`], mirroring the platform thread-create config.
pub struct ThreadConfig<F> {
    pub flags: ThreadFlags,
    pub ideal_processor: Option<usize>,
    pub name: String,
    pub entry: F,
}

/// Spawn an OS thread, naming it and attempting to pin it to
/// `ideal_processor`. `HIGH_PRIORITY` is recorded but not acted on: Rust's
/// std thread API has no portable priority knob, and reaching for
/// platform-specific priority syscalls isn't justified for a hint that
/// only affects scheduling fairness, not correctness.
pub fn spawn<F>(config: ThreadConfig<F>) -> std::io::Result<std::thread::JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    let ThreadConfig {
        flags,
        ideal_processor,
        name,
        entry,
    } = config;
    let pin_name = name.clone();
    std::thread::Builder::new().name(name).spawn(move || {
        if let Some(id) = ideal_processor {
            if !core_affinity::set_for_current(CoreId { id }) {
                tracing::debug!(thread = %pin_name, core = id, "failed to pin thread to ideal processor");
            }
        }
        if flags.contains(ThreadFlags::HIGH_PRIORITY) {
            tracing::trace!(thread = %pin_name, "high priority requested (advisory only)");
        }
        entry();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn spawned_thread_runs_entry() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran2 = ran.clone();
        let handle = spawn(ThreadConfig {
            flags: ThreadFlags::NONE,
            ideal_processor: None,
            name: "pal-test-worker".into(),
            entry: move || ran2.store(true, Ordering::SeqCst),
        })
        .unwrap();
        handle.join().unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn pin_to_out_of_range_core_does_not_panic() {
        let handle = spawn(ThreadConfig {
            flags: ThreadFlags::NONE,
            ideal_processor: Some(usize::MAX / 2),
            name: "pal-test-pin".into(),
            entry: || {},
        })
        .unwrap();
        handle.join().unwrap();
    }
}
