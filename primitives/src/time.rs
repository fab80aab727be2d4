//! Monotonic time in microseconds, from a steady clock.

use std::time::Instant;

/// A fixed epoch captured once per process so `now_us` is cheap and
/// monotonic for the lifetime of the program (mirrors a steady-clock
/// `CxPlatTimeUs64`-style counter).
static EPOCH: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Microseconds elapsed since an arbitrary, process-local epoch.
///
/// Only deltas between two calls are meaningful; the absolute value carries
/// no wall-clock significance.
pub fn now_us() -> u64 {
    let epoch = EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_micros() as u64
}

/// Microseconds between two `now_us()` readings, saturating at zero if
/// `earlier` is somehow later than `later` (clock readings never go
/// backwards within a process, but callers may pass them in either order).
pub fn diff_us(earlier: u64, later: u64) -> u64 {
    later.saturating_sub(earlier)
}
