//! Reference counts with increment-nonzero semantics, distinct from `Arc`'s
//! "always succeeds" increment: acquiring a new reference to an object
//! already mid-teardown (count already at zero) must fail rather than
//! resurrect it.

use std::sync::atomic::{AtomicUsize, Ordering};

/// A refcount that can be incremented only while it is still above zero,
/// used for objects whose last `release` triggers destruction (so a racing
/// `add_ref` after that point must not hand out a reference to freed
/// state).
#[derive(Debug, Default)]
pub struct RefCount(AtomicUsize);

impl RefCount {
    /// Start the refcount at 1, representing the caller's own initial
    /// reference.
    pub fn new() -> Self {
        Self(AtomicUsize::new(1))
    }

    /// Try to take a new reference. Returns `false` if the count has
    /// already reached zero.
    pub fn add_ref(&self) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                if count == 0 {
                    None
                } else {
                    Some(count + 1)
                }
            })
            .is_ok()
    }

    /// Release a reference. Returns `true` exactly once, for the caller
    /// that drops the count to zero — that caller owns destruction.
    pub fn release(&self) -> bool {
        self.0.fetch_sub(1, Ordering::AcqRel) == 1
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_owner_releases_true_once() {
        let rc = RefCount::new();
        assert!(rc.release());
    }

    #[test]
    fn add_ref_after_zero_fails() {
        let rc = RefCount::new();
        assert!(rc.release());
        assert!(!rc.add_ref());
    }

    #[test]
    fn shared_refs_only_last_release_wins() {
        let rc = RefCount::new();
        assert!(rc.add_ref());
        assert!(!rc.release());
        assert!(rc.release());
    }
}
