//! A per-processor free-list pool, avoiding cross-thread contention on the
//! common alloc/free path by giving each processor context its own
//! `Vec`-backed free list and only falling back to the global allocator
//! when that list is empty.

use std::sync::Mutex;

/// A pool of reusable `T` values. Cheap to construct one per
/// `ProcessorContext`; `get`/`put` are the hot path.
pub struct Pool<T> {
    free: Mutex<Vec<T>>,
    new: fn() -> T,
    reset: fn(&mut T),
}

impl<T> Pool<T> {
    /// `new` constructs a fresh value on a pool miss; `reset` restores a
    /// returned value to its initial state before it re-enters the free
    /// list.
    pub fn new(new: fn() -> T, reset: fn(&mut T)) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            new,
            reset,
        }
    }

    /// Take a value from the free list, or allocate a new one.
    pub fn get(&self) -> T {
        if let Some(value) = self.free.lock().unwrap().pop() {
            value
        } else {
            (self.new)()
        }
    }

    /// Reset and return a value to the free list.
    pub fn put(&self, mut value: T) {
        (self.reset)(&mut value);
        self.free.lock().unwrap().push(value);
    }

    /// Number of values currently sitting in the free list.
    pub fn free_count(&self) -> usize {
        self.free.lock().unwrap().len()
    }
}
