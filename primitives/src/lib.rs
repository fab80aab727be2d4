//! Platform primitives: the leaf layer every other PAL crate builds on.
//!
//! Time, randomness, rundown protection, waitable events, per-processor
//! pools, intrusive-style lists, reference counts, and thread spawn with an
//! ideal-processor hint. Nothing here touches sockets or TLS; it exists so
//! the crates that do can share one vocabulary for "wait for this to
//! drain," "hand me a reusable buffer," and "pin this worker to a core."

pub mod error;
pub mod event;
pub mod list;
pub mod pool;
pub mod random;
pub mod refcount;
pub mod rundown;
pub mod thread;
pub mod time;

pub use error::{Error, Result};
pub use event::{Event, Reset};
pub use list::{List, Stack};
pub use pool::Pool;
pub use refcount::RefCount;
pub use rundown::{Rundown, RundownRef};
pub use thread::{spawn, ThreadConfig, ThreadFlags};
