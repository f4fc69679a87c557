//! Small helpers shared by every crate of the workspace.
//!
//! `block_on` drives a future to completion on the current thread. Futures doing real HTTP I/O
//! must be polled inside a tokio runtime.

use std::future::Future;
use std::time::{SystemTime, UNIX_EPOCH};

pub mod log {
    pub use log::{debug, error, info, log_enabled, trace, warn, Level};
}

pub fn block_on<F: Future>(f: F) -> F::Output { futures::executor::block_on(f) }

/// Milliseconds since the UNIX epoch. Returns 0 if the system clock is set before the epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
