//! Cooperative cancellation for in-flight git invocations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable cancellation flag, polled by the git driver before and during
/// every child-process invocation.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Register a Ctrl+C handler that trips the token.
///
/// An in-flight git child process is killed at the driver's next poll and the
/// current operation returns a cancelled `GitCommand` error. A partially
/// staged index is left as-is; the caller may `git reset` it.
pub fn register_ctrlc(token: &CancelToken) {
    let token = token.clone();
    let _ = ctrlc::set_handler(move || token.cancel());
}
