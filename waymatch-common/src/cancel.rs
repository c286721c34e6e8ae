//! Cooperative cancellation.
//!
//! The core is synchronous and single-threaded, but a long match over
//! thousands of observations must remain interruptible. Decoders poll a
//! [`CancelToken`] between observation steps and abort with
//! [`Error::Cancelled`](crate::Error::Cancelled) when it has tripped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Shared cancellation flag. Cloning is cheap; all clones observe the same
/// flag. A default-constructed token never trips unless `cancel()` is called.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the token. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Returns `Err(Cancelled)` once the token has tripped.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
