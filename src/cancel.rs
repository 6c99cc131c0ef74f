//! Cooperative cancellation
//!
//! Long-running loops (envelope extraction, the autocorrelation lag scan,
//! timeline generation) check a shared token once per iteration, so
//! cancellation latency is bounded by one frame/lag/event of work. On
//! cancellation the call aborts with [`BeatcutError::Cancelled`] and partial
//! results are discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{BeatcutError, Result};

/// Cloneable cancellation token shared between a controller and workers.
///
/// Cancellation is one-way: once cancelled, a token stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. All clones observe the request.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Bail out with [`BeatcutError::Cancelled`] if cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(BeatcutError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_live_and_stays_cancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());

        token.cancel();
        assert!(token.is_cancelled());
        assert!(token.check().unwrap_err().is_cancelled());

        // clones share the same state
        let clone = token.clone();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn clones_propagate_cancellation() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
