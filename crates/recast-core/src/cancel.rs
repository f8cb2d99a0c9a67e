use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Cooperative cancellation for long-running refactoring phases.
///
/// Cancellation is polled at per-file and per-occurrence boundaries, never
/// preemptively. A run observed as cancelled produces zero edits.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("operation cancelled")]
pub struct Cancelled;

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Returns `Err(Cancelled)` if the token has been cancelled.
    pub fn checkpoint(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_reports_cancellation() {
        let token = CancellationToken::new();
        assert!(token.checkpoint().is_ok());
        token.cancel();
        assert_eq!(token.checkpoint(), Err(Cancelled));
    }
}
