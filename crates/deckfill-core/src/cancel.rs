//! Cooperative cancellation between remote calls

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{PopulateError, Result, Step};

/// Shared flag that stops a run before its next remote call
///
/// Calls already in flight complete; whatever they applied stays applied.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Fail with [`PopulateError::Cancelled`] if cancellation was requested
    /// before `step`
    pub fn ensure_not_cancelled(&self, step: Step) -> Result<()> {
        if self.is_cancelled() {
            tracing::info!(step = step.as_str(), "run cancelled");
            return Err(PopulateError::Cancelled { step });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        assert!(!other.is_cancelled());
        flag.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn test_ensure_not_cancelled_names_step() {
        let flag = CancelFlag::new();
        assert!(flag.ensure_not_cancelled(Step::Copy).is_ok());
        flag.cancel();
        assert!(matches!(
            flag.ensure_not_cancelled(Step::Move),
            Err(PopulateError::Cancelled { step: Step::Move })
        ));
    }
}
