//! Non-reentrant execution guard.
//!
//! The flag is set on [`ReentrancyGuard::enter`] and cleared when the returned
//! [`Entered`] token drops, on success and failure paths alike. Clones share
//! the same flag, so a collaborator handed a clone observes (and is refused by)
//! an in-flight guarded call.

use crate::error::GovernanceError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
pub struct ReentrancyGuard {
    entered: Arc<AtomicBool>,
}

/// Proof of being inside the guarded region. Leaving scope releases it.
#[must_use = "the guard is released as soon as this token is dropped"]
#[derive(Debug)]
pub struct Entered {
    entered: Arc<AtomicBool>,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> Result<Entered, GovernanceError> {
        self.entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| GovernanceError::Reentrancy)?;
        Ok(Entered {
            entered: Arc::clone(&self.entered),
        })
    }

    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

impl Drop for Entered {
    fn drop(&mut self) {
        self.entered.store(false, Ordering::Release);
    }
}
