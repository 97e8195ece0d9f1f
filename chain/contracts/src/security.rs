//! Reentrancy protection for the ledger's mutating entry points
//!
//! The only place control leaves the ledger mid-call is the outbound value
//! transfer inside `withdraw`. The guard stays held across that transfer so a
//! nested `deposit` or `withdraw` is refused outright.

/// Non-reentrant "in-call" flag.
///
/// A mutating entry point acquires the guard before touching state and
/// releases it on every exit path. Any nested acquire fails.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyGuard {
    locked: bool,
}

impl ReentrancyGuard {
    /// Create a new unlocked guard.
    pub fn new() -> Self {
        Self { locked: false }
    }

    /// Acquire the guard. Returns `false` if a call is already in flight.
    pub fn acquire(&mut self) -> bool {
        if self.locked {
            return false;
        }
        self.locked = true;
        true
    }

    /// Release the guard.
    pub fn release(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}
