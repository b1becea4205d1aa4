//! Nullable block height: a chain tip that only moves when told to.

use std::cell::Cell;

/// A deterministic block height for testing.
///
/// Height only advances when you tell it to.
pub struct NullBlockHeight {
    current: Cell<i64>,
}

impl NullBlockHeight {
    pub fn new(initial: i64) -> Self {
        Self {
            current: Cell::new(initial),
        }
    }

    /// Get the current height.
    pub fn now(&self) -> i64 {
        self.current.get()
    }

    /// Advance by a number of blocks, returning the new height.
    pub fn advance(&self, blocks: i64) -> i64 {
        self.current.set(self.current.get() + blocks);
        self.current.get()
    }

    /// Set the height to a specific value.
    pub fn set(&self, height: i64) {
        self.current.set(height);
    }
}

impl Default for NullBlockHeight {
    fn default() -> Self {
        Self::new(1)
    }
}
