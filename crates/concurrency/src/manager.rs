//! Transaction manager for allocating and scoping transactions
//!
//! The manager hands out transaction ids from a monotonic counter and
//! offers a closure-scoped helper that commits on success and aborts on
//! error, so callers cannot forget to finish a unit of work.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::TransactionContext;

/// Allocates transaction contexts with unique ids
#[derive(Debug)]
pub struct TransactionManager {
    /// Next transaction ID
    ///
    /// Monotonically increasing; ids are never reused.
    next_txn_id: AtomicU64,
}

impl TransactionManager {
    /// Create a manager whose first transaction gets id 1
    pub fn new() -> Self {
        Self::with_txn_id(0)
    }

    /// Create a manager that continues after `max_txn_id`
    pub fn with_txn_id(max_txn_id: u64) -> Self {
        TransactionManager {
            next_txn_id: AtomicU64::new(max_txn_id + 1),
        }
    }

    /// Allocate next transaction ID
    pub fn next_txn_id(&self) -> u64 {
        self.next_txn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Begin a new active transaction
    pub fn begin(&self) -> TransactionContext {
        TransactionContext::new(self.next_txn_id())
    }

    /// Run `f` inside a transaction
    ///
    /// Commits when `f` returns `Ok`, aborts when it returns `Err`. The
    /// error from `f` is returned unchanged.
    pub fn run<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut TransactionContext) -> Result<T, E>,
    {
        let mut txn = self.begin();
        match f(&mut txn) {
            Ok(value) => {
                // `f` may have finished the context itself.
                if txn.is_active() {
                    let _ = txn.commit();
                }
                Ok(value)
            }
            Err(e) => {
                if txn.is_active() {
                    let _ = txn.abort();
                }
                Err(e)
            }
        }
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}
