//! Transaction context for undo-log rollback
//!
//! This module implements the per-transaction context handed to the record
//! store. TransactionContext collects the undo entries registered by each
//! mutation; commit discards them, abort replays them newest-first.
//!
//! Mutations are applied to the store immediately. There is no buffering
//! and no validation step: a transaction's only job is to be able to put
//! store-local state back exactly as it was.

use std::time::{Duration, Instant};

use recstore_storage::{Change, ChangeKind, RecoveryUnit, UndoLog};
use thiserror::Error;
use tracing::{info, warn};

/// Errors from transaction state transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxnError {
    /// Commit or abort attempted on a finished transaction
    #[error("Invalid state: transaction {txn_id} is {status:?}, expected Active")]
    InvalidState {
        /// Transaction id
        txn_id: u64,
        /// State the transaction is in
        status: TransactionStatus,
    },
}

/// Status of a transaction in its lifecycle
///
/// State transitions:
/// - `Active` → `Committed` (commit)
/// - `Active` → `Aborted` (abort, or drop while active)
///
/// Terminal states (no transitions allowed):
/// - `Committed`
/// - `Aborted`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Transaction is executing and accepts undo entries
    Active,
    /// Transaction committed; its mutations stand
    Committed,
    /// Transaction aborted; its mutations were reversed
    Aborted,
}

/// Summary of undo entries that an abort would replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingChanges {
    /// Insert undo entries
    pub inserts: usize,
    /// Remove undo entries (deletes, updates, evictions)
    pub removes: usize,
    /// Truncate undo entries
    pub truncates: usize,
}

impl PendingChanges {
    /// Total number of pending entries
    pub fn total(&self) -> usize {
        self.inserts + self.removes + self.truncates
    }

    /// Check if there are no pending entries
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Transaction context with an undo log
///
/// # Lifecycle
///
/// 1. **BEGIN**: Create with `new()` or `TransactionManager::begin()`, status is `Active`
/// 2. **MUTATE**: Pass `&mut ctx` to record store operations
/// 3. **COMMIT/ABORT**: Call `commit()` or `abort()`
///
/// Dropping a context that is still `Active` aborts it.
#[derive(Debug)]
pub struct TransactionContext {
    txn_id: u64,
    status: TransactionStatus,
    undo: UndoLog,
    start_time: Instant,
}

impl TransactionContext {
    /// Create an active transaction
    pub fn new(txn_id: u64) -> Self {
        TransactionContext {
            txn_id,
            status: TransactionStatus::Active,
            undo: UndoLog::new(),
            start_time: Instant::now(),
        }
    }

    /// Unique transaction ID
    pub fn txn_id(&self) -> u64 {
        self.txn_id
    }

    /// Current status
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Check if transaction is in Active state
    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    /// Check if transaction is committed
    pub fn is_committed(&self) -> bool {
        self.status == TransactionStatus::Committed
    }

    /// Check if transaction is aborted
    pub fn is_aborted(&self) -> bool {
        self.status == TransactionStatus::Aborted
    }

    /// Get the elapsed time since transaction started
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Number of registered undo entries
    pub fn change_count(&self) -> usize {
        self.undo.len()
    }

    /// Get summary of pending undo entries
    pub fn pending_changes(&self) -> PendingChanges {
        let mut pending = PendingChanges::default();
        for change in self.undo.iter() {
            match change.kind() {
                ChangeKind::Insert { .. } => pending.inserts += 1,
                ChangeKind::Remove { .. } => pending.removes += 1,
                ChangeKind::Truncate { .. } => pending.truncates += 1,
            }
        }
        pending
    }

    /// Check if transaction can accept changes
    ///
    /// # Errors
    /// Returns `TxnError::InvalidState` if transaction is not `Active`.
    pub fn ensure_active(&self) -> Result<(), TxnError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(TxnError::InvalidState {
                txn_id: self.txn_id,
                status: self.status,
            })
        }
    }

    /// Commit: the applied mutations become the new baseline
    ///
    /// # Errors
    /// Returns `TxnError::InvalidState` if not `Active`.
    pub fn commit(&mut self) -> Result<(), TxnError> {
        self.ensure_active()?;
        let changes = self.undo.len();
        self.undo.commit();
        self.status = TransactionStatus::Committed;
        info!(target: "recstore::txn", txn_id = self.txn_id, changes, "Transaction committed");
        Ok(())
    }

    /// Abort: reverse every registered mutation, newest first
    ///
    /// # Errors
    /// Returns `TxnError::InvalidState` if not `Active`.
    pub fn abort(&mut self) -> Result<(), TxnError> {
        self.ensure_active()?;
        let changes = self.undo.len();
        self.undo.rollback();
        self.status = TransactionStatus::Aborted;
        info!(target: "recstore::txn", txn_id = self.txn_id, changes, "Transaction aborted");
        Ok(())
    }
}

impl RecoveryUnit for TransactionContext {
    fn register_change(&mut self, change: Change) {
        if !self.is_active() {
            tracing::error!(
                target: "recstore::txn",
                txn_id = self.txn_id,
                status = ?self.status,
                "Change registered with finished transaction"
            );
            panic!(
                "transaction {} received a change while {:?}",
                self.txn_id, self.status
            );
        }
        self.undo.register_change(change);
    }
}

impl Drop for TransactionContext {
    fn drop(&mut self) {
        if self.is_active() && !self.undo.is_empty() {
            warn!(
                target: "recstore::txn",
                txn_id = self.txn_id,
                changes = self.undo.len(),
                "Active transaction dropped, rolling back"
            );
            self.undo.rollback();
            self.status = TransactionStatus::Aborted;
        }
    }
}
