//! Undo log entries
//!
//! Every mutation of a record store registers exactly one [`Change`] per
//! record it touches with the caller's [`RecoveryUnit`]. A change knows how
//! to reverse that single mutation. Commit is a no-op: a successful
//! mutation is already the new baseline. Abort replays the changes in
//! strict reverse registration order, because later mutations in the same
//! transaction may build on earlier ones (update then delete of one record).
//!
//! Rollback never fails: it only restores state that is known to have
//! existed.

use recstore_core::{RecordData, RecordId};
use tracing::trace;

use crate::state::{Records, SharedState};

/// Sink for undo entries: the transaction context seen by the store
pub trait RecoveryUnit {
    /// Append an undo entry for a mutation that has just been applied
    fn register_change(&mut self, change: Change);
}

/// What a change reverses
#[derive(Debug)]
pub enum ChangeKind {
    /// A record was inserted; rollback removes it if still present
    Insert {
        /// Id of the inserted record
        id: RecordId,
    },
    /// A record was removed or replaced; rollback reinstates the prior record
    Remove {
        /// Id of the affected record
        id: RecordId,
        /// Record as it was before the mutation
        record: RecordData,
    },
    /// The whole mapping was emptied; rollback swaps it back
    Truncate {
        /// Mapping captured at truncate time
        records: Records,
        /// Aggregate size captured at truncate time
        data_size: u64,
    },
}

/// One undo entry bound to the state block it reverses
#[derive(Debug)]
pub struct Change {
    state: SharedState,
    kind: ChangeKind,
}

impl Change {
    pub(crate) fn insert(state: &SharedState, id: RecordId) -> Self {
        Change {
            state: state.clone(),
            kind: ChangeKind::Insert { id },
        }
    }

    pub(crate) fn remove(state: &SharedState, id: RecordId, record: RecordData) -> Self {
        Change {
            state: state.clone(),
            kind: ChangeKind::Remove { id, record },
        }
    }

    /// Empty the live mapping into a new truncate entry
    ///
    /// Unlike the other variants, building a truncate change performs the
    /// truncate: the mapping and size are swapped out in one step.
    pub(crate) fn truncate(state: &SharedState) -> Self {
        let mut records = Records::new();
        let mut data_size = 0;
        state.write().swap_contents(&mut records, &mut data_size);
        Change {
            state: state.clone(),
            kind: ChangeKind::Truncate { records, data_size },
        }
    }

    /// The mutation this entry reverses
    pub fn kind(&self) -> &ChangeKind {
        &self.kind
    }

    /// Accept the mutation. Nothing to do.
    pub fn commit(self) {}

    /// Reverse the mutation
    pub fn rollback(self) {
        let mut data = self.state.write();
        match self.kind {
            ChangeKind::Insert { id } => {
                // A later delete in the same transaction may already have removed it.
                data.remove(id);
                trace!(target: "recstore::txn", %id, "Rolled back insert");
            }
            ChangeKind::Remove { id, record } => {
                data.put(id, record);
                trace!(target: "recstore::txn", %id, "Rolled back remove");
            }
            ChangeKind::Truncate {
                mut records,
                mut data_size,
            } => {
                data.swap_contents(&mut records, &mut data_size);
                trace!(target: "recstore::txn", "Rolled back truncate");
            }
        }
    }
}

/// Ordered list of undo entries
///
/// The building block of a transaction context: entries are appended as
/// mutations occur and either discarded on commit or replayed newest-first
/// on abort.
#[derive(Debug, Default)]
pub struct UndoLog {
    changes: Vec<Change>,
}

impl UndoLog {
    /// Create an empty undo log
    pub fn new() -> Self {
        UndoLog::default()
    }

    /// Number of registered entries
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Check whether no entries are registered
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Iterate entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }

    /// Discard every entry without reversing it
    pub fn commit(&mut self) {
        for change in self.changes.drain(..) {
            change.commit();
        }
    }

    /// Reverse every entry, newest first
    pub fn rollback(&mut self) {
        while let Some(change) = self.changes.pop() {
            change.rollback();
        }
    }
}

impl RecoveryUnit for UndoLog {
    fn register_change(&mut self, change: Change) {
        self.changes.push(change);
    }
}
