//! Collaborator contracts consumed by the record store
//!
//! The store calls out to three collaborators it does not own:
//! - `UpdateNotifier`: told before a record is replaced in place
//! - `CappedEvictionCallback`: told before a capped store evicts a record
//! - `ValidateAdaptor`: checks each record during a full validation pass
//!
//! Notifiers veto by returning an error, which the store surfaces unchanged.
//! Each trait is implemented for plain closures of the matching shape.

use crate::error::StoreResult;
use crate::types::{RecordData, RecordId};

/// Notified before a record is updated in place
///
/// The store has no per-record locks, so readers that cache record
/// positions learn about in-place updates through this hook. Returning an
/// error aborts the update before any mutation.
pub trait UpdateNotifier {
    /// Called with the id of the record about to be replaced
    fn going_to_update_in_place(&self, id: RecordId) -> StoreResult<()>;
}

impl<F> UpdateNotifier for F
where
    F: Fn(RecordId) -> StoreResult<()>,
{
    fn going_to_update_in_place(&self, id: RecordId) -> StoreResult<()> {
        self(id)
    }
}

/// Notified before each capped eviction
///
/// Returning an error stops the eviction loop. Records already evicted in
/// the same loop stay evicted; their undo entries are registered with the
/// transaction that triggered the eviction.
pub trait CappedEvictionCallback: Send + Sync {
    /// Called with the record about to be evicted
    fn about_to_delete_capped(&self, id: RecordId, data: &RecordData) -> StoreResult<()>;
}

impl<F> CappedEvictionCallback for F
where
    F: Fn(RecordId, &RecordData) -> StoreResult<()> + Send + Sync,
{
    fn about_to_delete_capped(&self, id: RecordId, data: &RecordData) -> StoreResult<()> {
        self(id, data)
    }
}

/// Per-record checker for a full validation pass
pub trait ValidateAdaptor {
    /// Validate one record, returning its computed size or a corruption error
    fn validate(&self, id: RecordId, data: &RecordData) -> StoreResult<usize>;
}

impl<F> ValidateAdaptor for F
where
    F: Fn(RecordId, &RecordData) -> StoreResult<usize>,
{
    fn validate(&self, id: RecordId, data: &RecordData) -> StoreResult<usize> {
        self(id, data)
    }
}
