//! Shared state block of one collection
//!
//! `StoreData` holds the ordered id → record mapping, the aggregate byte
//! size, the next-id counter, and the log-mode flag. Exactly one block
//! exists per logical collection; every `RecordStore` handle and cursor
//! referencing the collection holds a `SharedState` clone, and the block
//! lives as long as the longest holder.
//!
//! # Locking
//!
//! The block sits behind a `parking_lot::RwLock` so it can be shared
//! soundly across threads. The lock is held only for the duration of one
//! store call and never across a collaborator callback. It does not make
//! sequences of calls atomic: the caller's external exclusivity guarantee
//! is what serializes writers.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use recstore_core::{RecordData, RecordId};

/// The ordered record mapping
pub type Records = BTreeMap<RecordId, RecordData>;

/// Contents of the shared state block
#[derive(Debug)]
pub struct StoreData {
    pub(crate) records: Records,
    pub(crate) data_size: u64,
    next_id: u64,
    is_log: bool,
}

impl StoreData {
    fn new(is_log: bool) -> Self {
        StoreData {
            records: Records::new(),
            data_size: 0,
            next_id: 1,
            is_log,
        }
    }

    /// Number of stored records
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether no records are stored
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all record lengths
    #[inline]
    pub fn data_size(&self) -> u64 {
        self.data_size
    }

    /// True for a log-mode collection
    #[inline]
    pub fn is_log(&self) -> bool {
        self.is_log
    }

    /// Lowest stored id
    pub fn lowest_id(&self) -> Option<RecordId> {
        self.records.keys().next().copied()
    }

    /// Highest stored id
    pub fn highest_id(&self) -> Option<RecordId> {
        self.records.keys().next_back().copied()
    }

    /// Allocate the next counter id
    ///
    /// Ids are never reused, even after the record is deleted or the
    /// inserting transaction aborts.
    pub(crate) fn allocate_id(&mut self) -> RecordId {
        let id = RecordId::new(self.next_id);
        assert!(id < RecordId::MAX, "record id space exhausted");
        self.next_id += 1;
        id
    }

    /// Insert or replace a record, keeping `data_size` in step
    ///
    /// Returns the record previously stored under `id`.
    pub(crate) fn put(&mut self, id: RecordId, record: RecordData) -> Option<RecordData> {
        self.data_size += record.len() as u64;
        let previous = self.records.insert(id, record);
        if let Some(prev) = &previous {
            self.data_size -= prev.len() as u64;
        }
        previous
    }

    /// Remove a record, keeping `data_size` in step
    pub(crate) fn remove(&mut self, id: RecordId) -> Option<RecordData> {
        let removed = self.records.remove(&id);
        if let Some(record) = &removed {
            self.data_size -= record.len() as u64;
        }
        removed
    }

    /// Exchange the mapping and size with the given ones in a single step
    pub(crate) fn swap_contents(&mut self, records: &mut Records, data_size: &mut u64) {
        std::mem::swap(&mut self.records, records);
        std::mem::swap(&mut self.data_size, data_size);
    }

    /// Recompute the aggregate size from scratch
    pub(crate) fn computed_data_size(&self) -> u64 {
        self.records.values().map(|r| r.len() as u64).sum()
    }
}

/// Reference-counted handle to one collection's state block
#[derive(Debug, Clone)]
pub struct SharedState {
    inner: Arc<RwLock<StoreData>>,
}

impl SharedState {
    /// Create an empty state block
    pub fn new(is_log: bool) -> Self {
        SharedState {
            inner: Arc::new(RwLock::new(StoreData::new(is_log))),
        }
    }

    #[inline]
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, StoreData> {
        self.inner.read()
    }

    #[inline]
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, StoreData> {
        self.inner.write()
    }

    /// Number of handles, cursors, and undo entries referencing this block
    pub fn holder_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// True when both handles reference the same block
    pub fn ptr_eq(&self, other: &SharedState) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of stored records
    pub fn num_records(&self) -> usize {
        self.read().len()
    }

    /// Sum of all record lengths
    pub fn data_size(&self) -> u64 {
        self.read().data_size()
    }

    /// True for a log-mode collection
    pub fn is_log(&self) -> bool {
        self.read().is_log()
    }

    /// Ids currently stored, in key order
    pub fn ids(&self) -> Vec<RecordId> {
        self.read().records.keys().copied().collect()
    }
}
