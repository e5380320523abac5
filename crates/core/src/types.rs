//! Record identifiers and payloads
//!
//! This module defines the fundamental types of the record store:
//! - RecordId: Totally ordered key addressing one record
//! - RecordData: Immutable, cheaply clonable byte buffer
//! - Record: A (RecordId, RecordData) pair handed out by cursors
//! - DamageEvent: One byte-range copy applied by a damage update

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Ordered identifier of a stored record
///
/// Ordinary stores allocate ids from a monotonically increasing counter
/// starting at 1. Log-mode stores derive the id from the logical timestamp
/// embedded in each payload (see [`crate::LogTimestamp`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(u64);

impl RecordId {
    /// Smallest representable id
    pub const MIN: RecordId = RecordId(0);

    /// Largest representable id. Never handed out by the id allocator.
    pub const MAX: RecordId = RecordId(u64::MAX);

    /// Create a record id from its raw value
    #[inline]
    pub const fn new(value: u64) -> Self {
        RecordId(value)
    }

    /// Raw value of this id
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        RecordId(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

/// Immutable record payload
///
/// Records are never mutated in place: an update builds a new buffer and
/// swaps it into the mapping. Cloning shares the underlying allocation, so
/// a clone handed to a caller is an independent value that no later store
/// mutation can observe or alter.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RecordData {
    bytes: Arc<[u8]>,
}

impl Default for RecordData {
    fn default() -> Self {
        RecordData::new(Vec::new())
    }
}

impl RecordData {
    /// Create a record from an owned buffer
    pub fn new(bytes: Vec<u8>) -> Self {
        RecordData {
            bytes: Arc::from(bytes),
        }
    }

    /// Copy a slice into a new record
    pub fn copy_from_slice(bytes: &[u8]) -> Self {
        RecordData {
            bytes: Arc::from(bytes),
        }
    }

    /// Length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check whether the payload is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrow the payload
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Deref for RecordData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for RecordData {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for RecordData {
    fn from(bytes: Vec<u8>) -> Self {
        RecordData::new(bytes)
    }
}

impl From<&[u8]> for RecordData {
    fn from(bytes: &[u8]) -> Self {
        RecordData::copy_from_slice(bytes)
    }
}

impl fmt::Debug for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 16;
        let shown = &self.bytes[..self.bytes.len().min(PREVIEW)];
        f.debug_struct("RecordData")
            .field("len", &self.bytes.len())
            .field("head", &shown)
            .finish()
    }
}

/// A record returned by a lookup or a cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Key of the record
    pub id: RecordId,
    /// Payload of the record
    pub data: RecordData,
}

impl Record {
    /// Create a new record
    pub fn new(id: RecordId, data: RecordData) -> Self {
        Record { id, data }
    }
}

/// One byte-range copy of a damage update
///
/// Copies `size` bytes from `source_offset` of the damage source buffer to
/// `target_offset` of the record. Damage updates never change the record's
/// length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEvent {
    /// Offset into the damage source buffer
    pub source_offset: usize,
    /// Offset into the record being patched
    pub target_offset: usize,
    /// Number of bytes to copy
    pub size: usize,
}

impl DamageEvent {
    /// Create a new damage event
    pub fn new(source_offset: usize, target_offset: usize, size: usize) -> Self {
        DamageEvent {
            source_offset,
            target_offset,
            size,
        }
    }
}
