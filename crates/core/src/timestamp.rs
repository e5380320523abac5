//! Logical timestamps for log-mode stores
//!
//! A log-mode store keys every record by the logical timestamp carried in
//! its payload instead of by an internal counter. The timestamp is a
//! `(secs, inc)` pair packed into a [`RecordId`] as `(secs << 32) | inc`, so
//! key order is timestamp order and the lowest key is always the oldest
//! entry.
//!
//! ## Payload format
//!
//! The first [`LOG_TIMESTAMP_PREFIX_LEN`] bytes of a log payload hold the
//! timestamp: `secs` then `inc`, each a big-endian `u32`. Everything after
//! the prefix is opaque to the store.
//!
//! ```
//! use recstore_core::{LogTimestamp, RecordId};
//!
//! let ts = LogTimestamp::new(5, 1);
//! let payload = ts.with_body(b"op");
//! assert_eq!(LogTimestamp::extract(&payload).unwrap(), ts);
//! assert_eq!(ts.to_record_id(), RecordId::new((5 << 32) | 1));
//! ```

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{StoreError, StoreResult};
use crate::types::RecordId;

/// Number of payload bytes holding the timestamp
pub const LOG_TIMESTAMP_PREFIX_LEN: usize = 8;

/// Largest accepted value for either half of a timestamp
const MAX_COMPONENT: u32 = i32::MAX as u32;

/// Logical `(secs, inc)` timestamp of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogTimestamp {
    secs: u32,
    inc: u32,
}

impl LogTimestamp {
    /// Create a timestamp
    pub const fn new(secs: u32, inc: u32) -> Self {
        LogTimestamp { secs, inc }
    }

    /// Seconds component
    pub const fn secs(self) -> u32 {
        self.secs
    }

    /// Increment component (orders entries within one second)
    pub const fn inc(self) -> u32 {
        self.inc
    }

    /// Pack into a record id
    pub const fn to_record_id(self) -> RecordId {
        RecordId::new(((self.secs as u64) << 32) | self.inc as u64)
    }

    /// Unpack from a record id
    pub const fn from_record_id(id: RecordId) -> Self {
        let raw = id.as_u64();
        LogTimestamp {
            secs: (raw >> 32) as u32,
            inc: raw as u32,
        }
    }

    /// Encode the payload prefix for this timestamp
    pub fn encode_prefix(self) -> [u8; LOG_TIMESTAMP_PREFIX_LEN] {
        let mut buf = [0u8; LOG_TIMESTAMP_PREFIX_LEN];
        BigEndian::write_u32(&mut buf[..4], self.secs);
        BigEndian::write_u32(&mut buf[4..], self.inc);
        buf
    }

    /// Build a complete log payload: timestamp prefix followed by `body`
    pub fn with_body(self, body: &[u8]) -> Vec<u8> {
        let mut payload = Vec::with_capacity(LOG_TIMESTAMP_PREFIX_LEN + body.len());
        payload.extend_from_slice(&self.encode_prefix());
        payload.extend_from_slice(body);
        payload
    }

    /// Parse and validate the timestamp prefix of a log payload
    ///
    /// # Errors
    ///
    /// Returns `BadValue` if the payload is shorter than the prefix, if
    /// either component exceeds `i32::MAX`, or for the null timestamp `(0, 0)`.
    pub fn extract(payload: &[u8]) -> StoreResult<Self> {
        if payload.len() < LOG_TIMESTAMP_PREFIX_LEN {
            return Err(StoreError::bad_value(format!(
                "log entry of {} bytes has no timestamp prefix",
                payload.len()
            )));
        }
        let secs = BigEndian::read_u32(&payload[..4]);
        let inc = BigEndian::read_u32(&payload[4..LOG_TIMESTAMP_PREFIX_LEN]);
        if secs > MAX_COMPONENT {
            return Err(StoreError::bad_value("ts secs too high"));
        }
        if inc > MAX_COMPONENT {
            return Err(StoreError::bad_value("ts inc too high"));
        }
        if secs == 0 && inc == 0 {
            return Err(StoreError::bad_value("null ts"));
        }
        Ok(LogTimestamp { secs, inc })
    }
}

impl fmt::Display for LogTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}, {})", self.secs, self.inc)
    }
}
