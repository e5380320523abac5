//! Key allocation and lookup for log-mode stores
//!
//! A log-mode store is a monotonic operation log: each record's key is the
//! logical timestamp carried in its payload, and every insert must carry a
//! timestamp strictly greater than the newest entry. Combined with capped
//! eviction of the lowest key, this yields a time-ordered ring buffer.

use std::ops::Bound;

use recstore_core::{LogTimestamp, RecordId, StoreError, StoreResult};

use crate::state::StoreData;

/// Derive the key of a log payload and check it extends the log
///
/// # Errors
///
/// Returns `BadValue` if the payload has no valid timestamp, or if the
/// timestamp is not strictly greater than the current highest key.
pub(crate) fn extract_and_check_log_key(data: &StoreData, payload: &[u8]) -> StoreResult<RecordId> {
    let id = LogTimestamp::extract(payload)?.to_record_id();
    if let Some(highest) = data.highest_id() {
        if id <= highest {
            return Err(StoreError::bad_value(format!(
                "ts not higher than highest: {} <= {}",
                LogTimestamp::from_record_id(id),
                LogTimestamp::from_record_id(highest)
            )));
        }
    }
    Ok(id)
}

/// Find where to start reading a log at or before `target`
///
/// Returns the greatest key `<= target`, the minimum key when `target`
/// precedes every entry, and `None` for an empty log.
pub(crate) fn log_start_key(data: &StoreData, target: RecordId) -> Option<RecordId> {
    data.records
        .range((Bound::Unbounded, Bound::Included(target)))
        .next_back()
        .map(|(id, _)| *id)
        .or_else(|| data.lowest_id())
}
