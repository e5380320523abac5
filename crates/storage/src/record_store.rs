//! RecordStore: transactional in-memory record store
//!
//! A `RecordStore` is one handle onto a collection's [`SharedState`]. It
//! implements record CRUD, capped eviction, validation, and statistics.
//! Every mutation registers its undo entries with the caller's
//! [`RecoveryUnit`] so that aborting the enclosing transaction restores
//! the exact prior mapping and size.
//!
//! # Design Notes
//!
//! - **No internal concurrency control**: the caller holds whatever
//!   exclusivity is needed around each mutating call.
//! - **Copy-on-write records**: updates build a new buffer and swap it in.
//! - **Capped eviction**: after any mutation that can grow the store, the
//!   lowest-key record is evicted until both bounds hold. An eviction veto
//!   stops the loop; records already evicted stay evicted.
//! - **Invariant violations panic**: updating or deleting a record the
//!   caller asserted exists is a defect, not a runtime condition.

use std::fmt;
use std::ops::Bound;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use recstore_core::{
    CappedConfig, CappedEvictionCallback, DamageEvent, RecordData, RecordId, StoreConfig,
    StoreError, StoreResult, UpdateNotifier, ValidateAdaptor,
};

use crate::change::{Change, RecoveryUnit};
use crate::cursor::{ForwardCursor, ReverseCursor, SeekableRecordCursor};
use crate::log_key;
use crate::state::{SharedState, StoreData};

/// Estimated bookkeeping bytes per record, used by `storage_size`
pub const RECORD_OVERHEAD_BYTES: u64 =
    (std::mem::size_of::<RecordId>() + std::mem::size_of::<RecordData>()) as u64;

/// Outcome of a validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResults {
    /// False if any record or store invariant failed
    pub valid: bool,
    /// One message per problem found
    pub errors: Vec<String>,
    /// Number of records in the store
    pub num_records: usize,
}

/// Store-specific statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomStats {
    /// True for a capped store
    pub capped: bool,
    /// Count bound of a capped store, `-1` when only the byte bound is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    /// Byte bound divided by the requested scale
    #[serde(rename = "maxSize", skip_serializing_if = "Option::is_none")]
    pub max_size: Option<f64>,
}

/// Result of a warmup request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchStats {
    /// Number of memory ranges touched
    #[serde(rename = "numRanges")]
    pub num_ranges: u32,
    /// Time spent
    pub millis: u64,
}

/// Handle onto one collection's records
pub struct RecordStore {
    ns: String,
    state: SharedState,
    capped: Option<CappedConfig>,
    capped_callback: Option<Arc<dyn CappedEvictionCallback>>,
}

impl RecordStore {
    /// Create a store over a fresh state block
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the capped bounds are invalid.
    pub fn new(ns: impl Into<String>, config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let state = SharedState::new(config.log_mode);
        Ok(Self::from_parts(ns.into(), state, config))
    }

    /// Create a store adopting an existing state block
    ///
    /// Used when a collection is reopened or renamed: the new handle sees
    /// the same records as every other handle on the block. The log-mode
    /// flag belongs to the block, so `config.log_mode` is ignored.
    pub fn with_shared_state(
        ns: impl Into<String>,
        state: SharedState,
        config: StoreConfig,
    ) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self::from_parts(ns.into(), state, config))
    }

    fn from_parts(ns: String, state: SharedState, config: StoreConfig) -> Self {
        RecordStore {
            ns,
            state,
            capped: config.capped,
            capped_callback: None,
        }
    }

    /// Install the eviction-notification collaborator
    pub fn set_capped_callback(&mut self, callback: Option<Arc<dyn CappedEvictionCallback>>) {
        self.capped_callback = callback;
    }

    /// Storage engine name
    pub fn name(&self) -> &'static str {
        "InMemory"
    }

    /// Namespace this handle was opened under
    pub fn ns(&self) -> &str {
        &self.ns
    }

    /// The shared state block, for handing to another handle
    pub fn shared_state(&self) -> SharedState {
        self.state.clone()
    }

    /// True for a capped store
    pub fn is_capped(&self) -> bool {
        self.capped.is_some()
    }

    /// True for a log-mode store
    pub fn is_log(&self) -> bool {
        self.state.is_log()
    }

    /// Byte bound of a capped store
    pub fn capped_max_size(&self) -> Option<u64> {
        self.capped.map(|c| c.max_size)
    }

    /// Count bound of a capped store
    pub fn capped_max_docs(&self) -> Option<u64> {
        self.capped.and_then(|c| c.max_docs)
    }

    /// Number of stored records
    pub fn num_records(&self) -> usize {
        self.state.num_records()
    }

    /// Sum of all record lengths
    pub fn data_size(&self) -> u64 {
        self.state.data_size()
    }

    /// Data size plus estimated per-record bookkeeping
    pub fn storage_size(&self) -> u64 {
        let data = self.state.read();
        data.data_size() + data.len() as u64 * RECORD_OVERHEAD_BYTES
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Look up a record. Absence is not an error.
    pub fn find_record(&self, id: RecordId) -> Option<RecordData> {
        self.state.read().records.get(&id).cloned()
    }

    /// Fetch a record the caller knows exists
    ///
    /// # Panics
    ///
    /// Panics if the record does not exist.
    pub fn data_for(&self, id: RecordId) -> RecordData {
        let data = self.state.read();
        self.record_for(&data, id).clone()
    }

    /// Cursor in ascending (`forward = true`) or descending key order
    pub fn get_cursor(&self, forward: bool) -> Box<dyn SeekableRecordCursor> {
        if forward {
            Box::new(self.cursor())
        } else {
            Box::new(self.reverse_cursor())
        }
    }

    /// Ascending cursor
    pub fn cursor(&self) -> ForwardCursor {
        ForwardCursor::new(self.state.clone(), self.is_capped())
    }

    /// Descending cursor
    pub fn reverse_cursor(&self) -> ReverseCursor {
        ReverseCursor::new(self.state.clone(), self.is_capped())
    }

    /// Where to start reading a log at or before `target`
    ///
    /// Returns the greatest id `<= target`, the lowest id if `target`
    /// precedes every entry, and `None` for an empty log. Always `None` on
    /// a store that is not in log mode.
    pub fn log_start_key(&self, target: RecordId) -> Option<RecordId> {
        let data = self.state.read();
        if !data.is_log() {
            return None;
        }
        log_key::log_start_key(&data, target)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Insert a record and return its id
    ///
    /// # Errors
    ///
    /// - `BadValue` if the payload exceeds a capped store's byte bound (no
    ///   eviction is attempted), or a log payload's timestamp is missing or
    ///   not greater than the newest entry. Nothing is mutated.
    /// - Any error from the eviction callback. The insert and the evictions
    ///   before the veto stay applied, with undo entries registered.
    pub fn insert_record(&self, rc: &mut dyn RecoveryUnit, payload: &[u8]) -> StoreResult<RecordId> {
        if let Some(capped) = &self.capped {
            if payload.len() as u64 > capped.max_size {
                warn!(
                    target: "recstore::store",
                    ns = %self.ns,
                    len = payload.len(),
                    max_size = capped.max_size,
                    "Rejected insert larger than capped max size"
                );
                return Err(StoreError::bad_value(
                    "object to insert exceeds cappedMaxSize",
                ));
            }
        }

        let id = {
            let mut data = self.state.write();
            let id = if data.is_log() {
                log_key::extract_and_check_log_key(&data, payload)?
            } else {
                data.allocate_id()
            };
            data.put(id, RecordData::copy_from_slice(payload));
            id
        };
        rc.register_change(Change::insert(&self.state, id));
        debug!(target: "recstore::store", ns = %self.ns, %id, len = payload.len(), "Record inserted");

        self.capped_delete_as_needed(rc)?;
        Ok(id)
    }

    /// Insert payloads in order, stopping at the first failure
    ///
    /// Records inserted before the failure stay applied and registered
    /// with `rc`; abort the transaction to discard them.
    pub fn insert_records<'a, I>(&self, rc: &mut dyn RecoveryUnit, payloads: I) -> StoreResult<Vec<RecordId>>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        payloads
            .into_iter()
            .map(|payload| self.insert_record(rc, payload))
            .collect()
    }

    /// Replace a record's payload
    ///
    /// # Errors
    ///
    /// - `CappedGrowth` if a capped record would grow. Nothing is mutated.
    /// - The notifier's error if it vetoes. Nothing is mutated.
    /// - Any error from the eviction callback (see [`RecordStore::insert_record`]).
    ///
    /// # Panics
    ///
    /// Panics if the record does not exist.
    pub fn update_record(
        &self,
        rc: &mut dyn RecoveryUnit,
        id: RecordId,
        payload: &[u8],
        notifier: Option<&dyn UpdateNotifier>,
    ) -> StoreResult<RecordId> {
        let old_len = {
            let data = self.state.read();
            self.record_for(&data, id).len()
        };

        if self.is_capped() && payload.len() > old_len {
            return Err(StoreError::CappedGrowth {
                id,
                old_len,
                new_len: payload.len(),
            });
        }

        if let Some(notifier) = notifier {
            notifier.going_to_update_in_place(id)?;
        }

        let old = self.replace_record(id, RecordData::copy_from_slice(payload));
        rc.register_change(Change::remove(&self.state, id, old));
        debug!(target: "recstore::store", ns = %self.ns, %id, old_len, new_len = payload.len(), "Record updated");

        self.capped_delete_as_needed(rc)?;
        Ok(id)
    }

    /// Apply byte patches to a record without changing its length
    ///
    /// Each [`DamageEvent`] copies `size` bytes from `damage_source` into
    /// the record. Returns the patched record.
    ///
    /// # Errors
    ///
    /// `InvalidPatch` if any event reads outside `damage_source` or writes
    /// outside the record. All events are checked before anything is mutated.
    ///
    /// # Panics
    ///
    /// Panics if the record does not exist.
    pub fn update_with_damages(
        &self,
        rc: &mut dyn RecoveryUnit,
        id: RecordId,
        damage_source: &[u8],
        damages: &[DamageEvent],
    ) -> StoreResult<RecordData> {
        let current = self.data_for(id);
        for (index, damage) in damages.iter().enumerate() {
            check_damage(index, damage, damage_source.len(), current.len())?;
        }

        let mut bytes = current.to_vec();
        for damage in damages {
            let source = &damage_source[damage.source_offset..damage.source_offset + damage.size];
            bytes[damage.target_offset..damage.target_offset + damage.size].copy_from_slice(source);
        }
        let patched = RecordData::new(bytes);

        let old = self.replace_record(id, patched.clone());
        rc.register_change(Change::remove(&self.state, id, old));
        debug!(target: "recstore::store", ns = %self.ns, %id, patches = damages.len(), "Record patched");

        self.capped_delete_as_needed(rc)?;
        Ok(patched)
    }

    /// Delete a record
    ///
    /// # Panics
    ///
    /// Panics if the record does not exist.
    pub fn delete_record(&self, rc: &mut dyn RecoveryUnit, id: RecordId) {
        let removed = self.state.write().remove(id);
        let Some(old) = removed else {
            self.missing_record(id)
        };
        rc.register_change(Change::remove(&self.state, id, old));
        debug!(target: "recstore::store", ns = %self.ns, %id, "Record deleted");
    }

    /// Remove every record under a single undo entry
    pub fn truncate(&self, rc: &mut dyn RecoveryUnit) {
        let change = Change::truncate(&self.state);
        rc.register_change(change);
        debug!(target: "recstore::store", ns = %self.ns, "Store truncated");
    }

    /// Remove every record after `end` (or from `end` on, when `inclusive`)
    ///
    /// Registers one undo entry per removed record. Used to roll a log back
    /// to a known point.
    pub fn capped_truncate_after(&self, rc: &mut dyn RecoveryUnit, end: RecordId, inclusive: bool) {
        let start = if inclusive {
            Bound::Included(end)
        } else {
            Bound::Excluded(end)
        };

        let removed: Vec<(RecordId, RecordData)> = {
            let mut data = self.state.write();
            let doomed: Vec<RecordId> = data
                .records
                .range((start, Bound::Unbounded))
                .map(|(id, _)| *id)
                .collect();
            doomed
                .into_iter()
                .filter_map(|id| data.remove(id).map(|record| (id, record)))
                .collect()
        };

        debug!(target: "recstore::store", ns = %self.ns, %end, inclusive, removed = removed.len(), "Truncated after");
        for (id, record) in removed {
            rc.register_change(Change::remove(&self.state, id, record));
        }
    }

    // ========================================================================
    // Validation and statistics
    // ========================================================================

    /// Check the store
    ///
    /// Always checks that the aggregate size matches the stored records.
    /// With `scan_data`, also runs `adaptor` over every record, collecting
    /// one error per bad record without stopping the scan.
    pub fn validate(&self, scan_data: bool, adaptor: &dyn ValidateAdaptor) -> ValidateResults {
        let mut results = ValidateResults {
            valid: true,
            ..Default::default()
        };

        let snapshot: Vec<(RecordId, RecordData)> = {
            let data = self.state.read();
            let computed = data.computed_data_size();
            if computed != data.data_size() {
                results.valid = false;
                results.errors.push(format!(
                    "data size {} does not match sum of record sizes {}",
                    data.data_size(),
                    computed
                ));
            }
            if scan_data {
                data.records.iter().map(|(id, r)| (*id, r.clone())).collect()
            } else {
                Vec::new()
            }
        };

        for (id, record) in &snapshot {
            if let Err(e) = adaptor.validate(*id, record) {
                warn!(target: "recstore::store", ns = %self.ns, %id, error = %e, "Invalid object detected");
                results.valid = false;
                results.errors.push(format!("invalid object detected at {}: {}", id, e));
            }
        }

        results.num_records = self.num_records();
        results
    }

    /// Store-specific statistics; the byte bound is divided by `scale`
    pub fn custom_stats(&self, scale: f64) -> CustomStats {
        CustomStats {
            capped: self.is_capped(),
            max: self
                .capped
                .map(|c| c.max_docs.map_or(-1, |docs| i64::try_from(docs).unwrap_or(i64::MAX))),
            max_size: self.capped_max_size().map(|size| size as f64 / scale),
        }
    }

    /// Warm the store into memory. Everything already is.
    pub fn touch(&self) -> TouchStats {
        TouchStats {
            num_ranges: 1,
            millis: 0,
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn record_for<'a>(&self, data: &'a StoreData, id: RecordId) -> &'a RecordData {
        match data.records.get(&id) {
            Some(record) => record,
            None => self.missing_record(id),
        }
    }

    fn replace_record(&self, id: RecordId, record: RecordData) -> RecordData {
        let previous = self.state.write().put(id, record);
        match previous {
            Some(old) => old,
            None => {
                // Undo the accidental insert before halting.
                self.state.write().remove(id);
                self.missing_record(id)
            }
        }
    }

    fn missing_record(&self, id: RecordId) -> ! {
        error!(target: "recstore::store", ns = %self.ns, %id, "Cannot find record");
        panic!("record store {} has no record for {}", self.ns, id);
    }

    fn capped_and_need_delete(&self, data: &StoreData) -> bool {
        match &self.capped {
            None => false,
            Some(capped) => {
                data.data_size() > capped.max_size
                    || capped
                        .max_docs
                        .map_or(false, |max_docs| data.len() as u64 > max_docs)
            }
        }
    }

    /// Evict lowest-key records until both bounds hold
    fn capped_delete_as_needed(&self, rc: &mut dyn RecoveryUnit) -> StoreResult<()> {
        loop {
            let (id, record) = {
                let data = self.state.read();
                if !self.capped_and_need_delete(&data) {
                    return Ok(());
                }
                match data.records.iter().next() {
                    Some((id, record)) => (*id, record.clone()),
                    None => {
                        error!(target: "recstore::store", ns = %self.ns, "Capped store over its bounds while empty");
                        panic!("capped store {} over its bounds while empty", self.ns);
                    }
                }
            };

            if let Some(callback) = &self.capped_callback {
                if let Err(e) = callback.about_to_delete_capped(id, &record) {
                    warn!(target: "recstore::store", ns = %self.ns, %id, error = %e, "Capped eviction vetoed");
                    return Err(e);
                }
            }

            // Another handle on the same block may have evicted it meanwhile.
            let Some(old) = self.state.write().remove(id) else {
                debug!(
                    target: "recstore::store",
                    ns = %self.ns,
                    %id,
                    "Notified eviction victim already removed by another handle"
                );
                continue;
            };
            debug!(target: "recstore::store", ns = %self.ns, %id, len = old.len(), "Evicting oldest record");
            rc.register_change(Change::remove(&self.state, id, old));
        }
    }
}

fn check_damage(
    index: usize,
    damage: &DamageEvent,
    source_len: usize,
    record_len: usize,
) -> StoreResult<()> {
    let source_end = damage.source_offset.checked_add(damage.size);
    if source_end.map_or(true, |end| end > source_len) {
        return Err(StoreError::InvalidPatch {
            index,
            reason: format!(
                "source range {}+{} exceeds damage source length {}",
                damage.source_offset, damage.size, source_len
            ),
        });
    }
    let target_end = damage.target_offset.checked_add(damage.size);
    if target_end.map_or(true, |end| end > record_len) {
        return Err(StoreError::InvalidPatch {
            index,
            reason: format!(
                "target range {}+{} exceeds record length {}",
                damage.target_offset, damage.size, record_len
            ),
        });
    }
    Ok(())
}

impl fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStore")
            .field("ns", &self.ns)
            .field("capped", &self.capped)
            .field("has_capped_callback", &self.capped_callback.is_some())
            .field("num_records", &self.num_records())
            .field("data_size", &self.data_size())
            .finish()
    }
}
