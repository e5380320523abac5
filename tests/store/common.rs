//! Shared helpers for the store test suite.

#![allow(dead_code)]

use std::sync::Once;

pub use recstore::{
    DamageEvent, LogTimestamp, RecordId, RecordStore, SeekableRecordCursor, StoreConfig,
    StoreError, StoreRegistry, TransactionManager,
};

static INIT_TRACING: Once = Once::new();

/// Install a test subscriber once; output shows with `--nocapture`.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// A store plus the manager that scopes its transactions
pub struct TestStore {
    pub manager: TransactionManager,
    pub store: RecordStore,
}

impl TestStore {
    pub fn new(ns: &str, config: StoreConfig) -> Self {
        init_tracing();
        TestStore {
            manager: TransactionManager::new(),
            store: RecordStore::new(ns, config).unwrap(),
        }
    }

    pub fn uncapped() -> Self {
        Self::new("test.uncapped", StoreConfig::uncapped())
    }

    pub fn capped(max_size: u64, max_docs: Option<u64>) -> Self {
        Self::new("test.capped", StoreConfig::capped(max_size, max_docs))
    }

    pub fn log() -> Self {
        Self::new("local.oplog", StoreConfig::log())
    }

    /// Insert and commit one payload
    pub fn insert(&self, payload: &[u8]) -> Result<RecordId, StoreError> {
        self.manager.run(|txn| self.store.insert_record(txn, payload))
    }

    /// Insert and commit several payloads, returning their ids
    pub fn insert_all<P: AsRef<[u8]>>(&self, payloads: &[P]) -> Vec<RecordId> {
        payloads.iter().map(|p| self.insert(p.as_ref()).unwrap()).collect()
    }

    /// Delete and commit one record
    pub fn delete(&self, id: RecordId) {
        let mut txn = self.manager.begin();
        self.store.delete_record(&mut txn, id);
        txn.commit().unwrap();
    }

    pub fn ids(&self) -> Vec<RecordId> {
        drain(&mut self.store.cursor())
    }
}

/// Ids remaining in a cursor's sequence
pub fn drain(cursor: &mut dyn SeekableRecordCursor) -> Vec<RecordId> {
    let mut ids = Vec::new();
    while let Some(record) = cursor.next() {
        ids.push(record.id);
    }
    ids
}

/// Payload of `len` bytes filled with `fill`
pub fn bytes(len: usize, fill: u8) -> Vec<u8> {
    vec![fill; len]
}

/// Log payload keyed by `(secs, inc)`
pub fn log_entry(secs: u32, inc: u32) -> Vec<u8> {
    LogTimestamp::new(secs, inc).with_body(format!("op {}:{}", secs, inc).as_bytes())
}

pub fn ts(secs: u32, inc: u32) -> RecordId {
    LogTimestamp::new(secs, inc).to_record_id()
}
