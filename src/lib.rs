//! recstore - Transactional in-memory record store
//!
//! recstore keeps variable-length byte records under an ordered 64-bit key,
//! with transaction-scoped rollback, seekable cursors that survive lock
//! release, and capped collections that evict their oldest records.
//!
//! # Quick Start
//!
//! ```
//! use recstore::{RecordStore, SeekableRecordCursor, StoreConfig, TransactionManager};
//!
//! let manager = TransactionManager::new();
//! let store = RecordStore::new("db.events", StoreConfig::capped(100, None)).unwrap();
//!
//! let mut txn = manager.begin();
//! let first = store.insert_record(&mut txn, &[1u8; 60]).unwrap();
//! let second = store.insert_record(&mut txn, &[2u8; 60]).unwrap();
//! txn.commit().unwrap();
//!
//! // The second insert pushed the store over 100 bytes and evicted the first.
//! assert!(store.find_record(first).is_none());
//! let mut cursor = store.cursor();
//! assert_eq!(cursor.next().map(|r| r.id), Some(second));
//! assert!(cursor.next().is_none());
//! ```
//!
//! # Architecture
//!
//! - `recstore-core`: keys, records, log timestamps, errors, collaborator traits, configuration
//! - `recstore-storage`: shared state, undo log, record store, cursors, registry
//! - `recstore-concurrency`: transaction contexts and the transaction manager

pub use recstore_concurrency::{
    PendingChanges, TransactionContext, TransactionManager, TransactionStatus, TxnError,
};
pub use recstore_core::{
    CappedConfig, CappedEvictionCallback, DamageEvent, LogTimestamp, Record, RecordData, RecordId,
    StoreConfig, StoreError, StoreResult, UpdateNotifier, ValidateAdaptor,
    LOG_TIMESTAMP_PREFIX_LEN,
};
pub use recstore_storage::{
    Change, ChangeKind, CustomStats, ForwardCursor, RecordStore, RecoveryUnit, ReverseCursor,
    SeekableRecordCursor, SharedState, StoreRegistry, TouchStats, UndoLog, ValidateResults,
    RECORD_OVERHEAD_BYTES,
};
