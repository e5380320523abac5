//! Storage layer for recstore
//!
//! This crate implements the transactional in-memory record store:
//! - SharedState: Reference-counted state block shared by every handle on a collection
//! - Change / UndoLog: Per-mutation undo entries, replayed newest-first on abort
//! - RecordStore: CRUD, capped eviction, validation, statistics
//! - ForwardCursor / ReverseCursor: Seekable cursors with save/restore
//! - Log-mode key allocation and start-key lookup
//! - StoreRegistry: Namespace → state block lifecycle

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod change;
pub mod cursor;
mod log_key;
pub mod record_store;
pub mod registry;
pub mod state;

pub use change::{Change, ChangeKind, RecoveryUnit, UndoLog};
pub use cursor::{ForwardCursor, ReverseCursor, SeekableRecordCursor};
pub use record_store::{CustomStats, RecordStore, TouchStats, ValidateResults, RECORD_OVERHEAD_BYTES};
pub use registry::StoreRegistry;
pub use state::{Records, SharedState};
