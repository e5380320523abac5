//! Core types and traits for recstore
//!
//! This crate defines the foundational types shared by the storage and
//! concurrency layers:
//! - RecordId: Totally ordered 64-bit record key
//! - RecordData / Record: Immutable record payloads
//! - DamageEvent: Fixed-size byte patch for in-place updates
//! - LogTimestamp: Logical timestamp that keys log-mode stores
//! - StoreError: Error type hierarchy
//! - Traits: Collaborator contracts (update notification, capped eviction, validation)
//! - StoreConfig: Capped bounds and log-mode flag

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod timestamp;
pub mod traits;
pub mod types;

pub use config::{CappedConfig, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use timestamp::{LogTimestamp, LOG_TIMESTAMP_PREFIX_LEN};
pub use traits::{CappedEvictionCallback, UpdateNotifier, ValidateAdaptor};
pub use types::{DamageEvent, Record, RecordData, RecordId};
