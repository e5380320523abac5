//! Error types for recstore
//!
//! This module defines all error types used throughout the record store.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! ## Taxonomy
//!
//! - Value-range errors (`BadValue`): payload too large for a capped store,
//!   non-increasing or unparsable log timestamp. No mutation occurs.
//! - Structural-constraint errors (`CappedGrowth`): in-place growth of a
//!   capped record. No mutation occurs.
//! - Collaborator veto (`Vetoed`): an update or eviction notifier refused.
//! - Absence is never an error: lookups return `Option`.
//! - Invariant violations (update/delete of a missing record) are not
//!   represented here. They panic.

use crate::types::RecordId;
use thiserror::Error;

/// Result type alias for record store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Error types for the record store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Value outside the accepted range
    #[error("Bad value: {0}")]
    BadValue(String),

    /// Capped stores forbid a record from growing in place
    #[error("Failing update of {id}: objects in a capped store cannot grow ({old_len} -> {new_len} bytes)")]
    CappedGrowth {
        /// Record being updated
        id: RecordId,
        /// Current length in bytes
        old_len: usize,
        /// Requested length in bytes
        new_len: usize,
    },

    /// A notification collaborator refused the operation
    #[error("Operation vetoed: {reason}")]
    Vetoed {
        /// Reason given by the collaborator
        reason: String,
    },

    /// A damage event addresses bytes outside its source or target
    #[error("Invalid patch #{index}: {reason}")]
    InvalidPatch {
        /// Position of the offending event in the damage list
        index: usize,
        /// What is out of range
        reason: String,
    },

    /// Data corruption detected (reported by validation adaptors)
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Store configuration rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Namespace already registered
    #[error("Namespace already exists: {0}")]
    NamespaceExists(String),

    /// Namespace not registered
    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Create a value-range error
    pub fn bad_value(message: impl Into<String>) -> Self {
        StoreError::BadValue(message.into())
    }

    /// Create a collaborator veto
    pub fn vetoed(reason: impl Into<String>) -> Self {
        StoreError::Vetoed {
            reason: reason.into(),
        }
    }

    /// Create a corruption error
    pub fn corruption(message: impl Into<String>) -> Self {
        StoreError::Corruption(message.into())
    }

    /// Create a configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        StoreError::InvalidConfig(message.into())
    }

    /// True for value-range errors
    pub fn is_value_range(&self) -> bool {
        matches!(self, StoreError::BadValue(_))
    }

    /// True for collaborator vetoes
    pub fn is_veto(&self) -> bool {
        matches!(self, StoreError::Vetoed { .. })
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(e: toml::de::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<toml::ser::Error> for StoreError {
    fn from(e: toml::ser::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
