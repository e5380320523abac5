//! Transaction layer for recstore
//!
//! This crate provides the unit of work handed to record store mutations:
//! - TransactionContext: undo entry collection with commit/abort
//! - TransactionManager: transaction id allocation and scoped execution
//!
//! Mutations are applied in place; abort restores the prior state by
//! replaying undo entries newest-first.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod transaction;

pub use manager::TransactionManager;
pub use transaction::{PendingChanges, TransactionContext, TransactionStatus, TxnError};
