//! Namespace registry of shared state blocks
//!
//! The registry owns the lifecycle of each collection's [`SharedState`]:
//! the block is created on first open, adopted by every later open of the
//! same namespace, moved on rename, and forgotten on drop. A dropped
//! block is freed once the last store handle, cursor, or undo entry
//! referencing it goes away.
//!
//! ## Usage
//!
//! ```
//! use recstore_core::StoreConfig;
//! use recstore_storage::StoreRegistry;
//!
//! let registry = StoreRegistry::new();
//! let a = registry.open("db.events", StoreConfig::uncapped()).unwrap();
//! registry.rename("db.events", "db.archive").unwrap();
//! let b = registry.open("db.archive", StoreConfig::uncapped()).unwrap();
//! assert!(a.shared_state().ptr_eq(&b.shared_state()));
//! ```

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::info;

use recstore_core::{StoreConfig, StoreError, StoreResult};

use crate::record_store::RecordStore;
use crate::state::SharedState;

#[derive(Debug, Clone)]
struct RegistryEntry {
    config: StoreConfig,
    state: SharedState,
}

/// Concurrent map from namespace to state block
#[derive(Debug, Default)]
pub struct StoreRegistry {
    entries: DashMap<String, RegistryEntry>,
}

impl StoreRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        StoreRegistry::default()
    }

    /// Open a handle on `ns`, creating the collection on first open
    ///
    /// On reopen the stored configuration wins and `config` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a new collection's configuration is invalid.
    pub fn open(&self, ns: &str, config: StoreConfig) -> StoreResult<RecordStore> {
        let entry = match self.entries.entry(ns.to_string()) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(vacant) => {
                config.validate()?;
                let entry = RegistryEntry {
                    state: SharedState::new(config.log_mode),
                    config,
                };
                vacant.insert(entry.clone());
                info!(
                    target: "recstore::registry",
                    ns,
                    capped = entry.config.is_capped(),
                    log_mode = entry.config.log_mode,
                    "Collection created"
                );
                entry
            }
        };
        RecordStore::with_shared_state(ns, entry.state, entry.config)
    }

    /// Move a collection to a new namespace
    ///
    /// Handles opened under the old name keep operating on the same block.
    ///
    /// # Errors
    ///
    /// - `NamespaceNotFound` if `from` is not registered
    /// - `NamespaceExists` if `to` is already registered
    pub fn rename(&self, from: &str, to: &str) -> StoreResult<()> {
        if self.entries.contains_key(to) {
            return Err(StoreError::NamespaceExists(to.to_string()));
        }
        let (_, entry) = self
            .entries
            .remove(from)
            .ok_or_else(|| StoreError::NamespaceNotFound(from.to_string()))?;

        let displaced = match self.entries.entry(to.to_string()) {
            Entry::Occupied(_) => Some(entry),
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                None
            }
        };
        if let Some(entry) = displaced {
            // Lost a race for `to`; put the collection back.
            self.entries.insert(from.to_string(), entry);
            return Err(StoreError::NamespaceExists(to.to_string()));
        }

        info!(target: "recstore::registry", from, to, "Collection renamed");
        Ok(())
    }

    /// Forget a collection
    ///
    /// # Errors
    ///
    /// Returns `NamespaceNotFound` if `ns` is not registered.
    pub fn drop_namespace(&self, ns: &str) -> StoreResult<()> {
        let (_, entry) = self
            .entries
            .remove(ns)
            .ok_or_else(|| StoreError::NamespaceNotFound(ns.to_string()))?;
        info!(
            target: "recstore::registry",
            ns,
            remaining_holders = entry.state.holder_count() - 1,
            "Collection dropped"
        );
        Ok(())
    }

    /// State block registered under `ns`
    pub fn shared_state(&self, ns: &str) -> Option<SharedState> {
        self.entries.get(ns).map(|entry| entry.state.clone())
    }

    /// Check whether `ns` is registered
    pub fn contains(&self, ns: &str) -> bool {
        self.entries.contains_key(ns)
    }

    /// Number of registered collections
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether no collections are registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered namespaces, sorted
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}
