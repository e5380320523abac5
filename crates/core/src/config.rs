//! Record store configuration
//!
//! A store is either unbounded or capped. A capped store carries a maximum
//! aggregate byte size and, optionally, a maximum record count; the oldest
//! (lowest-key) records are evicted to stay within both. Independently, a
//! store may be a log, keyed by the timestamps embedded in its payloads.
//!
//! Configurations can be written in TOML:
//!
//! ```toml
//! log_mode = true
//!
//! [capped]
//! max_size = 1048576
//! max_docs = 1000
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Bounds of a capped store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CappedConfig {
    /// Maximum aggregate record bytes. Must be positive.
    pub max_size: u64,
    /// Maximum record count. Must be positive when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_docs: Option<u64>,
}

/// Configuration of one record store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Key records by the logical timestamp in their payload
    #[serde(default)]
    pub log_mode: bool,
    /// Size/count bounds; `None` for an unbounded store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capped: Option<CappedConfig>,
}

impl StoreConfig {
    /// Unbounded, counter-keyed store
    pub fn uncapped() -> Self {
        StoreConfig::default()
    }

    /// Capped store with the given byte bound and optional count bound
    pub fn capped(max_size: u64, max_docs: Option<u64>) -> Self {
        StoreConfig {
            log_mode: false,
            capped: Some(CappedConfig { max_size, max_docs }),
        }
    }

    /// Unbounded log-mode store
    pub fn log() -> Self {
        StoreConfig {
            log_mode: true,
            capped: None,
        }
    }

    /// Set the log-mode flag
    pub fn with_log_mode(mut self, log_mode: bool) -> Self {
        self.log_mode = log_mode;
        self
    }

    /// True when bounds are configured
    pub fn is_capped(&self) -> bool {
        self.capped.is_some()
    }

    /// Check the bounds
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `max_size` is zero or `max_docs` is `Some(0)`.
    pub fn validate(&self) -> StoreResult<()> {
        if let Some(capped) = &self.capped {
            if capped.max_size == 0 {
                return Err(StoreError::invalid_config(
                    "capped max_size must be greater than zero",
                ));
            }
            if capped.max_docs == Some(0) {
                return Err(StoreError::invalid_config(
                    "capped max_docs must be greater than zero when set",
                ));
            }
        }
        Ok(())
    }

    /// Parse and validate a TOML configuration
    pub fn from_toml_str(content: &str) -> StoreResult<Self> {
        let config: StoreConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> StoreResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Returns the default config content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Record store configuration
#
# Key records by the logical timestamp in the first 8 bytes of each
# payload instead of by an internal counter (default: false).
log_mode = false

# Uncomment to bound the store. The oldest records are evicted to keep the
# aggregate size at or below max_size and the count at or below max_docs.
# [capped]
# max_size = 1048576
# max_docs = 1000               # optional
"#
    }
}
