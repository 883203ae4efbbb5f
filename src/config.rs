// In: src/config.rs

//! The single source of truth for bulkrow pipeline configuration and the
//! opaque key-value documents exchanged across the plugin transaction protocol.
//!
//! `PageBuilderConfig` is created once at the application boundary and passed
//! down read-only. The document types (`ConfigSource`, `TaskSource`,
//! `ConfigDiff`, `TaskReport`) are deliberately schemaless: their validation
//! and file/CLI loading belong to the host, not to this crate.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

//==================================================================================
// I. Page Builder Tuning
//==================================================================================

/// Tuning knobs for `PageBuilder`. The flush threshold is advisory: it only
/// decides when a committed batch is handed downstream, never whether a
/// record is accepted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PageBuilderConfig {
    /// Capacity requested from the allocator for each fresh page buffer.
    #[serde(default = "default_page_allocation_bytes")]
    pub page_allocation_bytes: usize,

    /// Approximate accumulated size at which the builder eagerly flushes.
    /// Checked only after `add_record()`, so a single oversized record is
    /// still committed in full.
    #[serde(default = "default_flush_threshold_bytes")]
    pub flush_threshold_bytes: usize,
}

impl Default for PageBuilderConfig {
    fn default() -> Self {
        Self {
            page_allocation_bytes: default_page_allocation_bytes(),
            flush_threshold_bytes: default_flush_threshold_bytes(),
        }
    }
}

/// Helper for `serde` to provide a default for `page_allocation_bytes`.
fn default_page_allocation_bytes() -> usize {
    32 * 1024
}

/// Helper for `serde` to provide a default for `flush_threshold_bytes`.
fn default_flush_threshold_bytes() -> usize {
    32 * 1024
}

//==================================================================================
// II. Opaque Protocol Documents
//==================================================================================

macro_rules! opaque_document {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
        #[serde(transparent)]
        pub struct $name(Map<String, Value>);

        impl $name {
            pub fn new() -> Self {
                Self(Map::new())
            }

            pub fn get(&self, key: &str) -> Option<&Value> {
                self.0.get(key)
            }

            /// Inserts `value` under `key`, replacing any prior value.
            pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
                self.0.insert(key.into(), value.into());
                self
            }

            /// Shallow-merges `other` into `self`; keys in `other` win.
            pub fn merge(&mut self, other: &$name) {
                for (key, value) in &other.0 {
                    self.0.insert(key.clone(), value.clone());
                }
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }
    };
}

opaque_document! {
    /// Raw configuration for a transaction, given from the user.
    ConfigSource
}

opaque_document! {
    /// Resolved, immutable configuration handed to one parallel task.
    TaskSource
}

opaque_document! {
    /// Incremental state to be merged into the next scheduled run's config.
    ConfigDiff
}

opaque_document! {
    /// What one parallel task accomplished; absence of a report is failure.
    TaskReport
}

impl TaskSource {
    /// Derives the per-task resolved configuration from a raw config.
    /// Resolution here is a deep copy; interpretation of keys is up to the plugin.
    pub fn from_config(config: &ConfigSource) -> Self {
        Self(config.0.clone())
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
