//! Source tracing for merged configuration.
//!
//! Every override and additive field of a merged configuration records which
//! tier supplied it, so a developer can see why a value ended up in their
//! environment.
//!
//! # Configuration Sources
//!
//! The merge follows a strict precedence hierarchy:
//! 1. **Developer** (highest precedence)
//! 2. **Global**
//! 3. **System defaults** (lowest precedence)
//!
//! # Examples
//!
//! ```rust
//! use devenv_config::{ConfigurationSource, ConfigurationSourceTrace};
//!
//! let mut trace = ConfigurationSourceTrace::new();
//! trace.add_source("resources.cpu", ConfigurationSource::Global);
//! trace.add_source("image", ConfigurationSource::Developer);
//!
//! assert_eq!(trace.get_source("image"), Some(ConfigurationSource::Developer));
//! assert_eq!(trace.field_count(), 2);
//! ```

use serde::Serialize;
use std::collections::BTreeMap;

/// Tracks which configuration source provided each setting.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ConfigurationSourceTrace {
    /// Map of field path to configuration source, ordered by path.
    sources: BTreeMap<String, ConfigurationSource>,
}

impl ConfigurationSourceTrace {
    /// Creates a new empty source trace.
    pub fn new() -> Self {
        Self {
            sources: BTreeMap::new(),
        }
    }

    /// Records the source of a configuration setting, replacing any earlier
    /// record for the same path.
    pub fn add_source(&mut self, field_path: &str, source: ConfigurationSource) {
        self.sources.insert(field_path.to_string(), source);
    }

    /// Gets the source of a configuration setting.
    ///
    /// Returns `None` if no tier supplied the setting.
    pub fn get_source(&self, field_path: &str) -> Option<ConfigurationSource> {
        self.sources.get(field_path).copied()
    }

    /// Returns all field paths that have been configured, in path order.
    pub fn configured_fields(&self) -> Vec<&str> {
        self.sources.keys().map(|s| s.as_str()).collect()
    }

    /// Returns the number of configured fields.
    pub fn field_count(&self) -> usize {
        self.sources.len()
    }
}

/// Configuration tier in the hierarchy.
///
/// Variants are ordered by precedence, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationSource {
    /// Compiled-in defaults (lowest precedence).
    SystemDefaults,

    /// Organization-wide configuration file.
    Global,

    /// Per-developer configuration file (highest precedence).
    Developer,
}

impl std::fmt::Display for ConfigurationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationSource::SystemDefaults => write!(f, "system_defaults"),
            ConfigurationSource::Global => write!(f, "global"),
            ConfigurationSource::Developer => write!(f, "developer"),
        }
    }
}

#[cfg(test)]
#[path = "merged_config_tests.rs"]
mod tests;
