//! Configuration loading.
//!
//! The `ConfigLoader` is the orchestration layer of the engine. It decodes the
//! bytes a caller read from disk, merges them with the lower tiers and
//! validates the result:
//!
//! 1. Build the system defaults
//! 2. Decode and merge the optional global file onto them
//! 3. Decode the developer file and merge it onto the merged global config
//! 4. Run structural validation, collecting every violation
//! 5. Run semantic validation, stopping at the first violation
//!
//! The loader never opens files. Callers prefix errors with the path they
//! read using [`crate::ConfigurationError::in_file`].
//!
//! # Examples
//!
//! ```rust
//! use devenv_config::{ConfigLoader, ContainerSettings};
//!
//! let loader = ConfigLoader::default();
//! let global = loader.load_global_config(Some(b"resources:\n  cpu: 4\n"))?;
//!
//! let developer = b"name: alice\nssh_public_key: ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8g\n";
//! let config = loader.load_developer_config(developer, &global)?;
//!
//! assert_eq!(config.cpu_request().as_deref(), Some("4000m"));
//! assert_eq!(
//!     config.developer_dir().map(|p| p.display().to_string()).as_deref(),
//!     Some("/home/devenv/developers/alice")
//! );
//! # Ok::<(), devenv_config::ConfigurationError>(())
//! ```

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

use crate::{
    base_config::{BaseConfig, ContainerSettings, MAX_GPU_COUNT},
    dev_env_config::DevEnvConfig,
    errors::{ConfigurationError, ConfigurationResult},
    merger::ConfigurationMerger,
    semantic::validate_semantics,
    structural::{validate_structure, RuleTable},
    system_defaults,
};

/// Default parent directory of per-developer directories.
pub const DEFAULT_DEVELOPERS_ROOT: &str = "/home/devenv/developers";

/// Settings that tune the loader for a deployment.
///
/// # TOML Format
///
/// ```toml
/// max_gpu_count = 4
/// developers_root = "/srv/devenv/developers"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Upper bound for `resources.gpu`.
    pub max_gpu_count: u32,

    /// Parent directory of every developer's directory.
    pub developers_root: PathBuf,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            max_gpu_count: MAX_GPU_COUNT,
            developers_root: PathBuf::from(DEFAULT_DEVELOPERS_ROOT),
        }
    }
}

impl LoaderSettings {
    /// Parses settings from TOML. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidSettings` if the TOML is malformed
    /// or a key has the wrong type.
    pub fn from_toml_str(content: &str) -> ConfigurationResult<Self> {
        toml::from_str(content).map_err(|e| ConfigurationError::InvalidSettings {
            reason: e.to_string(),
        })
    }
}

/// Developer environment configuration loader.
///
/// Holds only immutable settings and the rule table, so one loader can be
/// cloned and shared across threads; every load is independent.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    settings: LoaderSettings,

    /// Stateless merger for the three tiers.
    merger: ConfigurationMerger,

    /// Structural rules, built once from the settings.
    rules: RuleTable,
}

impl ConfigLoader {
    /// Creates a loader for the given settings.
    pub fn new(settings: LoaderSettings) -> Self {
        let rules = RuleTable::standard(&settings);
        Self {
            settings,
            merger: ConfigurationMerger::new(),
            rules,
        }
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    /// Builds the compiled-in defaults.
    pub fn load_system_defaults(&self) -> BaseConfig {
        debug!("Building system defaults");
        system_defaults::load_system_defaults()
    }

    /// Loads the organization-wide configuration on top of the system
    /// defaults.
    ///
    /// `None`, empty or whitespace-only bytes mean there is no global file,
    /// which is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::ParseError` for malformed YAML and
    /// `ConfigurationError::InvalidQuantity` for a quantity that cannot be
    /// canonicalized. Invalid global SSH keys only produce a warning.
    #[instrument(skip(self, content), fields(bytes = content.map_or(0, <[u8]>::len)))]
    pub fn load_global_config(&self, content: Option<&[u8]>) -> ConfigurationResult<BaseConfig> {
        let system = self.load_system_defaults();

        // Step 1: Decode the global layer
        let Some(global) = decode_layer::<BaseConfig>(content).map_err(|e| {
            warn!("Failed to parse global configuration: {}", e);
            e
        })?
        else {
            info!("No global configuration provided, using system defaults");
            return Ok(system);
        };

        // Step 2: Merge onto the system defaults
        debug!("Merging global configuration onto system defaults");
        let merged = self.merger.merge_global(&system, &global).map_err(|e| {
            warn!("Global configuration merge failed: {}", e);
            e
        })?;

        for warning in merged.warnings() {
            warn!("  - {}: {}", warning.field_path, warning.message);
        }

        info!(
            "Global configuration loaded (fields configured: {})",
            merged.source_trace().field_count()
        );

        Ok(merged)
    }

    /// Loads a developer configuration on top of a merged base configuration.
    ///
    /// `base` is normally the result of [`ConfigLoader::load_global_config`].
    /// An error means the configuration must not be used.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if:
    /// - The YAML is malformed (`ParseError`)
    /// - A quantity cannot be canonicalized (`InvalidQuantity`)
    /// - `ssh_public_key` has an invalid shape (`InvalidSshKeys`)
    /// - Any structural rule is violated (`ValidationFailed`, listing all)
    /// - A cross-field invariant is violated (`SemanticViolation`)
    #[instrument(skip(self, content, base), fields(bytes = content.len()))]
    pub fn load_developer_config(
        &self,
        content: &[u8],
        base: &BaseConfig,
    ) -> ConfigurationResult<DevEnvConfig> {
        info!("Starting developer configuration load");

        // Step 1: Decode the developer layer
        debug!("Decoding developer configuration");
        let layer = decode_layer::<DevEnvConfig>(Some(content))
            .map_err(|e| {
                warn!("Failed to parse developer configuration: {}", e);
                e
            })?
            .unwrap_or_default();

        // Step 2: Merge onto the base configuration
        debug!("Merging developer configuration");
        let mut merged = self.merger.merge_developer(base, layer).map_err(|e| {
            warn!("Developer configuration merge failed: {}", e);
            e
        })?;
        merged.gpu_limit = Some(self.settings.max_gpu_count);

        // Step 3: Structural validation
        debug!("Validating configuration structure");
        let validation_result = validate_structure(&merged, &self.rules);
        if !validation_result.is_valid() {
            warn!(
                "Configuration validation failed with {} errors",
                validation_result.errors.len()
            );
            for error in &validation_result.errors {
                warn!(
                    "  - [{}] {}: {}",
                    error.error_type, error.field_path, error.message
                );
            }
            validation_result.into_result()?;
        }

        // Step 4: Semantic validation
        debug!("Validating configuration semantics");
        validate_semantics(&merged).map_err(|e| {
            warn!("Semantic validation failed: {}", e);
            e
        })?;

        merged.developer_dir = merged
            .name
            .as_deref()
            .map(|name| self.settings.developers_root.join(name));

        if !merged.warnings().is_empty() {
            info!("Configuration has {} warnings", merged.warnings().len());
            for warning in merged.warnings() {
                info!("  - {}: {}", warning.field_path, warning.message);
            }
        }

        info!(
            "Developer configuration loaded for {} (ssh keys: {}, volumes: {}, fields configured: {})",
            merged.name.as_deref().unwrap_or_default(),
            merged.ssh_keys().len(),
            merged.base.volumes.len(),
            merged.source_trace().field_count()
        );

        Ok(merged)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(LoaderSettings::default())
    }
}

/// Decodes one tier's YAML. Missing, blank and null documents yield `None`.
fn decode_layer<T: DeserializeOwned>(content: Option<&[u8]>) -> ConfigurationResult<Option<T>> {
    match content {
        None => Ok(None),
        Some(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(None),
        Some(bytes) => serde_yaml::from_slice::<Option<T>>(bytes).map_err(|e| {
            ConfigurationError::ParseError {
                reason: e.to_string(),
            }
        }),
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
