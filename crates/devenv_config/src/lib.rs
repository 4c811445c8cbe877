//! Developer environment configuration engine.
//!
//! Normalizes the loosely-typed resource quantities and SSH keys found in
//! hand-written YAML, merges the system, global and developer tiers, and
//! validates the result before it is handed to manifest templating.
//!
//! # Examples
//!
//! ```rust
//! use devenv_config::{load_developer_config, load_global_config, ContainerSettings};
//!
//! let global = load_global_config(Some(b"packages:\n  apt: [curl, git]\nresources:\n  cpu: 4\n"))?;
//!
//! let developer = b"
//! name: alice
//! ssh_public_key: ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8g
//! packages:
//!   apt: [git, vim]
//! resources:
//!   memory: 1.5Gi
//! ";
//! let config = load_developer_config(developer, &global)?;
//!
//! assert_eq!(config.apt_packages(), ["curl", "git", "vim"]);
//! assert_eq!(config.cpu_request().as_deref(), Some("4000m"));
//! assert_eq!(config.memory_request().as_deref(), Some("1536Mi"));
//! # Ok::<(), devenv_config::ConfigurationError>(())
//! ```

// Value types
pub mod base_config;
pub mod dev_env_config;
pub mod errors;
pub mod merged_config;
pub mod raw_value;
pub mod system_defaults;

// Normalization
pub mod formats;
pub mod quantity;
pub mod ssh_keys;

// Merging
pub mod merger;

// Validation
pub mod semantic;
pub mod structural;
pub mod validator;

// Orchestration
pub mod loader;

#[cfg(test)]
mod integration_tests;

// Re-export for convenient access
pub use base_config::{
    BaseConfig, ContainerSettings, PackageConfig, ResourceConfig, VolumeMount, MAX_GPU_COUNT,
};
pub use dev_env_config::{DevEnvConfig, GitConfig, RefreshConfig};
pub use errors::{ConfigurationError, ConfigurationResult};
pub use loader::{ConfigLoader, LoaderSettings};
pub use merged_config::{ConfigurationSource, ConfigurationSourceTrace};
pub use merger::ConfigurationMerger;
pub use raw_value::RawValue;
pub use structural::RuleTable;
pub use validator::{ValidationError, ValidationErrorType, ValidationResult, ValidationWarning};

/// Builds the compiled-in defaults. Pure and deterministic.
pub fn load_system_defaults() -> BaseConfig {
    system_defaults::load_system_defaults()
}

/// Loads the organization-wide configuration with default loader settings.
///
/// See [`ConfigLoader::load_global_config`].
pub fn load_global_config(content: Option<&[u8]>) -> ConfigurationResult<BaseConfig> {
    ConfigLoader::default().load_global_config(content)
}

/// Loads a developer configuration with default loader settings.
///
/// See [`ConfigLoader::load_developer_config`].
pub fn load_developer_config(
    content: &[u8],
    base: &BaseConfig,
) -> ConfigurationResult<DevEnvConfig> {
    ConfigLoader::default().load_developer_config(content, base)
}
