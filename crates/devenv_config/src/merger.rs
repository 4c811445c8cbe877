//! Hierarchical configuration merging.
//!
//! Combines the three configuration tiers into one effective configuration.
//!
//! # Configuration Hierarchy
//!
//! The merge follows a strict precedence order from lowest to highest:
//! 1. **System defaults** - compiled into the engine
//! 2. **Global** - organization-wide file
//! 3. **Developer** - per-developer file (highest precedence)
//!
//! # Field Classes
//!
//! - **Override** (`image`, every `resources` field, `uid`, the toggles,
//!   `python_bin_path`, `pip_index_url`): the most specific tier that sets the
//!   field wins. CPU and memory are canonicalized per tier first, and a
//!   canonical value of 0 counts as unset.
//! - **Additive list** (`packages.apt`, `packages.python`, SSH keys): lower
//!   tiers first, then higher tiers, dropping exact duplicates and keeping the
//!   first occurrence.
//! - **Additive keyed** (`volumes`): a later volume replaces an earlier one
//!   with the same name in place, within a tier or across tiers; other
//!   volumes are appended.
//! - **User-only** (developer fields): taken from the developer tier as is.
//!
//! A tier is merged onto the result of the tiers below it, so merging the
//! developer layer onto the merged global configuration gives the same result
//! as merging all three tiers at once.
//!
//! # Examples
//!
//! ```rust
//! use devenv_config::{load_system_defaults, BaseConfig, ConfigurationMerger, ContainerSettings};
//!
//! let merger = ConfigurationMerger::new();
//! let global: BaseConfig = serde_yaml::from_str("resources:\n  cpu: 4\npackages:\n  apt: [curl, git]\n").unwrap();
//!
//! let merged = merger.merge_global(&load_system_defaults(), &global)?;
//! assert_eq!(merged.cpu_request().as_deref(), Some("4000m"));
//! assert_eq!(merged.apt_packages(), ["curl", "git"]);
//! # Ok::<(), devenv_config::ConfigurationError>(())
//! ```

use indexmap::IndexMap;
use std::collections::HashSet;

use crate::{
    base_config::{BaseConfig, PackageConfig, ResourceConfig, VolumeMount},
    dev_env_config::DevEnvConfig,
    errors::ConfigurationResult,
    merged_config::{ConfigurationSource, ConfigurationSourceTrace},
    quantity::{parse_cpu, parse_memory, CPU_FIELD, MEMORY_FIELD},
    raw_value::RawValue,
    ssh_keys::{normalize_ssh_keys, SSH_KEY_FIELD},
    validator::ValidationWarning,
};

/// Configuration merging engine.
///
/// This is a stateless component: it takes configuration tiers and produces
/// merged output without keeping any state between calls.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationMerger {}

impl ConfigurationMerger {
    /// Creates a new configuration merger.
    pub fn new() -> Self {
        Self {}
    }

    /// Merges the global layer onto the system defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidQuantity` if either tier's CPU or
    /// memory cannot be canonicalized. Invalid global SSH keys do not fail the
    /// merge; they add a warning to the result instead.
    pub fn merge_global(
        &self,
        system: &BaseConfig,
        global: &BaseConfig,
    ) -> ConfigurationResult<BaseConfig> {
        self.merge_tier(system, global, ConfigurationSource::Global)
    }

    /// Merges the developer layer onto an already merged base configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidQuantity` for a quantity that cannot
    /// be canonicalized and `ConfigurationError::InvalidSshKeys` when the
    /// developer's `ssh_public_key` is malformed.
    pub fn merge_developer(
        &self,
        base: &BaseConfig,
        developer: DevEnvConfig,
    ) -> ConfigurationResult<DevEnvConfig> {
        let merged = self.merge_tier(base, &developer.base, ConfigurationSource::Developer)?;
        Ok(DevEnvConfig {
            base: merged,
            ..developer
        })
    }

    /// Merges one tier onto the result of the tiers below it.
    fn merge_tier(
        &self,
        lower: &BaseConfig,
        upper: &BaseConfig,
        source: ConfigurationSource,
    ) -> ConfigurationResult<BaseConfig> {
        let mut trace = lower.source_trace.clone();
        let mut warnings = lower.warnings.clone();

        let resources =
            self.merge_resources(&lower.resources, &upper.resources, source, &mut trace)?;

        let (ssh_keys, ssh_public_key) =
            self.merge_ssh_keys(lower, upper, source, &mut trace, &mut warnings)?;

        let packages = PackageConfig {
            apt: self.merge_list(
                "packages.apt",
                &lower.packages.apt,
                &upper.packages.apt,
                source,
                &mut trace,
            ),
            python: self.merge_list(
                "packages.python",
                &lower.packages.python,
                &upper.packages.python,
                source,
                &mut trace,
            ),
        };

        let volumes = self.merge_volumes(&lower.volumes, &upper.volumes);
        if !upper.volumes.is_empty() {
            trace.add_source("volumes", source);
        }

        Ok(BaseConfig {
            image: self.merge_override("image", &lower.image, &upper.image, source, &mut trace),
            resources,
            uid: self.merge_override("uid", &lower.uid, &upper.uid, source, &mut trace),
            packages,
            volumes,
            ssh_public_key,
            install_homebrew: self.merge_override(
                "install_homebrew",
                &lower.install_homebrew,
                &upper.install_homebrew,
                source,
                &mut trace,
            ),
            clear_local_packages: self.merge_override(
                "clear_local_packages",
                &lower.clear_local_packages,
                &upper.clear_local_packages,
                source,
                &mut trace,
            ),
            clear_vscode_cache: self.merge_override(
                "clear_vscode_cache",
                &lower.clear_vscode_cache,
                &upper.clear_vscode_cache,
                source,
                &mut trace,
            ),
            python_bin_path: self.merge_override(
                "python_bin_path",
                &lower.python_bin_path,
                &upper.python_bin_path,
                source,
                &mut trace,
            ),
            pip_index_url: self.merge_override(
                "pip_index_url",
                &lower.pip_index_url,
                &upper.pip_index_url,
                source,
                &mut trace,
            ),
            ssh_keys,
            source_trace: trace,
            warnings,
        })
    }

    fn merge_resources(
        &self,
        lower: &ResourceConfig,
        upper: &ResourceConfig,
        source: ConfigurationSource,
        trace: &mut ConfigurationSourceTrace,
    ) -> ConfigurationResult<ResourceConfig> {
        // Both tiers are canonicalized before either is compared.
        let lower_cpu = parse_cpu(&lower.cpu)?;
        let upper_cpu = parse_cpu(&upper.cpu)?;
        let lower_memory = parse_memory(&lower.memory)?;
        let upper_memory = parse_memory(&upper.memory)?;

        let (cpu, cpu_millicores) = self.merge_quantity(
            CPU_FIELD,
            (&lower.cpu, lower_cpu),
            (&upper.cpu, upper_cpu),
            source,
            trace,
        );
        let (memory, memory_mib) = self.merge_quantity(
            MEMORY_FIELD,
            (&lower.memory, lower_memory),
            (&upper.memory, upper_memory),
            source,
            trace,
        );

        Ok(ResourceConfig {
            cpu,
            memory,
            storage: self.merge_override(
                "resources.storage",
                &lower.storage,
                &upper.storage,
                source,
                trace,
            ),
            gpu: self.merge_override("resources.gpu", &lower.gpu, &upper.gpu, source, trace),
            cpu_millicores,
            memory_mib,
        })
    }

    /// Picks the higher tier's quantity when it is positive, else the lower
    /// tier's. Returns the winning raw value with its canonical value.
    fn merge_quantity(
        &self,
        field: &str,
        lower: (&RawValue, i64),
        upper: (&RawValue, i64),
        source: ConfigurationSource,
        trace: &mut ConfigurationSourceTrace,
    ) -> (RawValue, i64) {
        if upper.1 > 0 {
            trace.add_source(field, source);
            (upper.0.clone(), upper.1)
        } else if lower.1 > 0 {
            (lower.0.clone(), lower.1)
        } else {
            (RawValue::Absent, 0)
        }
    }

    fn merge_override<T: Clone>(
        &self,
        field: &str,
        lower: &Option<T>,
        upper: &Option<T>,
        source: ConfigurationSource,
        trace: &mut ConfigurationSourceTrace,
    ) -> Option<T> {
        match upper {
            Some(value) => {
                trace.add_source(field, source);
                Some(value.clone())
            }
            None => lower.clone(),
        }
    }

    /// Appends the higher tier's entries to the lower tier's, skipping exact
    /// duplicates.
    fn merge_list(
        &self,
        field: &str,
        lower: &[String],
        upper: &[String],
        source: ConfigurationSource,
        trace: &mut ConfigurationSourceTrace,
    ) -> Vec<String> {
        let merged = append_unique(lower, upper);
        let from_lower = append_unique(lower, &[]).len();
        if merged.len() > from_lower {
            trace.add_source(field, source);
        }
        merged
    }

    /// Keys volumes by name. A later entry with a known name replaces the
    /// earlier one at its original position, whether it comes from the same
    /// tier or a higher one.
    fn merge_volumes(&self, lower: &[VolumeMount], upper: &[VolumeMount]) -> Vec<VolumeMount> {
        let mut merged: IndexMap<String, VolumeMount> = IndexMap::new();
        for volume in lower.iter().chain(upper) {
            merged.insert(volume.name.clone(), volume.clone());
        }
        merged.into_values().collect()
    }

    fn merge_ssh_keys(
        &self,
        lower: &BaseConfig,
        upper: &BaseConfig,
        source: ConfigurationSource,
        trace: &mut ConfigurationSourceTrace,
        warnings: &mut Vec<ValidationWarning>,
    ) -> ConfigurationResult<(Vec<String>, RawValue)> {
        let lower_source = lower
            .source_trace
            .get_source(SSH_KEY_FIELD)
            .unwrap_or(ConfigurationSource::Global);
        let lower_keys = self.tier_ssh_keys(&lower.ssh_public_key, lower_source, warnings)?;
        let upper_keys = self.tier_ssh_keys(&upper.ssh_public_key, source, warnings)?;

        let keys = self.merge_list(SSH_KEY_FIELD, &lower_keys, &upper_keys, source, trace);
        let raw = if keys.is_empty() {
            RawValue::Absent
        } else {
            RawValue::text_list(keys.iter().cloned())
        };
        Ok((keys, raw))
    }

    /// Normalizes one tier's keys. Only a developer-tier failure is fatal;
    /// any other tier contributes no keys and records a warning.
    fn tier_ssh_keys(
        &self,
        raw: &RawValue,
        source: ConfigurationSource,
        warnings: &mut Vec<ValidationWarning>,
    ) -> ConfigurationResult<Vec<String>> {
        match normalize_ssh_keys(raw) {
            Ok(keys) => Ok(keys),
            Err(e) if source == ConfigurationSource::Developer => Err(e),
            Err(e) => {
                warnings.push(ValidationWarning {
                    field_path: SSH_KEY_FIELD.to_string(),
                    message: format!("{} tier contributes zero SSH keys: {}", source, e),
                    recommendation: Some(format!(
                        "Fix {} in the {} configuration",
                        SSH_KEY_FIELD, source
                    )),
                });
                Ok(Vec::new())
            }
        }
    }
}

/// Concatenates two lists, keeping the first occurrence of each entry.
fn append_unique(lower: &[String], upper: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    lower
        .iter()
        .chain(upper)
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect()
}

#[cfg(test)]
#[path = "merger_tests.rs"]
mod tests;
