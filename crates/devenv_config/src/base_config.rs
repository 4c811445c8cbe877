//! Configuration shared by the system, global and developer tiers.
//!
//! `BaseConfig` is both the decoded shape of one tier's YAML and the merged
//! result of several tiers. Override-class fields are `Option`s so a tier that
//! does not mention a field can be told apart from one that sets it.
//!
//! # YAML Format
//!
//! ```yaml
//! image: ghcr.io/example/devenv:2024.06
//! resources:
//!   cpu: 4            # cores, or "500m"
//!   memory: "16Gi"    # a bare number is gibibytes
//!   storage: "50Gi"
//!   gpu: 1
//! uid: 1000
//! packages:
//!   apt: [curl, git]
//!   python: [numpy]
//! volumes:
//!   - name: datasets
//!     local_path: /mnt/datasets
//!     container_path: /data
//! ssh_public_key:
//!   - ssh-ed25519 AAAA... alice@laptop
//! install_homebrew: true
//! python_bin_path: /usr/bin/python3
//! pip_index_url: https://pypi.org/simple
//! ```

use serde::{Deserialize, Serialize};

use crate::merged_config::ConfigurationSourceTrace;
use crate::quantity::{format_cpu, format_memory};
use crate::raw_value::RawValue;
use crate::validator::ValidationWarning;

/// Default cap on GPUs a single environment may request.
pub const MAX_GPU_COUNT: u32 = 8;

/// Compute and storage requests for the environment container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ResourceConfig {
    /// CPU as written: cores (`2`, `"1.5"`) or millicores (`"500m"`).
    pub cpu: RawValue,

    /// Memory as written: `"512Mi"`, `"8Gi"`, `"500M"` or a bare number of
    /// gibibytes.
    pub memory: RawValue,

    /// Persistent storage size, passed through as written.
    pub storage: Option<String>,

    /// Requested GPU count.
    pub gpu: Option<i64>,

    /// Canonical CPU in millicores; 0 means unspecified.
    #[serde(skip)]
    pub(crate) cpu_millicores: i64,

    /// Canonical memory in mebibytes; 0 means unspecified.
    #[serde(skip)]
    pub(crate) memory_mib: i64,
}

/// Packages installed into the environment image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PackageConfig {
    pub apt: Vec<String>,
    pub python: Vec<String>,
}

/// A host directory mounted into the environment.
///
/// `name` identifies the mount across tiers: a developer entry with the same
/// name as a global one replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VolumeMount {
    pub name: String,
    pub local_path: String,
    pub container_path: String,
}

/// Fields shared by organization defaults and developer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BaseConfig {
    /// Container image reference.
    pub image: Option<String>,

    pub resources: ResourceConfig,

    /// Numeric user id inside the container.
    pub uid: Option<i64>,

    pub packages: PackageConfig,

    pub volumes: Vec<VolumeMount>,

    /// One key as a string, or a list of keys.
    pub ssh_public_key: RawValue,

    pub install_homebrew: Option<bool>,

    pub clear_local_packages: Option<bool>,

    pub clear_vscode_cache: Option<bool>,

    /// Absolute path of the Python interpreter used for package installs.
    pub python_bin_path: Option<String>,

    /// Package index used by pip.
    pub pip_index_url: Option<String>,

    /// Normalized keys, filled in by the merger.
    #[serde(skip)]
    pub(crate) ssh_keys: Vec<String>,

    #[serde(skip)]
    pub(crate) source_trace: ConfigurationSourceTrace,

    #[serde(skip)]
    pub(crate) warnings: Vec<ValidationWarning>,
}

/// Read access to the canonical container settings of a merged configuration.
///
/// Implemented by both [`BaseConfig`] and [`crate::DevEnvConfig`]; the
/// templating side only needs this trait.
pub trait ContainerSettings {
    /// The shared configuration fields.
    fn base(&self) -> &BaseConfig;

    /// Upper bound applied by [`ContainerSettings::gpu_count`].
    fn gpu_limit(&self) -> u32 {
        MAX_GPU_COUNT
    }

    fn image(&self) -> Option<&str> {
        self.base().image.as_deref()
    }

    fn cpu_millicores(&self) -> i64 {
        self.base().resources.cpu_millicores
    }

    fn memory_mib(&self) -> i64 {
        self.base().resources.memory_mib
    }

    /// CPU formatted for a manifest (`"500m"`), or `None` when unspecified.
    fn cpu_request(&self) -> Option<String> {
        let millicores = self.cpu_millicores();
        (millicores > 0).then(|| format_cpu(millicores))
    }

    /// Memory formatted for a manifest (`"8Gi"`, `"1536Mi"`), or `None` when
    /// unspecified.
    fn memory_request(&self) -> Option<String> {
        let mebibytes = self.memory_mib();
        (mebibytes > 0).then(|| format_memory(mebibytes))
    }

    fn storage(&self) -> Option<&str> {
        self.base().resources.storage.as_deref()
    }

    /// GPU count clamped to `0..=gpu_limit()`.
    fn gpu_count(&self) -> u32 {
        let limit = self.gpu_limit();
        match self.base().resources.gpu {
            Some(gpu) if gpu > 0 => u32::try_from(gpu).map_or(limit, |gpu| gpu.min(limit)),
            _ => 0,
        }
    }

    fn uid(&self) -> Option<i64> {
        self.base().uid
    }

    fn ssh_keys(&self) -> &[String] {
        &self.base().ssh_keys
    }

    /// Keys joined one per line, in `authorized_keys` layout.
    fn ssh_keys_joined(&self) -> String {
        self.ssh_keys().join("\n")
    }

    /// A copy of the merged volume list.
    fn volumes(&self) -> Vec<VolumeMount> {
        self.base().volumes.clone()
    }

    fn apt_packages(&self) -> &[String] {
        &self.base().packages.apt
    }

    fn python_packages(&self) -> &[String] {
        &self.base().packages.python
    }

    /// Warnings raised while merging lower-precedence tiers.
    fn warnings(&self) -> &[ValidationWarning] {
        &self.base().warnings
    }

    /// Which tier supplied each merged field.
    fn source_trace(&self) -> &ConfigurationSourceTrace {
        &self.base().source_trace
    }
}

impl ContainerSettings for BaseConfig {
    fn base(&self) -> &BaseConfig {
        self
    }
}

#[cfg(test)]
#[path = "base_config_tests.rs"]
mod tests;
