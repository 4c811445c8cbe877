//! Compiled-in defaults, the lowest-precedence tier.

use crate::base_config::{BaseConfig, PackageConfig, ResourceConfig};
use crate::merged_config::{ConfigurationSource, ConfigurationSourceTrace};
use crate::quantity::{format_cpu, format_memory};
use crate::raw_value::RawValue;

pub const DEFAULT_IMAGE: &str = "ubuntu:22.04";
pub const DEFAULT_CPU_MILLICORES: i64 = 2000;
pub const DEFAULT_MEMORY_MIB: i64 = 4096;
pub const DEFAULT_STORAGE: &str = "20Gi";
pub const DEFAULT_UID: i64 = 1000;
pub const DEFAULT_PYTHON_BIN_PATH: &str = "/usr/bin/python3";

/// Override-class fields the defaults always provide.
const DEFAULT_FIELDS: &[&str] = &[
    "image",
    "resources.cpu",
    "resources.memory",
    "resources.storage",
    "resources.gpu",
    "uid",
    "install_homebrew",
    "clear_local_packages",
    "clear_vscode_cache",
    "python_bin_path",
];

/// Builds the system defaults.
///
/// Pure and deterministic: every call returns an equal value. Package,
/// volume and SSH key lists start empty so the other tiers fully own them.
pub fn load_system_defaults() -> BaseConfig {
    let mut source_trace = ConfigurationSourceTrace::new();
    for field in DEFAULT_FIELDS {
        source_trace.add_source(field, ConfigurationSource::SystemDefaults);
    }

    BaseConfig {
        image: Some(DEFAULT_IMAGE.to_string()),
        resources: ResourceConfig {
            cpu: RawValue::Text(format_cpu(DEFAULT_CPU_MILLICORES)),
            memory: RawValue::Text(format_memory(DEFAULT_MEMORY_MIB)),
            storage: Some(DEFAULT_STORAGE.to_string()),
            gpu: Some(0),
            cpu_millicores: DEFAULT_CPU_MILLICORES,
            memory_mib: DEFAULT_MEMORY_MIB,
        },
        uid: Some(DEFAULT_UID),
        packages: PackageConfig::default(),
        volumes: Vec::new(),
        ssh_public_key: RawValue::Absent,
        install_homebrew: Some(false),
        clear_local_packages: Some(false),
        clear_vscode_cache: Some(false),
        python_bin_path: Some(DEFAULT_PYTHON_BIN_PATH.to_string()),
        pip_index_url: None,
        ssh_keys: Vec::new(),
        source_trace,
        warnings: Vec::new(),
    }
}

#[cfg(test)]
#[path = "system_defaults_tests.rs"]
mod tests;
