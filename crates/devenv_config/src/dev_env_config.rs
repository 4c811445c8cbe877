//! Per-developer configuration.
//!
//! A `DevEnvConfig` is the shared [`BaseConfig`] plus fields only a developer
//! file may set. The same type holds the decoded developer layer and, after
//! [`crate::ConfigLoader::load_developer_config`], the fully merged and
//! validated result.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::base_config::{BaseConfig, ContainerSettings, MAX_GPU_COUNT};

/// Commit identity configured inside the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GitConfig {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// When the environment is rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RefreshConfig {
    pub enabled: bool,

    /// Cron expression for scheduled rebuilds.
    pub schedule: Option<String>,

    /// Rebuild when the configured image changes.
    pub on_image_change: bool,
}

/// Developer environment configuration.
///
/// # YAML Format
///
/// ```yaml
/// name: alice
/// ssh_port: 30022
/// http_port: 30080
/// target_nodes: [gpu-node-1]
/// git:
///   name: Alice Example
///   email: alice@example.com
/// refresh:
///   enabled: true
///   schedule: "0 3 * * *"
/// resources:
///   cpu: 8
/// ssh_public_key: ssh-ed25519 AAAA... alice@laptop
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DevEnvConfig {
    #[serde(flatten)]
    pub base: BaseConfig,

    /// Developer id; also the environment's hostname.
    pub name: Option<String>,

    pub ssh_port: Option<i64>,

    pub http_port: Option<i64>,

    pub is_admin: bool,

    /// Disable authentication on the environment's HTTP endpoint.
    pub skip_auth: bool,

    /// Nodes the environment may be scheduled on.
    pub target_nodes: Vec<String>,

    pub git: GitConfig,

    pub refresh: RefreshConfig,

    /// `<developers_root>/<name>`, set by the loader.
    #[serde(skip)]
    pub(crate) developer_dir: Option<PathBuf>,

    #[serde(skip)]
    pub(crate) gpu_limit: Option<u32>,
}

impl DevEnvConfig {
    /// Directory holding this developer's files, once loaded.
    pub fn developer_dir(&self) -> Option<&Path> {
        self.developer_dir.as_deref()
    }

    /// Renders the canonical settings for the manifest templates.
    ///
    /// Quantities appear in their formatted form and are `null` when no tier
    /// specified them.
    pub fn to_template_json(&self) -> serde_json::Value {
        let base = &self.base;
        json!({
            "name": self.name,
            "image": self.image(),
            "uid": self.uid(),
            "resources": {
                "cpu": self.cpu_request(),
                "memory": self.memory_request(),
                "storage": self.storage(),
                "gpu": self.gpu_count(),
            },
            "packages": {
                "apt": self.apt_packages(),
                "python": self.python_packages(),
            },
            "volumes": self.volumes(),
            "ssh_public_keys": self.ssh_keys(),
            "authorized_keys": self.ssh_keys_joined(),
            "ssh_port": self.ssh_port,
            "http_port": self.http_port,
            "is_admin": self.is_admin,
            "skip_auth": self.skip_auth,
            "target_nodes": self.target_nodes,
            "git": self.git,
            "refresh": self.refresh,
            "install_homebrew": base.install_homebrew.unwrap_or(false),
            "clear_local_packages": base.clear_local_packages.unwrap_or(false),
            "clear_vscode_cache": base.clear_vscode_cache.unwrap_or(false),
            "python_bin_path": base.python_bin_path,
            "pip_index_url": base.pip_index_url,
            "developer_dir": self.developer_dir.as_ref().map(|dir| dir.display().to_string()),
        })
    }
}

impl ContainerSettings for DevEnvConfig {
    fn base(&self) -> &BaseConfig {
        &self.base
    }

    fn gpu_limit(&self) -> u32 {
        self.gpu_limit.unwrap_or(MAX_GPU_COUNT)
    }
}

#[cfg(test)]
#[path = "dev_env_config_tests.rs"]
mod tests;
