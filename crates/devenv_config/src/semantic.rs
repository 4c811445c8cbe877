//! Post-merge semantic validation.
//!
//! Runs on the merged, canonicalized configuration and enforces invariants
//! that span tiers. Unlike structural validation it stops at the first
//! violation.

use std::collections::HashSet;

use crate::{
    base_config::ContainerSettings,
    dev_env_config::DevEnvConfig,
    errors::{ConfigurationError, ConfigurationResult},
    formats::is_hostname,
    ssh_keys::{is_valid_ssh_key, SSH_KEY_FIELD},
};

/// Checks the merged configuration's cross-field invariants.
///
/// In order: the developer name is present and hostname-shaped, at least one
/// valid SSH key survived the merge, CPU, memory and GPU are not negative,
/// and volume names are unique.
///
/// # Errors
///
/// Returns the first `ConfigurationError::SemanticViolation` found.
pub fn validate_semantics(config: &DevEnvConfig) -> ConfigurationResult<()> {
    match config.name.as_deref().map(str::trim) {
        None | Some("") => return Err(violation("name", "developer name is required")),
        Some(name) if !is_hostname(name) => {
            return Err(violation(
                "name",
                format!("'{}' is not a valid hostname", name),
            ))
        }
        Some(_) => {}
    }

    if !config.ssh_keys().iter().any(|key| is_valid_ssh_key(key)) {
        return Err(violation(
            SSH_KEY_FIELD,
            "at least one valid SSH public key is required",
        ));
    }

    if config.cpu_millicores() < 0 {
        return Err(violation("resources.cpu", "must not be negative"));
    }
    if config.memory_mib() < 0 {
        return Err(violation("resources.memory", "must not be negative"));
    }
    if config.base.resources.gpu.is_some_and(|gpu| gpu < 0) {
        return Err(violation("resources.gpu", "must not be negative"));
    }

    let mut names = HashSet::new();
    if let Some(duplicate) = config
        .base
        .volumes
        .iter()
        .find(|volume| !names.insert(volume.name.as_str()))
    {
        return Err(violation(
            "volumes",
            format!("volume name '{}' is used more than once", duplicate.name),
        ));
    }

    Ok(())
}

fn violation(field: &str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::SemanticViolation {
        field: field.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
#[path = "semantic_tests.rs"]
mod tests;
