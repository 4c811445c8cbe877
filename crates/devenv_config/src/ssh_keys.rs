//! SSH public key normalization and format checks.
//!
//! `ssh_public_key` may be written as a single string or as a list of
//! strings. [`normalize_ssh_keys`] turns either shape into an ordered list of
//! trimmed keys. Whether at least one key is present is checked later by the
//! semantic validator; this module only rejects inputs that are malformed.
//!
//! # Examples
//!
//! ```rust
//! use devenv_config::ssh_keys::normalize_ssh_keys;
//! use devenv_config::RawValue;
//!
//! let keys = normalize_ssh_keys(&RawValue::text_list([" ssh-ed25519 AAAA alice ", "ssh-rsa BBBB"]))?;
//! assert_eq!(keys, vec!["ssh-ed25519 AAAA alice", "ssh-rsa BBBB"]);
//!
//! assert!(normalize_ssh_keys(&RawValue::Absent)?.is_empty());
//! # Ok::<(), devenv_config::ConfigurationError>(())
//! ```

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use regex::Regex;
use std::sync::LazyLock;

use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::raw_value::RawValue;

pub const SSH_KEY_FIELD: &str = "ssh_public_key";

/// Key algorithms accepted in `authorized_keys` entries.
pub const SUPPORTED_KEY_TYPES: &[&str] = &[
    "ssh-ed25519",
    "ssh-rsa",
    "ecdsa-sha2-nistp256",
    "ecdsa-sha2-nistp384",
    "ecdsa-sha2-nistp521",
    "sk-ecdsa-sha2-nistp256@openssh.com",
];

/// Standard alphabet; padding optional, trailing bits ignored.
const KEY_BLOB: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

static KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+) ([A-Za-z0-9+/]+={0,2})(?: (.*))?$").expect("SSH key pattern is valid")
});

/// Normalizes a raw `ssh_public_key` value into an ordered list of keys.
///
/// # Errors
///
/// Returns `ConfigurationError::InvalidSshKeys` when the value is an empty
/// string, an empty list, a list with an empty or non-string element, or any
/// other shape. A bad element rejects the whole field.
pub fn normalize_ssh_keys(raw: &RawValue) -> ConfigurationResult<Vec<String>> {
    match raw {
        RawValue::Absent => Ok(Vec::new()),
        RawValue::Text(text) => {
            let key = text.trim();
            if key.is_empty() {
                return Err(invalid(
                    "SSH public key is required but an empty string was provided",
                ));
            }
            Ok(vec![key.to_string()])
        }
        RawValue::List(items) => {
            if items.is_empty() {
                return Err(invalid(
                    "SSH public key is required but an empty list was provided",
                ));
            }
            items
                .iter()
                .enumerate()
                .map(|(index, item)| match item {
                    RawValue::Text(text) if !text.trim().is_empty() => {
                        Ok(text.trim().to_string())
                    }
                    RawValue::Text(_) => Err(invalid(format!(
                        "{}[{}] is empty",
                        SSH_KEY_FIELD, index
                    ))),
                    other => Err(invalid(format!(
                        "{}[{}] must be a string, got {}",
                        SSH_KEY_FIELD,
                        index,
                        other.kind()
                    ))),
                })
                .collect()
        }
        other => Err(invalid(format!(
            "{} must be a string or a list of strings, got {}",
            SSH_KEY_FIELD,
            other.kind()
        ))),
    }
}

/// Checks that a key has the shape `<key-type> <base64>[ comment]`.
///
/// The key type must be one of [`SUPPORTED_KEY_TYPES`] and the blob must
/// decode as standard-alphabet base64, with or without padding.
pub fn is_valid_ssh_key(key: &str) -> bool {
    let Some(captures) = KEY_PATTERN.captures(key.trim()) else {
        return false;
    };
    let key_type = &captures[1];
    if !SUPPORTED_KEY_TYPES.contains(&key_type) {
        return false;
    }

    KEY_BLOB.decode(&captures[2]).is_ok()
}

fn invalid(reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidSshKeys {
        reason: reason.into(),
    }
}

#[cfg(test)]
#[path = "ssh_keys_tests.rs"]
mod tests;
