//! Configuration engine error types.
//!
//! Domain-specific errors for decoding, canonicalizing, merging and
//! validating developer environment configuration.

use std::path::Path;
use thiserror::Error;

use crate::validator::{render_validation_errors, ValidationError};

/// Configuration engine errors.
///
/// Parse errors (`ParseError`, `InvalidQuantity`, `InvalidSshKeys`) are always
/// fatal to the load. Structural violations are aggregated into a single
/// `ValidationFailed`, while semantic checks report the first
/// `SemanticViolation` they find.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Failed to parse configuration: {reason}")]
    ParseError { reason: String },

    #[error("Invalid quantity for {field}: '{value}' - {reason}")]
    InvalidQuantity {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid SSH public key configuration: {reason}")]
    InvalidSshKeys { reason: String },

    #[error("Invalid loader settings: {reason}")]
    InvalidSettings { reason: String },

    #[error(
        "Configuration validation failed with {error_count} error(s):\n{}",
        render_validation_errors(.errors)
    )]
    ValidationFailed {
        error_count: usize,
        errors: Vec<ValidationError>,
    },

    #[error("Semantic validation failed: {field} - {reason}")]
    SemanticViolation { field: String, reason: String },

    #[error("{path}: {source}")]
    InFile {
        path: String,
        source: Box<ConfigurationError>,
    },
}

impl ConfigurationError {
    /// Attaches the path of the file the error originated from.
    ///
    /// The engine never sees file paths; callers that read the bytes use this
    /// to prefix the error before reporting it.
    pub fn in_file(self, path: impl AsRef<Path>) -> Self {
        ConfigurationError::InFile {
            path: path.as_ref().display().to_string(),
            source: Box::new(self),
        }
    }

    pub(crate) fn quantity(field: &str, value: &str, reason: impl Into<String>) -> Self {
        ConfigurationError::InvalidQuantity {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for configuration operations.
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
