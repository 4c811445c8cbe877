//! Validation result types shared by the structural and semantic validators.
//!
//! # Examples
//!
//! ```rust
//! use devenv_config::{ValidationError, ValidationErrorType, ValidationResult};
//!
//! let mut result = ValidationResult::new();
//!
//! result.add_error(ValidationError {
//!     error_type: ValidationErrorType::RequiredFieldMissing,
//!     field_path: "name".to_string(),
//!     message: "name is required".to_string(),
//!     suggestion: Some("Set name to the developer's hostname-safe id".to_string()),
//! });
//!
//! assert!(!result.is_valid());
//! assert_eq!(result.errors.len(), 1);
//! ```

use crate::errors::ConfigurationError;

/// Result of structural validation.
///
/// Contains every validation error found. Validation is considered
/// successful only if no errors are present. Non-blocking merge warnings are
/// carried on the merged configuration instead.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// List of validation errors (blocking issues).
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty validation result.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Check if validation passed (no errors).
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add a validation error.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Converts the collected errors into a single aggregated error.
    ///
    /// Returns `Ok(())` when no errors were collected.
    pub fn into_result(self) -> Result<(), ConfigurationError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        Err(ConfigurationError::ValidationFailed {
            error_count: self.errors.len(),
            errors: self.errors,
        })
    }
}

/// Individual validation error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The category of validation error.
    pub error_type: ValidationErrorType,
    /// Dot-separated path to the field that failed validation.
    pub field_path: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    pub suggestion: Option<String>,
}

/// Validation error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorType {
    /// A required field is missing or empty.
    RequiredFieldMissing,
    /// A numeric field is outside its permitted range.
    OutOfRange,
    /// A string field does not have the expected shape.
    InvalidFormat,
    /// A field value is invalid for a field-specific reason.
    InvalidValue,
}

impl std::fmt::Display for ValidationErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequiredFieldMissing => write!(f, "RequiredFieldMissing"),
            Self::OutOfRange => write!(f, "OutOfRange"),
            Self::InvalidFormat => write!(f, "InvalidFormat"),
            Self::InvalidValue => write!(f, "InvalidValue"),
        }
    }
}

/// Non-blocking validation warning.
///
/// Produced when a lower-precedence tier contributes nothing for a field
/// because its input could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Dot-separated path to the field that triggered the warning.
    pub field_path: String,
    /// Human-readable warning message.
    pub message: String,
    /// Optional recommendation for fixing the input.
    pub recommendation: Option<String>,
}

/// Renders validation errors one per line for the aggregated error message.
pub fn render_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|error| {
            let mut line = format!(
                "  - [{}] {}: {}",
                error.error_type, error.field_path, error.message
            );
            if let Some(suggestion) = &error.suggestion {
                line.push_str(&format!(" ({})", suggestion));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
