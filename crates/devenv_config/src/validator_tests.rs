//! Tests for validation result types.

use super::*;

// ============================================================================
// ValidationResult Tests
// ============================================================================

/// Verify new ValidationResult is valid by default.
#[test]
fn test_validation_result_new_is_valid() {
    let result = ValidationResult::new();
    assert!(result.is_valid());
    assert!(result.errors.is_empty());
}

/// Verify validation result is invalid when errors exist.
#[test]
fn test_validation_result_invalid_with_errors() {
    let mut result = ValidationResult::new();
    result.add_error(ValidationError {
        error_type: ValidationErrorType::InvalidValue,
        field_path: "resources.cpu".to_string(),
        message: "Test error".to_string(),
        suggestion: None,
    });

    assert!(!result.is_valid());
    assert_eq!(result.errors.len(), 1);
}

/// Verify into_result aggregates every error into one ValidationFailed.
#[test]
fn test_into_result_aggregates_errors() {
    let mut result = ValidationResult::new();
    result.add_error(ValidationError {
        error_type: ValidationErrorType::RequiredFieldMissing,
        field_path: "name".to_string(),
        message: "name is required".to_string(),
        suggestion: None,
    });
    result.add_error(ValidationError {
        error_type: ValidationErrorType::InvalidFormat,
        field_path: "git.email".to_string(),
        message: "must be a valid email address".to_string(),
        suggestion: None,
    });

    match result.into_result() {
        Err(ConfigurationError::ValidationFailed {
            error_count,
            errors,
        }) => {
            assert_eq!(error_count, 2);
            assert_eq!(errors[0].field_path, "name");
            assert_eq!(errors[1].field_path, "git.email");
        }
        other => panic!("Expected ValidationFailed, got {:?}", other),
    }
}

/// Verify into_result is Ok when nothing was collected.
#[test]
fn test_into_result_ok_without_errors() {
    assert!(ValidationResult::new().into_result().is_ok());
}

// ============================================================================
// Rendering Tests
// ============================================================================

/// Verify suggestions are appended in parentheses.
#[test]
fn test_render_includes_suggestion() {
    let rendered = render_validation_errors(&[ValidationError {
        error_type: ValidationErrorType::OutOfRange,
        field_path: "uid".to_string(),
        message: "must be between 1000 and 65535, got 0".to_string(),
        suggestion: Some("Use a non-system user id".to_string()),
    }]);

    assert_eq!(
        rendered,
        "  - [OutOfRange] uid: must be between 1000 and 65535, got 0 (Use a non-system user id)"
    );
}

/// Verify ValidationErrorType display names.
#[test]
fn test_validation_error_type_display() {
    assert_eq!(
        ValidationErrorType::RequiredFieldMissing.to_string(),
        "RequiredFieldMissing"
    );
    assert_eq!(ValidationErrorType::OutOfRange.to_string(), "OutOfRange");
    assert_eq!(ValidationErrorType::InvalidFormat.to_string(), "InvalidFormat");
    assert_eq!(ValidationErrorType::InvalidValue.to_string(), "InvalidValue");
}
