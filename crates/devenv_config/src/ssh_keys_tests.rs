//! Tests for SSH key normalization and format checks.

use super::*;

const ED25519_KEY: &str =
    "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8g";
const RSA_KEY: &str = "ssh-rsa AAAAB3NzaC1yc2EAAAADAQABAAAAQAABAgMEBQYHCAkKCwwNDg8QERITFBUWFxgZGhscHR4fICEiIyQlJicoKSorLC0uLzAxMjM0NTY3ODk6Ozw9Pj8=";
const ECDSA_KEY: &str = "ecdsa-sha2-nistp256 AAAAE2VjZHNhLXNoYTItbmlzdHAyNTYAAAAIbmlzdHAyNTYAAABBBAABAgMEBQYHCAkKCwwNDg8QERITFBUWFxgZGhscHR4fICEiIyQlJicoKSorLC0uLzAxMjM0NTY3ODk6Ozw9Pj8=";
const SK_ECDSA_KEY: &str = "sk-ecdsa-sha2-nistp256@openssh.com AAAAInNrLWVjZHNhLXNoYTItbmlzdHAyNTZAb3BlbnNzaC5jb20AAAAIbmlzdHAyNTYAAABBBAABAgMEBQYHCAkKCwwNDg8QERITFBUWFxgZGhscHR4fICEiIyQlJicoKSorLC0uLzAxMjM0NTY3ODk6Ozw9Pj8AAAAEc3NoOg==";

fn reason(result: ConfigurationResult<Vec<String>>) -> String {
    match result {
        Err(ConfigurationError::InvalidSshKeys { reason }) => reason,
        other => panic!("Expected InvalidSshKeys, got {:?}", other),
    }
}

// ============================================================================
// Normalization Tests
// ============================================================================

/// Verify an absent value yields no keys and no error.
#[test]
fn test_absent_is_empty_list() {
    assert_eq!(normalize_ssh_keys(&RawValue::Absent).unwrap(), Vec::<String>::new());
}

/// Verify a single string becomes a trimmed singleton list.
#[test]
fn test_single_string_is_trimmed() {
    let raw = RawValue::from(format!("  {}  \n", ED25519_KEY));
    assert_eq!(normalize_ssh_keys(&raw).unwrap(), vec![ED25519_KEY.to_string()]);
}

/// Verify list order is preserved exactly.
#[test]
fn test_list_preserves_order() {
    let raw = RawValue::text_list([RSA_KEY, ED25519_KEY, ECDSA_KEY]);
    assert_eq!(
        normalize_ssh_keys(&raw).unwrap(),
        vec![
            RSA_KEY.to_string(),
            ED25519_KEY.to_string(),
            ECDSA_KEY.to_string()
        ]
    );
}

/// Verify duplicates are kept; deduplication belongs to the merge.
#[test]
fn test_list_keeps_duplicates() {
    let raw = RawValue::text_list([ED25519_KEY, ED25519_KEY]);
    assert_eq!(normalize_ssh_keys(&raw).unwrap().len(), 2);
}

/// Verify an empty string is rejected with the required-key wording.
#[test]
fn test_empty_string_rejected() {
    let reason = reason(normalize_ssh_keys(&RawValue::from("   ")));
    assert!(reason.contains("SSH public key"));
    assert!(reason.contains("required"));
}

/// Verify an empty list is rejected with the required-key wording.
#[test]
fn test_empty_list_rejected() {
    let reason = reason(normalize_ssh_keys(&RawValue::List(Vec::new())));
    assert!(reason.contains("SSH public key"));
    assert!(reason.contains("required"));
}

/// Verify one blank element rejects the whole list.
#[test]
fn test_blank_element_rejects_list() {
    let raw = RawValue::text_list([ED25519_KEY, " "]);
    assert_eq!(reason(normalize_ssh_keys(&raw)), "ssh_public_key[1] is empty");
}

/// Verify a non-string element rejects the whole list.
#[test]
fn test_non_string_element_rejects_list() {
    let raw = RawValue::List(vec![RawValue::from(ED25519_KEY), RawValue::Integer(42)]);
    assert_eq!(
        reason(normalize_ssh_keys(&raw)),
        "ssh_public_key[1] must be a string, got integer"
    );
}

/// Verify scalar shapes other than strings are rejected.
#[test]
fn test_unsupported_shapes_rejected() {
    assert!(reason(normalize_ssh_keys(&RawValue::Bool(true))).contains("got boolean"));
    assert!(
        reason(normalize_ssh_keys(&RawValue::Unsupported("mapping".to_string())))
            .contains("got mapping")
    );
}

// ============================================================================
// Format Tests
// ============================================================================

/// Verify every supported key type is accepted.
#[test]
fn test_supported_key_types_accepted() {
    assert!(is_valid_ssh_key(ED25519_KEY));
    assert!(is_valid_ssh_key(RSA_KEY));
    assert!(is_valid_ssh_key(ECDSA_KEY));
    assert!(is_valid_ssh_key(SK_ECDSA_KEY));
}

/// Verify comments after the blob are allowed.
#[test]
fn test_comment_accepted() {
    assert!(is_valid_ssh_key(&format!("{} alice@workstation", ED25519_KEY)));
    assert!(is_valid_ssh_key(&format!("{} alice laptop key", RSA_KEY)));
}

/// Verify unknown algorithms are rejected.
#[test]
fn test_unknown_key_type_rejected() {
    assert!(!is_valid_ssh_key(
        "ssh-dss AAAAC3NzaC1lZDI1NTE5AAAAIAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8g"
    ));
}

/// Verify the blob only has to be base64; its contents are not inspected.
#[test]
fn test_arbitrary_blob_accepted() {
    assert!(is_valid_ssh_key("ssh-ed25519 QUJDRA== alice"));
    assert!(is_valid_ssh_key(
        "ssh-rsa AAAAC3NzaC1lZDI1NTE5AAAAIAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
    ));
}

/// Verify a blob without its trailing padding is accepted.
#[test]
fn test_unpadded_blob_accepted() {
    assert!(is_valid_ssh_key("ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIDummy"));
    assert!(is_valid_ssh_key("ssh-ed25519 QUJDRA"));
}

/// Verify malformed shapes are rejected.
#[test]
fn test_malformed_keys_rejected() {
    assert!(!is_valid_ssh_key(""));
    assert!(!is_valid_ssh_key("ssh-ed25519"));
    assert!(!is_valid_ssh_key("not-a-key"));
    assert!(!is_valid_ssh_key("ssh-ed25519 !!!notbase64!!!"));
    assert!(!is_valid_ssh_key("ssh-ed25519 AAAAA"));
    assert!(!is_valid_ssh_key("ssh-ed25519 AA==AA"));
}
