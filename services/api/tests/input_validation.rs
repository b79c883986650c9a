//! Input validation tests
//!
//! Tests for request-level validation in fieldhub-api: identifier rules
//! (mirroring the handler logic, which lives in the service binary) and
//! the choice-field decoding the handlers delegate to fieldhub-types.

use fieldhub_types::{ProjectRole, SubscriptionStatus, UserCategory};

/// Maximum length for usernames (must match handler constant)
const MAX_USERNAME_LEN: usize = 64;

/// Validate a username (mirrors the handler logic for testing)
fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.is_empty() {
        return Err("Username cannot be empty");
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err("Username too long");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err("Invalid characters in username");
    }
    if let Some(first) = username.chars().next() {
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err("Username must start with a letter or underscore");
        }
    }
    Ok(())
}

// ============================================================================
// Username Rules
// ============================================================================

#[test]
fn test_valid_usernames() {
    assert!(validate_username("alice").is_ok());
    assert!(validate_username("survey_team").is_ok());
    assert!(validate_username("crew-42").is_ok());
    assert!(validate_username("_internal").is_ok());
}

#[test]
fn test_invalid_usernames() {
    assert!(validate_username("").is_err());
    assert!(validate_username(&"a".repeat(MAX_USERNAME_LEN + 1)).is_err());
    assert!(validate_username("alice bob").is_err());
    assert!(validate_username("alice@example.com").is_err());
    assert!(validate_username("42crew").is_err());
    assert!(validate_username("-alice").is_err());
}

// ============================================================================
// Choice Fields
// ============================================================================

#[test]
fn test_role_labels_decode() {
    assert_eq!(ProjectRole::from_label("Editor").unwrap(), ProjectRole::Editor);
    assert_eq!(ProjectRole::from_label("Reader").unwrap(), ProjectRole::Reader);
}

#[test]
fn test_unknown_role_label_reports_choices() {
    let err = ProjectRole::from_label("Owner").unwrap_err();
    assert_eq!(err.field, "role");
    assert_eq!(
        err.acceptable,
        &["Admin", "Manager", "Editor", "Reporter", "Reader"]
    );
}

#[test]
fn test_category_decodes_from_wire_value() {
    assert_eq!("person".parse::<UserCategory>().unwrap(), UserCategory::Person);
    assert_eq!(
        "organization".parse::<UserCategory>().unwrap(),
        UserCategory::Organization
    );

    let err = "bot".parse::<UserCategory>().unwrap_err();
    assert_eq!(err.acceptable, &["person", "organization"]);
}

#[test]
fn test_subscription_status_codes_round_trip() {
    for status in SubscriptionStatus::ALL {
        assert_eq!(
            status.as_str().parse::<SubscriptionStatus>().unwrap(),
            status
        );
    }
    assert!("paused".parse::<SubscriptionStatus>().is_err());
}
