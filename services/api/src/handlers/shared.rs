//! Shared handler utilities
//!
//! Common validation and metrics helpers used across handlers.

use std::time::Instant;

use crate::error::ApiError;

/// Maximum length for usernames
const MAX_USERNAME_LEN: usize = 64;

/// Maximum length for project names
const MAX_PROJECT_NAME_LEN: usize = 128;

/// Validate a username for safe use as an identifier.
///
/// Allows alphanumeric, underscore and hyphen; must start with a letter or
/// underscore.
pub fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.is_empty() {
        return Err(ApiError::validation("username", "Username cannot be empty"));
    }

    if username.len() > MAX_USERNAME_LEN {
        return Err(ApiError::validation(
            "username",
            format!("Username too long (max {MAX_USERNAME_LEN} chars)"),
        ));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiError::validation(
            "username",
            "Username contains invalid characters (use alphanumeric, _, -)",
        ));
    }

    if let Some(first) = username.chars().next() {
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(ApiError::validation(
                "username",
                "Username must start with a letter or underscore",
            ));
        }
    }

    Ok(())
}

/// Validate a project name: non-empty, bounded, no control characters.
pub fn validate_project_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::validation("name", "Project name cannot be empty"));
    }

    if name.len() > MAX_PROJECT_NAME_LEN {
        return Err(ApiError::validation(
            "name",
            format!("Project name too long (max {MAX_PROJECT_NAME_LEN} chars)"),
        ));
    }

    if name.chars().any(char::is_control) {
        return Err(ApiError::validation(
            "name",
            "Project name contains control characters",
        ));
    }

    Ok(())
}

/// Record operation duration with result label.
///
/// Labels: operation, result (ok/err)
#[inline]
pub fn record_op_duration(operation: &'static str, start: Instant, success: bool) {
    let result = if success { "ok" } else { "err" };
    metrics::histogram!(
        "billing_operation_duration_seconds",
        "operation" => operation,
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username_valid() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("field_crew-2").is_ok());
        assert!(validate_username("_survey").is_ok());
        assert!(validate_username("A").is_ok());
    }

    #[test]
    fn test_validate_username_invalid() {
        // Empty
        assert!(validate_username("").is_err());

        // Too long
        let long_name = "a".repeat(MAX_USERNAME_LEN + 1);
        assert!(validate_username(&long_name).is_err());

        // Invalid characters
        assert!(validate_username("alice bob").is_err());
        assert!(validate_username("alice@example").is_err());
        assert!(validate_username("alice\n").is_err());

        // Doesn't start with letter/underscore
        assert!(validate_username("1alice").is_err());
        assert!(validate_username("-alice").is_err());
    }

    #[test]
    fn test_validate_project_name() {
        assert!(validate_project_name("Flood Survey 2023").is_ok());
        assert!(validate_project_name("").is_err());
        assert!(validate_project_name("   ").is_err());
        assert!(validate_project_name("bad\u{0007}name").is_err());

        let long_name = "a".repeat(MAX_PROJECT_NAME_LEN + 1);
        assert!(validate_project_name(&long_name).is_err());
    }
}
