//! Common error types

use thiserror::Error;

/// Error decoding a choice field from its code or display label.
///
/// Carries the acceptable values so API layers can surface them verbatim
/// in validation responses.
#[derive(Debug, Clone, Error)]
#[error("invalid {field}: {value:?} (acceptable values are {acceptable:?})")]
pub struct InvalidChoice {
    /// Name of the choice field
    pub field: &'static str,
    /// The rejected input
    pub value: String,
    /// Values the field accepts
    pub acceptable: &'static [&'static str],
}

impl InvalidChoice {
    /// Create a new choice error
    pub fn new(
        field: &'static str,
        value: impl Into<String>,
        acceptable: &'static [&'static str],
    ) -> Self {
        Self {
            field,
            value: value.into(),
            acceptable,
        }
    }
}
