//! Account types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::InvalidChoice;
use crate::OrganizationRole;

/// Unique account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub Uuid);

impl AccountId {
    /// Create a new random account ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an account ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for AccountId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Category of account a plan applies to
///
/// Only persons and organizations exist; plans, default-plan selection and
/// trial caps are all keyed by this category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserCategory {
    /// An individual user
    Person,
    /// An organization owned by a person
    Organization,
}

impl UserCategory {
    /// All categories, in code order
    pub const ALL: [UserCategory; 2] = [Self::Person, Self::Organization];

    /// Acceptable wire values
    pub const ACCEPTABLE: &'static [&'static str] = &["person", "organization"];

    /// Numeric code stored in the database
    pub const fn code(&self) -> i16 {
        match self {
            Self::Person => 1,
            Self::Organization => 2,
        }
    }

    /// Wire code
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Organization => "organization",
        }
    }

    /// Human-readable label
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::Organization => "Organization",
        }
    }

    /// Decode the database code
    pub fn from_code(code: i16) -> Result<Self, InvalidChoice> {
        match code {
            1 => Ok(Self::Person),
            2 => Ok(Self::Organization),
            other => Err(InvalidChoice::new(
                "user category",
                other.to_string(),
                Self::ACCEPTABLE,
            )),
        }
    }
}

impl std::fmt::Display for UserCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UserCategory {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "person" => Ok(Self::Person),
            "organization" | "org" => Ok(Self::Organization),
            other => Err(InvalidChoice::new(
                "user category",
                other,
                Self::ACCEPTABLE,
            )),
        }
    }
}

/// An account belonging to an organization with a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationMember {
    /// The organization account
    pub organization_id: AccountId,
    /// The member account
    pub member_id: AccountId,
    /// Role within the organization
    pub role: OrganizationRole,
    /// When the member was added
    pub created_at: DateTime<Utc>,
}

/// A person or organization holding projects and a subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Account ID
    pub id: AccountId,
    /// Unique username
    pub username: String,
    /// Person or organization
    pub category: UserCategory,
    /// Storage currently consumed by the account's projects, in megabytes
    pub storage_used_mb: i64,
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_codes_round_trip() {
        for category in UserCategory::ALL {
            assert_eq!(UserCategory::from_code(category.code()).unwrap(), category);
        }
    }

    #[test]
    fn unknown_category_code_lists_acceptable_values() {
        let err = UserCategory::from_code(3).unwrap_err();
        assert_eq!(err.acceptable, UserCategory::ACCEPTABLE);
    }

    #[test]
    fn category_parses_from_wire_code() {
        assert_eq!(
            "organization".parse::<UserCategory>().unwrap(),
            UserCategory::Organization
        );
        assert!("robot".parse::<UserCategory>().is_err());
    }
}
