//! Collaboration role types
//!
//! Roles are choice fields: a stable snake_case code stored in the
//! database and a display label used on the wire. Decoding accepts the
//! label and reports the acceptable labels on mismatch.

use serde::{Deserialize, Serialize};

use crate::error::InvalidChoice;

/// Role of a collaborator within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    /// Full control, including collaborator management
    Admin,
    /// Manage project settings and data
    Manager,
    /// Edit project data
    Editor,
    /// Submit changes for review
    Reporter,
    /// Read-only access
    Reader,
}

impl ProjectRole {
    /// All roles, most privileged first
    pub const ALL: [ProjectRole; 5] = [
        Self::Admin,
        Self::Manager,
        Self::Editor,
        Self::Reporter,
        Self::Reader,
    ];

    /// Acceptable display labels
    pub const LABELS: &'static [&'static str] =
        &["Admin", "Manager", "Editor", "Reporter", "Reader"];

    /// Code stored in the database
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Editor => "editor",
            Self::Reporter => "reporter",
            Self::Reader => "reader",
        }
    }

    /// Display label
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Manager => "Manager",
            Self::Editor => "Editor",
            Self::Reporter => "Reporter",
            Self::Reader => "Reader",
        }
    }

    /// Decode a display label
    pub fn from_label(label: &str) -> Result<Self, InvalidChoice> {
        Self::ALL
            .into_iter()
            .find(|role| role.label() == label)
            .ok_or_else(|| InvalidChoice::new("role", label, Self::LABELS))
    }
}

impl std::fmt::Display for ProjectRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProjectRole {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| InvalidChoice::new("role", s, Self::LABELS))
    }
}

/// Role of a member within an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationRole {
    /// Manage the organization and its projects
    Admin,
    /// Regular member
    Member,
}

impl OrganizationRole {
    /// All roles
    pub const ALL: [OrganizationRole; 2] = [Self::Admin, Self::Member];

    /// Acceptable display labels
    pub const LABELS: &'static [&'static str] = &["Admin", "Member"];

    /// Code stored in the database
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    /// Display label
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Member => "Member",
        }
    }

    /// Decode a display label
    pub fn from_label(label: &str) -> Result<Self, InvalidChoice> {
        Self::ALL
            .into_iter()
            .find(|role| role.label() == label)
            .ok_or_else(|| InvalidChoice::new("role", label, Self::LABELS))
    }
}

impl std::fmt::Display for OrganizationRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrganizationRole {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| InvalidChoice::new("role", s, Self::LABELS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_role_labels_round_trip() {
        for role in ProjectRole::ALL {
            assert_eq!(ProjectRole::from_label(role.label()).unwrap(), role);
            assert_eq!(role.as_str().parse::<ProjectRole>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_label_reports_acceptable_values() {
        let err = ProjectRole::from_label("Owner").unwrap_err();
        assert_eq!(err.field, "role");
        assert_eq!(err.acceptable, ProjectRole::LABELS);
        assert!(err.to_string().contains("Admin"));
    }

    #[test]
    fn organization_role_labels_round_trip() {
        for role in OrganizationRole::ALL {
            assert_eq!(OrganizationRole::from_label(role.label()).unwrap(), role);
        }
        assert!(OrganizationRole::from_label("Reader").is_err());
    }
}
