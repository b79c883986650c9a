//! Project and collaboration types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AccountId, ProjectRole};

/// Unique project identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub Uuid);

impl ProjectId {
    /// Create a new random project ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a project ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ProjectId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A GIS project owned by an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Project ID
    pub id: ProjectId,
    /// Project name, unique per owner
    pub name: String,
    /// Owning account
    pub owner_id: AccountId,
    /// Free-form description
    pub description: Option<String>,
    /// Visible only to the owner and collaborators
    pub is_private: bool,
    /// When the project was created
    pub created_at: DateTime<Utc>,
    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

/// An account collaborating on a project with a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCollaborator {
    /// The project collaborated on
    pub project_id: ProjectId,
    /// The collaborating account
    pub account_id: AccountId,
    /// Role within the project
    pub role: ProjectRole,
    /// When the collaborator was added
    pub created_at: DateTime<Utc>,
}
