//! Subscription plan types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::UserCategory;

/// Unique plan identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanId(pub Uuid);

impl PlanId {
    /// Create a new random plan ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PlanId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A billing tier defining resource limits and capability flags.
///
/// At most one plan per user category carries `is_default`; writes that set
/// the flag unset it on every other plan of the same category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Plan ID
    pub id: PlanId,
    /// Unique identifier of the plan
    pub code: String,
    /// The plan is applicable only to accounts of this category
    pub user_category: UserCategory,
    /// Relative ordering, lower values first; ties break on display name
    /// then code
    pub ordering: i32,
    /// Human-readable name
    pub display_name: String,
    /// Included storage, in megabytes
    pub storage_mb: i64,
    /// Number of old file versions kept
    pub storage_keep_versions: i64,
    /// Included processing job minutes per month
    pub job_minutes: i64,
    /// Included synchronizations per month
    pub synchronizations_per_month: i64,
    /// Extra storage packages may be purchased
    pub can_add_storage: bool,
    /// Extra job-minute packages may be purchased
    pub can_add_job_minutes: bool,
    /// External database connections are supported
    pub is_external_db_supported: bool,
    /// Premium plan; prerequisite for carrying extra packages
    pub is_premium: bool,
    /// Visible to non-admin users
    pub is_public: bool,
    /// Assigned to new accounts of the category by default
    pub is_default: bool,
    /// Trial plan
    pub is_trial: bool,
    /// Maximum trial organizations the account may create, -1 = unlimited
    pub max_trial_organizations: i64,
    /// Maximum organization members, -1 = unlimited. Existing members over
    /// the cap remain active when a plan change lowers it.
    pub max_organization_members: i64,
    /// Maximum premium collaborators per private project, -1 = unlimited
    pub max_premium_collaborators_per_private_project: i64,
    /// When the plan was created
    pub created_at: DateTime<Utc>,
    /// When the plan was last updated
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    /// Organization member cap, `None` = unlimited
    pub fn member_limit(&self) -> Option<i64> {
        (self.max_organization_members >= 0).then_some(self.max_organization_members)
    }

    /// Premium collaborator cap for private projects, `None` = unlimited
    pub fn premium_collaborator_limit(&self) -> Option<i64> {
        (self.max_premium_collaborators_per_private_project >= 0)
            .then_some(self.max_premium_collaborators_per_private_project)
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.display_name, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_with_member_cap(cap: i64) -> Plan {
        Plan {
            id: PlanId::new(),
            code: "test".to_string(),
            user_category: UserCategory::Organization,
            ordering: 0,
            display_name: "Test".to_string(),
            storage_mb: 10,
            storage_keep_versions: 10,
            job_minutes: 10,
            synchronizations_per_month: 30,
            can_add_storage: false,
            can_add_job_minutes: false,
            is_external_db_supported: false,
            is_premium: false,
            is_public: false,
            is_default: false,
            is_trial: false,
            max_trial_organizations: 1,
            max_organization_members: cap,
            max_premium_collaborators_per_private_project: -1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn negative_caps_mean_unlimited() {
        assert_eq!(plan_with_member_cap(-1).member_limit(), None);
        assert_eq!(plan_with_member_cap(0).member_limit(), Some(0));
        assert_eq!(plan_with_member_cap(25).member_limit(), Some(25));
    }
}
