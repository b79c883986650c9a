//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.
//! Choice columns are stored as their codes and decoded into the typed
//! enums from `fieldhub-types` on conversion.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use fieldhub_types::{
    Account, AccountId, OrganizationMember, OrganizationRole, Package, PackageId, PackageKind,
    PackageType, PackageTypeId, Plan, PlanId, Project, ProjectCollaborator, ProjectId,
    ProjectRole, Subscription, SubscriptionId, SubscriptionStatus, UserCategory,
};

use crate::error::DbResult;

/// Account row from the database
#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub username: String,
    pub category: i16,
    pub storage_used_mb: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountRow {
    /// Convert to the domain account
    pub fn into_account(self) -> DbResult<Account> {
        Ok(Account {
            id: AccountId(self.id),
            username: self.username,
            category: UserCategory::from_code(self.category)?,
            storage_used_mb: self.storage_used_mb,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Organization member row from the database
#[derive(Debug, Clone, FromRow)]
pub struct OrganizationMemberRow {
    pub organization_id: Uuid,
    pub member_id: Uuid,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl OrganizationMemberRow {
    /// Convert to the domain organization member
    pub fn into_member(self) -> DbResult<OrganizationMember> {
        Ok(OrganizationMember {
            organization_id: AccountId(self.organization_id),
            member_id: AccountId(self.member_id),
            role: self.role.parse::<OrganizationRole>()?,
            created_at: self.created_at,
        })
    }
}

/// Project row from the database
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub description: Option<String>,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectRow {
    /// Convert to the domain project
    pub fn into_project(self) -> Project {
        Project {
            id: ProjectId(self.id),
            name: self.name,
            owner_id: AccountId(self.owner_id),
            description: self.description,
            is_private: self.is_private,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Project collaborator row from the database
#[derive(Debug, Clone, FromRow)]
pub struct ProjectCollaboratorRow {
    pub project_id: Uuid,
    pub account_id: Uuid,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl ProjectCollaboratorRow {
    /// Convert to the domain collaborator
    pub fn into_collaborator(self) -> DbResult<ProjectCollaborator> {
        Ok(ProjectCollaborator {
            project_id: ProjectId(self.project_id),
            account_id: AccountId(self.account_id),
            role: self.role.parse::<ProjectRole>()?,
            created_at: self.created_at,
        })
    }
}

/// Plan row from the database
#[derive(Debug, Clone, FromRow)]
pub struct PlanRow {
    pub id: Uuid,
    pub code: String,
    pub user_category: i16,
    pub ordering: i32,
    pub display_name: String,
    pub storage_mb: i64,
    pub storage_keep_versions: i64,
    pub job_minutes: i64,
    pub synchronizations_per_month: i64,
    pub can_add_storage: bool,
    pub can_add_job_minutes: bool,
    pub is_external_db_supported: bool,
    pub is_premium: bool,
    pub is_public: bool,
    pub is_default: bool,
    pub is_trial: bool,
    pub max_trial_organizations: i64,
    pub max_organization_members: i64,
    pub max_premium_collaborators_per_private_project: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlanRow {
    /// Convert to the domain plan
    pub fn into_plan(self) -> DbResult<Plan> {
        Ok(Plan {
            id: PlanId(self.id),
            code: self.code,
            user_category: UserCategory::from_code(self.user_category)?,
            ordering: self.ordering,
            display_name: self.display_name,
            storage_mb: self.storage_mb,
            storage_keep_versions: self.storage_keep_versions,
            job_minutes: self.job_minutes,
            synchronizations_per_month: self.synchronizations_per_month,
            can_add_storage: self.can_add_storage,
            can_add_job_minutes: self.can_add_job_minutes,
            is_external_db_supported: self.is_external_db_supported,
            is_premium: self.is_premium,
            is_public: self.is_public,
            is_default: self.is_default,
            is_trial: self.is_trial,
            max_trial_organizations: self.max_trial_organizations,
            max_organization_members: self.max_organization_members,
            max_premium_collaborators_per_private_project: self
                .max_premium_collaborators_per_private_project,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Package type row from the database
#[derive(Debug, Clone, FromRow)]
pub struct PackageTypeRow {
    pub id: Uuid,
    pub code: String,
    pub display_name: String,
    pub kind: String,
    pub is_public: bool,
    pub min_quantity: i64,
    pub max_quantity: i64,
    pub unit_amount: i64,
    pub unit_label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PackageTypeRow {
    /// Convert to the domain package type
    pub fn into_package_type(self) -> DbResult<PackageType> {
        Ok(PackageType {
            id: PackageTypeId(self.id),
            code: self.code,
            display_name: self.display_name,
            kind: self.kind.parse::<PackageKind>()?,
            is_public: self.is_public,
            min_quantity: self.min_quantity,
            max_quantity: self.max_quantity,
            unit_amount: self.unit_amount,
            unit_label: self.unit_label,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Subscription row from the database
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub account_id: Uuid,
    pub plan_id: Uuid,
    pub status: String,
    pub requested_cancel_at: Option<DateTime<Utc>>,
    pub active_since: Option<DateTime<Utc>>,
    pub active_until: Option<DateTime<Utc>>,
    pub billing_cycle_anchor_at: Option<DateTime<Utc>>,
    pub current_period_since: Option<DateTime<Utc>>,
    pub current_period_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionRow {
    /// Convert to the domain subscription
    pub fn into_subscription(self) -> DbResult<Subscription> {
        Ok(Subscription {
            id: SubscriptionId(self.id),
            account_id: AccountId(self.account_id),
            plan_id: PlanId(self.plan_id),
            status: self.status.parse::<SubscriptionStatus>()?,
            requested_cancel_at: self.requested_cancel_at,
            active_since: self.active_since,
            active_until: self.active_until,
            billing_cycle_anchor_at: self.billing_cycle_anchor_at,
            current_period_since: self.current_period_since,
            current_period_until: self.current_period_until,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Package row from the database
#[derive(Debug, Clone, FromRow)]
pub struct PackageRow {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub type_id: Uuid,
    pub quantity: i64,
    pub active_since: DateTime<Utc>,
    pub active_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PackageRow {
    /// Convert to the domain package
    pub fn into_package(self) -> Package {
        Package {
            id: PackageId(self.id),
            subscription_id: SubscriptionId(self.subscription_id),
            type_id: PackageTypeId(self.type_id),
            quantity: self.quantity,
            active_since: self.active_since,
            active_until: self.active_until,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
