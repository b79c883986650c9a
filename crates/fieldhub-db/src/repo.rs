//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use fieldhub_types::{OrganizationRole, PackageKind, ProjectRole, SubscriptionStatus, UserCategory};

use crate::error::DbResult;
use crate::models::*;

/// Account repository trait
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Find an account by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<AccountRow>>;

    /// Find an account by username
    async fn find_by_username(&self, username: &str) -> DbResult<Option<AccountRow>>;

    /// Create a new account
    async fn create(&self, account: CreateAccount) -> DbResult<AccountRow>;

    /// Update the storage bookkeeping for an account
    async fn set_storage_used_mb(&self, id: Uuid, storage_used_mb: i64) -> DbResult<()>;
}

/// Create account input
#[derive(Debug, Clone)]
pub struct CreateAccount {
    pub id: Uuid,
    pub username: String,
    pub category: UserCategory,
}

/// Organization membership repository trait
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Add a member to an organization, updating the role when the member
    /// already exists
    async fn add_member(
        &self,
        organization_id: Uuid,
        member_id: Uuid,
        role: OrganizationRole,
    ) -> DbResult<OrganizationMemberRow>;

    /// List members of an organization
    async fn list_members(&self, organization_id: Uuid) -> DbResult<Vec<OrganizationMemberRow>>;

    /// Count members of an organization
    async fn count_members(&self, organization_id: Uuid) -> DbResult<i64>;
}

/// Project repository trait
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Find a project by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ProjectRow>>;

    /// List projects owned by an account
    async fn list_for_owner(&self, owner_id: Uuid) -> DbResult<Vec<ProjectRow>>;

    /// Create a new project
    async fn create(&self, project: CreateProject) -> DbResult<ProjectRow>;

    /// Add a collaborator to a project
    async fn add_collaborator(
        &self,
        project_id: Uuid,
        account_id: Uuid,
        role: ProjectRole,
    ) -> DbResult<ProjectCollaboratorRow>;

    /// List collaborators of a project
    async fn list_collaborators(&self, project_id: Uuid) -> DbResult<Vec<ProjectCollaboratorRow>>;
}

/// Create project input
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub description: Option<String>,
    pub is_private: bool,
}

/// Plan repository trait
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Find a plan by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PlanRow>>;

    /// Find the default plan for a user category
    async fn find_default(&self, category: UserCategory) -> DbResult<Option<PlanRow>>;

    /// List public plans, ordered by (ordering, display_name, code)
    async fn list_public(&self) -> DbResult<Vec<PlanRow>>;

    /// List all plans, ordered by (ordering, display_name, code)
    async fn list_all(&self) -> DbResult<Vec<PlanRow>>;

    /// Create a new plan; when it is flagged default, every other default
    /// of the same category is unset in the same transaction
    async fn create(&self, plan: CreatePlan) -> DbResult<PlanRow>;

    /// Flag a plan as the default of its category, unsetting every other
    /// default of that category in the same transaction
    async fn set_default(&self, id: Uuid) -> DbResult<PlanRow>;

    /// Seed one autocreated default plan per category, only when no plan
    /// exists at all. Idempotent.
    async fn ensure_defaults(&self, person_code: &str, organization_code: &str) -> DbResult<()>;
}

/// Create plan input
#[derive(Debug, Clone)]
pub struct CreatePlan {
    pub id: Uuid,
    pub code: String,
    pub user_category: UserCategory,
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
}

impl CreatePlan {
    /// New plan input with the model defaults
    pub fn new(
        code: impl Into<String>,
        display_name: impl Into<String>,
        user_category: UserCategory,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.into(),
            user_category,
            ordering: 0,
            display_name: display_name.into(),
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
            max_organization_members: -1,
            max_premium_collaborators_per_private_project: -1,
        }
    }
}

/// Package type repository trait
#[async_trait]
pub trait PackageTypeRepository: Send + Sync {
    /// Find a package type by kind
    async fn find_by_kind(&self, kind: PackageKind) -> DbResult<Option<PackageTypeRow>>;

    /// Return the storage package type, seeding it with the defaults
    /// (1000 MB units, quantities 0..=100) when it does not exist yet
    async fn get_or_create_storage(&self) -> DbResult<PackageTypeRow>;

    /// List all package types
    async fn list_all(&self) -> DbResult<Vec<PackageTypeRow>>;
}

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find a subscription by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Find the subscription whose active period contains `at` for an
    /// account
    async fn find_active_for_account(
        &self,
        account_id: Uuid,
        at: DateTime<Utc>,
    ) -> DbResult<Option<SubscriptionRow>>;

    /// List all subscriptions of an account, newest first
    async fn list_for_account(&self, account_id: Uuid) -> DbResult<Vec<SubscriptionRow>>;

    /// Create a new subscription
    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow>;

    /// Update only the lifecycle status of a subscription
    async fn update_status(&self, id: Uuid, status: SubscriptionStatus) -> DbResult<()>;

    /// Apply `change` to a subscription under a row lock, after closing
    /// every other subscription of the same account that is active at
    /// `at` (their `active_until` becomes `change.active_since` and their
    /// status cancelled). All-or-nothing.
    async fn update_exclusive(
        &self,
        id: Uuid,
        change: SubscriptionChange,
        at: DateTime<Utc>,
    ) -> DbResult<SubscriptionRow>;
}

/// Create subscription input
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub id: Uuid,
    pub account_id: Uuid,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
    pub active_since: Option<DateTime<Utc>>,
    pub active_until: Option<DateTime<Utc>>,
}

/// Field set applied by [`SubscriptionRepository::update_exclusive`]
#[derive(Debug, Clone)]
pub struct SubscriptionChange {
    pub status: SubscriptionStatus,
    /// New start of the active period. Other active subscriptions of the
    /// account are closed at this instant (falling back to `at` when the
    /// change carries no period start).
    pub active_since: Option<DateTime<Utc>>,
    pub active_until: Option<DateTime<Utc>>,
    pub requested_cancel_at: Option<DateTime<Utc>>,
    pub billing_cycle_anchor_at: Option<DateTime<Utc>>,
    pub current_period_since: Option<DateTime<Utc>>,
    pub current_period_until: Option<DateTime<Utc>>,
}

impl SubscriptionChange {
    /// Change carrying only a status and activation instant
    pub fn new(status: SubscriptionStatus, active_since: DateTime<Utc>) -> Self {
        Self {
            status,
            active_since: Some(active_since),
            active_until: None,
            requested_cancel_at: None,
            billing_cycle_anchor_at: None,
            current_period_since: None,
            current_period_until: None,
        }
    }
}

/// Package repository trait
#[async_trait]
pub trait PackageRepository: Send + Sync {
    /// Find the package of a type active at `at` for a subscription.
    /// Packages only count as active while the subscription's plan is
    /// premium.
    async fn find_active(
        &self,
        subscription_id: Uuid,
        type_id: Uuid,
        at: DateTime<Utc>,
    ) -> DbResult<Option<PackageRow>>;

    /// Find the next package of a type scheduled after `at`
    async fn find_future(
        &self,
        subscription_id: Uuid,
        type_id: Uuid,
        at: DateTime<Utc>,
    ) -> DbResult<Option<PackageRow>>;

    /// List all packages of a subscription, oldest first
    async fn list_for_subscription(&self, subscription_id: Uuid) -> DbResult<Vec<PackageRow>>;

    /// Supersede the active package of a type: pending future packages
    /// (relative to `at`) are deleted, the active one is closed at
    /// `active_since`, and a new package is opened there when
    /// `quantity > 0`. All-or-nothing.
    async fn replace_active(
        &self,
        subscription_id: Uuid,
        type_id: Uuid,
        quantity: i64,
        active_since: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> DbResult<PackageReplacement>;
}

/// Outcome of [`PackageRepository::replace_active`]
#[derive(Debug, Clone)]
pub struct PackageReplacement {
    /// The package that was closed, if one was active
    pub closed: Option<PackageRow>,
    /// The newly opened package, when quantity was positive
    pub created: Option<PackageRow>,
}
