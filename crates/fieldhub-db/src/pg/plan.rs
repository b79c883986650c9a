//! PostgreSQL plan repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use fieldhub_types::UserCategory;

use crate::error::{DbError, DbResult};
use crate::models::PlanRow;
use crate::repo::{CreatePlan, PlanRepository};

const PLAN_COLUMNS: &str = "id, code, user_category, ordering, display_name, storage_mb, \
     storage_keep_versions, job_minutes, synchronizations_per_month, can_add_storage, \
     can_add_job_minutes, is_external_db_supported, is_premium, is_public, is_default, \
     is_trial, max_trial_organizations, max_organization_members, \
     max_premium_collaborators_per_private_project, created_at, updated_at";

/// PostgreSQL plan repository
#[derive(Clone)]
pub struct PgPlanRepository {
    pool: PgPool,
}

impl PgPlanRepository {
    /// Create a new plan repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert<'e, E>(executor: E, plan: &CreatePlan) -> DbResult<PlanRow>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let sql = format!(
            r#"
            INSERT INTO plans (id, code, user_category, ordering, display_name, storage_mb,
                               storage_keep_versions, job_minutes, synchronizations_per_month,
                               can_add_storage, can_add_job_minutes, is_external_db_supported,
                               is_premium, is_public, is_default, is_trial,
                               max_trial_organizations, max_organization_members,
                               max_premium_collaborators_per_private_project)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19)
            RETURNING {PLAN_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, PlanRow>(&sql)
            .bind(plan.id)
            .bind(&plan.code)
            .bind(plan.user_category.code())
            .bind(plan.ordering)
            .bind(&plan.display_name)
            .bind(plan.storage_mb)
            .bind(plan.storage_keep_versions)
            .bind(plan.job_minutes)
            .bind(plan.synchronizations_per_month)
            .bind(plan.can_add_storage)
            .bind(plan.can_add_job_minutes)
            .bind(plan.is_external_db_supported)
            .bind(plan.is_premium)
            .bind(plan.is_public)
            .bind(plan.is_default)
            .bind(plan.is_trial)
            .bind(plan.max_trial_organizations)
            .bind(plan.max_organization_members)
            .bind(plan.max_premium_collaborators_per_private_project)
            .fetch_one(executor)
            .await?;

        Ok(row)
    }
}

#[async_trait]
impl PlanRepository for PgPlanRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PlanRow>> {
        let sql = format!("SELECT {PLAN_COLUMNS} FROM plans WHERE id = $1");
        let plan = sqlx::query_as::<_, PlanRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(plan)
    }

    async fn find_default(&self, category: UserCategory) -> DbResult<Option<PlanRow>> {
        let sql = format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE user_category = $1 AND is_default LIMIT 1"
        );
        let plan = sqlx::query_as::<_, PlanRow>(&sql)
            .bind(category.code())
            .fetch_optional(&self.pool)
            .await?;

        Ok(plan)
    }

    async fn list_public(&self) -> DbResult<Vec<PlanRow>> {
        let sql = format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE is_public \
             ORDER BY ordering, display_name, code"
        );
        let plans = sqlx::query_as::<_, PlanRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(plans)
    }

    async fn list_all(&self) -> DbResult<Vec<PlanRow>> {
        let sql =
            format!("SELECT {PLAN_COLUMNS} FROM plans ORDER BY ordering, display_name, code");
        let plans = sqlx::query_as::<_, PlanRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(plans)
    }

    async fn create(&self, plan: CreatePlan) -> DbResult<PlanRow> {
        let mut tx = self.pool.begin().await?;

        if plan.is_default {
            sqlx::query(
                "UPDATE plans SET is_default = FALSE, updated_at = NOW() \
                 WHERE user_category = $1 AND is_default",
            )
            .bind(plan.user_category.code())
            .execute(&mut *tx)
            .await?;
        }

        let row = Self::insert(&mut *tx, &plan).await?;
        tx.commit().await?;

        Ok(row)
    }

    async fn set_default(&self, id: Uuid) -> DbResult<PlanRow> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {PLAN_COLUMNS} FROM plans WHERE id = $1 FOR UPDATE");
        let plan = sqlx::query_as::<_, PlanRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?;

        sqlx::query(
            "UPDATE plans SET is_default = FALSE, updated_at = NOW() \
             WHERE user_category = $1 AND id <> $2 AND is_default",
        )
        .bind(plan.user_category)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let sql = format!(
            "UPDATE plans SET is_default = TRUE, updated_at = NOW() \
             WHERE id = $1 RETURNING {PLAN_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PlanRow>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row)
    }

    async fn ensure_defaults(&self, person_code: &str, organization_code: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM plans")
            .fetch_one(&mut *tx)
            .await?;

        if count == 0 {
            let person = CreatePlan {
                display_name: "default user (autocreated)".to_string(),
                is_default: true,
                ..CreatePlan::new(person_code, "", UserCategory::Person)
            };
            let organization = CreatePlan {
                display_name: "default organization (autocreated)".to_string(),
                is_default: true,
                ..CreatePlan::new(organization_code, "", UserCategory::Organization)
            };

            Self::insert(&mut *tx, &person).await?;
            Self::insert(&mut *tx, &organization).await?;
        }

        tx.commit().await?;

        Ok(())
    }
}
