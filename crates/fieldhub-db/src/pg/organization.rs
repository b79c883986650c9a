//! PostgreSQL organization membership repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use fieldhub_types::OrganizationRole;

use crate::error::DbResult;
use crate::models::OrganizationMemberRow;
use crate::repo::OrganizationRepository;

/// PostgreSQL organization membership repository
#[derive(Clone)]
pub struct PgOrganizationRepository {
    pool: PgPool,
}

impl PgOrganizationRepository {
    /// Create a new organization membership repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationRepository for PgOrganizationRepository {
    async fn add_member(
        &self,
        organization_id: Uuid,
        member_id: Uuid,
        role: OrganizationRole,
    ) -> DbResult<OrganizationMemberRow> {
        let row = sqlx::query_as::<_, OrganizationMemberRow>(
            r#"
            INSERT INTO organization_members (organization_id, member_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (organization_id, member_id) DO UPDATE SET role = EXCLUDED.role
            RETURNING organization_id, member_id, role, created_at
            "#,
        )
        .bind(organization_id)
        .bind(member_id)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_members(&self, organization_id: Uuid) -> DbResult<Vec<OrganizationMemberRow>> {
        let rows = sqlx::query_as::<_, OrganizationMemberRow>(
            r#"
            SELECT organization_id, member_id, role, created_at
            FROM organization_members
            WHERE organization_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count_members(&self, organization_id: Uuid) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM organization_members WHERE organization_id = $1",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
