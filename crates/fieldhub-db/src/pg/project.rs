//! PostgreSQL project repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use fieldhub_types::ProjectRole;

use crate::error::DbResult;
use crate::models::{ProjectCollaboratorRow, ProjectRow};
use crate::repo::{CreateProject, ProjectRepository};

/// PostgreSQL project repository
#[derive(Clone)]
pub struct PgProjectRepository {
    pool: PgPool,
}

impl PgProjectRepository {
    /// Create a new project repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ProjectRow>> {
        let project = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, name, owner_id, description, is_private, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> DbResult<Vec<ProjectRow>> {
        let projects = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, name, owner_id, description, is_private, created_at, updated_at
            FROM projects
            WHERE owner_id = $1
            ORDER BY name
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    async fn create(&self, project: CreateProject) -> DbResult<ProjectRow> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            INSERT INTO projects (id, name, owner_id, description, is_private)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, owner_id, description, is_private, created_at, updated_at
            "#,
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(project.owner_id)
        .bind(&project.description)
        .bind(project.is_private)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn add_collaborator(
        &self,
        project_id: Uuid,
        account_id: Uuid,
        role: ProjectRole,
    ) -> DbResult<ProjectCollaboratorRow> {
        let row = sqlx::query_as::<_, ProjectCollaboratorRow>(
            r#"
            INSERT INTO project_collaborators (project_id, account_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (project_id, account_id) DO UPDATE SET role = EXCLUDED.role
            RETURNING project_id, account_id, role, created_at
            "#,
        )
        .bind(project_id)
        .bind(account_id)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_collaborators(&self, project_id: Uuid) -> DbResult<Vec<ProjectCollaboratorRow>> {
        let rows = sqlx::query_as::<_, ProjectCollaboratorRow>(
            r#"
            SELECT project_id, account_id, role, created_at
            FROM project_collaborators
            WHERE project_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
