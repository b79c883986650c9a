//! Project and collaborator handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fieldhub_db::{AccountRepository, CreateProject, ProjectRepository};
use fieldhub_types::{Project, ProjectCollaborator, ProjectRole};

use crate::error::{ApiError, ApiResult};
use crate::handlers::shared::{validate_project_name, validate_username};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    /// Username of the owning account
    pub owner: String,
    pub description: Option<String>,
    #[serde(default = "default_private")]
    pub private: bool,
}

fn default_private() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ListProjectsQuery {
    pub owner: String,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub description: Option<String>,
    pub private: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl ProjectResponse {
    fn new(project: Project, owner: String) -> Self {
        Self {
            id: project.id.to_string(),
            name: project.name,
            owner,
            description: project.description,
            private: project.is_private,
            created_at: project.created_at.to_rfc3339(),
            updated_at: project.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddCollaboratorRequest {
    /// Username of the collaborating account
    pub collaborator: String,
    /// Role display label, e.g. "Editor"
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct CollaboratorResponse {
    pub collaborator: String,
    pub role: String,
}

impl CollaboratorResponse {
    fn new(collaborator: ProjectCollaborator, username: String) -> Self {
        Self {
            collaborator: username,
            role: collaborator.role.label().to_string(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/projects
pub async fn create_project(
    State(state): State<AppState>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    validate_project_name(&req.name)?;

    let owner = state
        .repos
        .accounts
        .find_by_username(&req.owner)
        .await?
        .ok_or_else(|| ApiError::validation("owner", "Invalid owner username"))?
        .into_account()?;

    let row = state
        .repos
        .projects
        .create(CreateProject {
            id: Uuid::new_v4(),
            name: req.name,
            owner_id: owner.id.0,
            description: req.description,
            is_private: req.private,
        })
        .await?;
    let project = row.into_project();

    tracing::info!(project_id = %project.id, owner = %owner.username, "project created");

    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse::new(project, owner.username)),
    ))
}

/// GET /api/v1/projects?owner={username}
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListProjectsQuery>,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    let owner = state
        .repos
        .accounts
        .find_by_username(&query.owner)
        .await?
        .ok_or(ApiError::AccountNotFound)?
        .into_account()?;

    let projects = state
        .repos
        .projects
        .list_for_owner(owner.id.0)
        .await?
        .into_iter()
        .map(|row| ProjectResponse::new(row.into_project(), owner.username.clone()))
        .collect();

    Ok(Json(projects))
}

/// POST /api/v1/projects/{id}/collaborators
pub async fn add_collaborator(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<AddCollaboratorRequest>,
) -> ApiResult<(StatusCode, Json<CollaboratorResponse>)> {
    validate_username(&req.collaborator)?;
    let role = ProjectRole::from_label(&req.role)?;

    let project = state
        .repos
        .projects
        .find_by_id(project_id)
        .await?
        .ok_or(ApiError::ProjectNotFound)?
        .into_project();

    let collaborator = state
        .repos
        .accounts
        .find_by_username(&req.collaborator)
        .await?
        .ok_or_else(|| ApiError::validation("collaborator", "Invalid collaborator username"))?
        .into_account()?;

    // Private projects are capped by the owner plan's collaborator limit.
    // Collaborators already over the cap after a downgrade stay active.
    if project.is_private {
        let subscription = state
            .ledger
            .get_or_create_active_subscription(project.owner_id)
            .await?;
        let plan = state.ledger.plan(&subscription).await?;

        if let Some(limit) = plan.premium_collaborator_limit() {
            let current = state
                .repos
                .projects
                .list_collaborators(project.id.0)
                .await?
                .len() as i64;
            if current >= limit {
                return Err(ApiError::Conflict(format!(
                    "collaborator limit ({limit}) reached for private projects"
                )));
            }
        }
    }

    let row = state
        .repos
        .projects
        .add_collaborator(project.id.0, collaborator.id.0, role)
        .await?
        .into_collaborator()?;

    tracing::info!(
        project_id = %project.id,
        collaborator = %collaborator.username,
        role = %role,
        "collaborator added"
    );

    Ok((
        StatusCode::CREATED,
        Json(CollaboratorResponse::new(row, collaborator.username)),
    ))
}

/// GET /api/v1/projects/{id}/collaborators
pub async fn list_collaborators(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CollaboratorResponse>>> {
    let project = state
        .repos
        .projects
        .find_by_id(project_id)
        .await?
        .ok_or(ApiError::ProjectNotFound)?;

    let mut collaborators = Vec::new();
    for row in state.repos.projects.list_collaborators(project.id).await? {
        let account = state
            .repos
            .accounts
            .find_by_id(row.account_id)
            .await?
            .ok_or(ApiError::AccountNotFound)?
            .into_account()?;
        collaborators.push(CollaboratorResponse::new(
            row.into_collaborator()?,
            account.username,
        ));
    }

    Ok(Json(collaborators))
}
