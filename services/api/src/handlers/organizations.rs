//! Organization membership handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use fieldhub_db::{AccountRepository, OrganizationRepository};
use fieldhub_types::{Account, OrganizationRole, UserCategory};

use crate::error::{ApiError, ApiResult};
use crate::handlers::shared::validate_username;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    /// Username of the member account
    pub member: String,
    /// Role display label, e.g. "Member"
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub member: String,
    pub role: String,
}

// ============================================================================
// Handlers
// ============================================================================

async fn organization_by_username(state: &AppState, username: &str) -> ApiResult<Account> {
    let account = state
        .repos
        .accounts
        .find_by_username(username)
        .await?
        .ok_or(ApiError::AccountNotFound)?
        .into_account()?;

    if account.category != UserCategory::Organization {
        return Err(ApiError::validation(
            "organization",
            "Account is not an organization",
        ));
    }

    Ok(account)
}

/// POST /api/v1/organizations/{username}/members
///
/// Adds a member, enforcing the organization plan's member cap. Members
/// already over the cap after a plan downgrade stay active; only new
/// additions are rejected.
pub async fn add_member(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<MemberResponse>)> {
    validate_username(&req.member)?;
    let role = OrganizationRole::from_label(&req.role)?;

    let organization = organization_by_username(&state, &username).await?;
    let member = state
        .repos
        .accounts
        .find_by_username(&req.member)
        .await?
        .ok_or_else(|| ApiError::validation("member", "Invalid member username"))?
        .into_account()?;

    let subscription = state
        .ledger
        .get_or_create_active_subscription(organization.id)
        .await?;
    let plan = state.ledger.plan(&subscription).await?;

    if let Some(limit) = plan.member_limit() {
        let members = state
            .repos
            .organizations
            .count_members(organization.id.0)
            .await?;
        if members >= limit {
            return Err(ApiError::Conflict(format!(
                "organization member limit ({limit}) reached"
            )));
        }
    }

    let row = state
        .repos
        .organizations
        .add_member(organization.id.0, member.id.0, role)
        .await?
        .into_member()?;

    tracing::info!(
        organization = %organization.username,
        member = %member.username,
        role = %role,
        "organization member added"
    );

    Ok((
        StatusCode::CREATED,
        Json(MemberResponse {
            member: member.username,
            role: row.role.label().to_string(),
        }),
    ))
}

/// GET /api/v1/organizations/{username}/members
pub async fn list_members(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<Vec<MemberResponse>>> {
    let organization = organization_by_username(&state, &username).await?;

    let mut members = Vec::new();
    for row in state
        .repos
        .organizations
        .list_members(organization.id.0)
        .await?
    {
        let account = state
            .repos
            .accounts
            .find_by_id(row.member_id)
            .await?
            .ok_or(ApiError::AccountNotFound)?
            .into_account()?;
        let member = row.into_member()?;
        members.push(MemberResponse {
            member: account.username,
            role: member.role.label().to_string(),
        });
    }

    Ok(Json(members))
}
