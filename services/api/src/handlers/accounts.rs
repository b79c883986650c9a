//! Account handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fieldhub_db::{AccountRepository, CreateAccount};
use fieldhub_types::{Account, UserCategory};

use crate::error::{ApiError, ApiResult};
use crate::handlers::shared::validate_username;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub username: String,
    pub category: String,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub username: String,
    pub category: String,
    pub category_label: String,
    pub storage_used_mb: i64,
    pub created_at: String,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.to_string(),
            username: account.username,
            category: account.category.as_str().to_string(),
            category_label: account.category.label().to_string(),
            storage_used_mb: account.storage_used_mb,
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/accounts
pub async fn create_account(
    State(state): State<AppState>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<(StatusCode, Json<AccountResponse>)> {
    validate_username(&req.username)?;
    let category: UserCategory = req.category.parse()?;

    if state
        .repos
        .accounts
        .find_by_username(&req.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "username {:?} is already taken",
            req.username
        )));
    }

    let row = state
        .repos
        .accounts
        .create(CreateAccount {
            id: Uuid::new_v4(),
            username: req.username,
            category,
        })
        .await?;
    let account = row.into_account()?;

    tracing::info!(account_id = %account.id, username = %account.username, "account created");

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// GET /api/v1/accounts/{username}
pub async fn get_account(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<AccountResponse>> {
    let account = state
        .repos
        .accounts
        .find_by_username(&username)
        .await?
        .ok_or(ApiError::AccountNotFound)?
        .into_account()?;

    Ok(Json(account.into()))
}

#[derive(Debug, Deserialize)]
pub struct StorageUsageRequest {
    pub used_mb: i64,
}

/// PUT /api/v1/accounts/{username}/storage-usage
///
/// Record the storage consumed by the account's projects; input to the
/// minimum-package-quantity calculation.
pub async fn set_storage_usage(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(req): Json<StorageUsageRequest>,
) -> ApiResult<Json<AccountResponse>> {
    if req.used_mb < 0 {
        return Err(ApiError::validation(
            "used_mb",
            "Storage usage cannot be negative",
        ));
    }

    let account = state
        .repos
        .accounts
        .find_by_username(&username)
        .await?
        .ok_or(ApiError::AccountNotFound)?
        .into_account()?;

    state
        .repos
        .accounts
        .set_storage_used_mb(account.id.0, req.used_mb)
        .await?;

    let account = state
        .repos
        .accounts
        .find_by_id(account.id.0)
        .await?
        .ok_or(ApiError::AccountNotFound)?
        .into_account()?;

    Ok(Json(account.into()))
}
