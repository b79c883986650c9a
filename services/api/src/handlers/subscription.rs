//! Subscription handlers

use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fieldhub_billing_core::StorageSummary;
use fieldhub_db::SubscriptionRepository;
use fieldhub_types::{AccountId, Plan, Subscription};

use crate::error::ApiResult;
use crate::handlers::shared::record_op_duration;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SubscriptionQuery {
    pub account_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CreateDefaultSubscriptionRequest {
    pub account_id: Uuid,
    pub active_since: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub id: String,
    pub account_id: String,
    pub plan_code: String,
    pub status: String,
    pub status_label: String,
    pub active_since: Option<String>,
    pub active_until: Option<String>,
    pub requested_cancel_at: Option<String>,
    pub storage: StorageResponse,
}

#[derive(Debug, Serialize)]
pub struct StorageResponse {
    pub plan_mb: i64,
    pub package_quantity: i64,
    pub package_mb: i64,
    pub total_mb: i64,
}

impl SubscriptionResponse {
    fn new(subscription: Subscription, plan: &Plan, storage: &StorageSummary) -> Self {
        Self {
            id: subscription.id.to_string(),
            account_id: subscription.account_id.to_string(),
            plan_code: plan.code.clone(),
            status: subscription.status.as_str().to_string(),
            status_label: subscription.status.label().to_string(),
            active_since: subscription.active_since.map(|t| t.to_rfc3339()),
            active_until: subscription.active_until.map(|t| t.to_rfc3339()),
            requested_cancel_at: subscription.requested_cancel_at.map(|t| t.to_rfc3339()),
            storage: StorageResponse {
                plan_mb: storage.plan_storage_mb,
                package_quantity: storage.active_package_quantity,
                package_mb: storage.active_package_mb,
                total_mb: storage.total_mb,
            },
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/billing/subscription?account_id={uuid}
///
/// Returns the subscription active now for the account, activating the
/// category's default plan when none exists.
pub async fn get_subscription(
    State(state): State<AppState>,
    Query(query): Query<SubscriptionQuery>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let start = Instant::now();
    let account_id = AccountId(query.account_id);

    let result = async {
        let subscription = state
            .ledger
            .get_or_create_active_subscription(account_id)
            .await?;
        let plan = state.ledger.plan(&subscription).await?;
        let storage = state.ledger.storage_summary(account_id).await?;
        Ok(Json(SubscriptionResponse::new(subscription, &plan, &storage)))
    }
    .await;

    record_op_duration("get_subscription", start, result.is_ok());
    result
}

/// GET /api/v1/billing/subscriptions?account_id={uuid}
///
/// Full subscription history for an account, newest first.
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Query(query): Query<SubscriptionQuery>,
) -> ApiResult<Json<Vec<SubscriptionHistoryEntry>>> {
    let rows = state
        .repos
        .subscriptions
        .list_for_account(query.account_id)
        .await?;

    let mut entries = Vec::new();
    for row in rows {
        let subscription = row.into_subscription()?;
        entries.push(SubscriptionHistoryEntry {
            id: subscription.id.to_string(),
            status: subscription.status.as_str().to_string(),
            active_since: subscription.active_since.map(|t| t.to_rfc3339()),
            active_until: subscription.active_until.map(|t| t.to_rfc3339()),
            created_at: subscription.created_at.to_rfc3339(),
        });
    }

    Ok(Json(entries))
}

#[derive(Debug, Serialize)]
pub struct SubscriptionHistoryEntry {
    pub id: String,
    pub status: String,
    pub active_since: Option<String>,
    pub active_until: Option<String>,
    pub created_at: String,
}

/// POST /api/v1/billing/subscription/default
///
/// Explicitly activate the default plan for an account. Conflicts when a
/// subscription is already active.
pub async fn create_default_subscription(
    State(state): State<AppState>,
    Json(req): Json<CreateDefaultSubscriptionRequest>,
) -> ApiResult<(StatusCode, Json<SubscriptionResponse>)> {
    let start = Instant::now();
    let account_id = AccountId(req.account_id);

    let result = async {
        let subscription = state
            .ledger
            .create_default_subscription(account_id, req.active_since)
            .await?;
        let plan = state.ledger.plan(&subscription).await?;
        let storage = state.ledger.storage_summary(account_id).await?;

        metrics::counter!("billing_subscriptions_activated_total").increment(1);
        tracing::info!(account_id = %account_id, "default subscription created");

        Ok((
            StatusCode::CREATED,
            Json(SubscriptionResponse::new(subscription, &plan, &storage)),
        ))
    }
    .await;

    record_op_duration("create_default_subscription", start, result.is_ok());
    result
}
