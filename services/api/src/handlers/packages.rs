//! Extra package handlers

use std::time::Instant;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fieldhub_billing_core::StorageSummary;
use fieldhub_db::PackageRepository;
use fieldhub_types::{AccountId, Package, PackageKind, SubscriptionId};

use crate::error::ApiResult;
use crate::handlers::shared::record_op_duration;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SetStoragePackageRequest {
    pub subscription_id: Uuid,
    pub quantity: i64,
    /// When the change takes effect; defaults to now
    pub active_since: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct StorageQuery {
    pub account_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct PackageResponse {
    pub id: String,
    pub quantity: i64,
    pub active_since: String,
    pub active_until: Option<String>,
}

impl From<Package> for PackageResponse {
    fn from(package: Package) -> Self {
        Self {
            id: package.id.to_string(),
            quantity: package.quantity,
            active_since: package.active_since.to_rfc3339(),
            active_until: package.active_until.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PackageChangeResponse {
    /// The package closed by this change, if one was active
    pub closed: Option<PackageResponse>,
    /// The newly opened package, when the quantity was positive
    pub created: Option<PackageResponse>,
}

#[derive(Debug, Serialize)]
pub struct StorageSummaryResponse {
    pub plan_storage_mb: i64,
    pub active_package_quantity: i64,
    pub active_package_mb: i64,
    pub total_mb: i64,
    pub future_package_quantity: i64,
    pub future_package_mb: i64,
    pub used_mb: i64,
    pub min_package_quantity: i64,
}

impl From<StorageSummary> for StorageSummaryResponse {
    fn from(summary: StorageSummary) -> Self {
        Self {
            plan_storage_mb: summary.plan_storage_mb,
            active_package_quantity: summary.active_package_quantity,
            active_package_mb: summary.active_package_mb,
            total_mb: summary.total_mb,
            future_package_quantity: summary.future_package_quantity,
            future_package_mb: summary.future_package_mb,
            used_mb: summary.used_mb,
            min_package_quantity: summary.min_package_quantity,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// PUT /api/v1/billing/packages/storage
///
/// Set the storage package quantity of a subscription. The active package
/// is closed and, for a positive quantity, a new one opens at the same
/// instant. Requires a premium plan.
pub async fn set_storage_package(
    State(state): State<AppState>,
    Json(req): Json<SetStoragePackageRequest>,
) -> ApiResult<Json<PackageChangeResponse>> {
    let start = Instant::now();

    let result = async {
        let change = state
            .ledger
            .set_package_quantity(
                SubscriptionId(req.subscription_id),
                PackageKind::Storage,
                req.quantity,
                req.active_since,
            )
            .await?;

        metrics::counter!("billing_packages_changed_total", "kind" => "storage").increment(1);

        Ok(Json(PackageChangeResponse {
            closed: change.closed.map(Into::into),
            created: change.created.map(Into::into),
        }))
    }
    .await;

    record_op_duration("set_storage_package", start, result.is_ok());
    result
}

#[derive(Debug, Deserialize)]
pub struct ListPackagesQuery {
    pub subscription_id: Uuid,
}

/// GET /api/v1/billing/packages?subscription_id={uuid}
///
/// All package records of a subscription, oldest first, including closed
/// and future ones.
pub async fn list_packages(
    State(state): State<AppState>,
    Query(query): Query<ListPackagesQuery>,
) -> ApiResult<Json<Vec<PackageResponse>>> {
    let packages = state
        .repos
        .packages
        .list_for_subscription(query.subscription_id)
        .await?
        .into_iter()
        .map(|row| row.into_package().into())
        .collect();

    Ok(Json(packages))
}

/// GET /api/v1/billing/storage?account_id={uuid}
///
/// Storage entitlement, usage and the minimum package quantity covering
/// the current usage.
pub async fn get_storage(
    State(state): State<AppState>,
    Query(query): Query<StorageQuery>,
) -> ApiResult<Json<StorageSummaryResponse>> {
    let start = Instant::now();

    let result = async {
        let summary = state
            .ledger
            .storage_summary(AccountId(query.account_id))
            .await?;
        Ok(Json(summary.into()))
    }
    .await;

    record_op_duration("get_storage", start, result.is_ok());
    result
}
