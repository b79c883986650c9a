//! Administrative listing handlers
//!
//! Summary views over plans and package types for back-office tooling.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use fieldhub_db::{PackageTypeRepository, PlanRepository};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PlanSummary {
    pub code: String,
    pub is_default: bool,
    pub is_public: bool,
    pub display_name: String,
    pub storage_mb: i64,
    pub job_minutes: i64,
}

#[derive(Debug, Serialize)]
pub struct PackageTypeSummary {
    pub code: String,
    pub is_public: bool,
    pub display_name: String,
    pub kind: String,
    pub unit_amount: i64,
    pub unit_label: Option<String>,
}

/// GET /api/v1/admin/plans
pub async fn list_plans_admin(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PlanSummary>>> {
    let mut plans = Vec::new();
    for row in state.repos.plans.list_all().await? {
        let plan = row.into_plan()?;
        plans.push(PlanSummary {
            code: plan.code,
            is_default: plan.is_default,
            is_public: plan.is_public,
            display_name: plan.display_name,
            storage_mb: plan.storage_mb,
            job_minutes: plan.job_minutes,
        });
    }

    Ok(Json(plans))
}

/// GET /api/v1/admin/package-types
pub async fn list_package_types_admin(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PackageTypeSummary>>> {
    let mut package_types = Vec::new();
    for row in state.repos.package_types.list_all().await? {
        let package_type = row.into_package_type()?;
        package_types.push(PackageTypeSummary {
            code: package_type.code,
            is_public: package_type.is_public,
            display_name: package_type.display_name,
            kind: package_type.kind.as_str().to_string(),
            unit_amount: package_type.unit_amount,
            unit_label: package_type.unit_label,
        });
    }

    Ok(Json(package_types))
}
