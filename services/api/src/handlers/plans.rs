//! Plan handlers

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use fieldhub_db::PlanRepository;
use fieldhub_types::Plan;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub code: String,
    pub display_name: String,
    pub user_category: String,
    pub ordering: i32,
    pub storage_mb: i64,
    pub storage_keep_versions: i64,
    pub job_minutes: i64,
    pub synchronizations_per_month: i64,
    pub can_add_storage: bool,
    pub can_add_job_minutes: bool,
    pub is_external_db_supported: bool,
    pub is_premium: bool,
    pub is_trial: bool,
    pub max_organization_members: i64,
    pub max_premium_collaborators_per_private_project: i64,
}

impl From<Plan> for PlanResponse {
    fn from(plan: Plan) -> Self {
        Self {
            code: plan.code,
            display_name: plan.display_name,
            user_category: plan.user_category.as_str().to_string(),
            ordering: plan.ordering,
            storage_mb: plan.storage_mb,
            storage_keep_versions: plan.storage_keep_versions,
            job_minutes: plan.job_minutes,
            synchronizations_per_month: plan.synchronizations_per_month,
            can_add_storage: plan.can_add_storage,
            can_add_job_minutes: plan.can_add_job_minutes,
            is_external_db_supported: plan.is_external_db_supported,
            is_premium: plan.is_premium,
            is_trial: plan.is_trial,
            max_organization_members: plan.max_organization_members,
            max_premium_collaborators_per_private_project: plan
                .max_premium_collaborators_per_private_project,
        }
    }
}

/// GET /api/v1/plans
///
/// Public plans, ordered by (ordering, display name, code).
pub async fn list_plans(State(state): State<AppState>) -> ApiResult<Json<Vec<PlanResponse>>> {
    let mut plans = Vec::new();
    for row in state.repos.plans.list_public().await? {
        plans.push(row.into_plan()?.into());
    }

    Ok(Json(plans))
}
