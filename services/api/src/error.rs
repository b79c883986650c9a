//! Error types for the FieldHub API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use fieldhub_billing_core::LedgerError;
use fieldhub_db::DbError;
use fieldhub_types::InvalidChoice;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Account not found")]
    AccountNotFound,

    #[error("Project not found")]
    ProjectNotFound,

    #[error("Subscription not found")]
    SubscriptionNotFound,

    #[error("Plan not found")]
    PlanNotFound,

    /// Field-level validation failure; `errors` is surfaced under the
    /// field name in the response details
    #[error("Validation failed for field {field}")]
    Validation {
        field: &'static str,
        errors: Vec<String>,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("An active subscription already exists for this account")]
    DoubleActivation,

    #[error("Only premium plans can carry extra packages")]
    NotPremiumPlan,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Webhook error: {0}")]
    WebhookError(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error")]
    Database(DbError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::AccountNotFound
            | Self::ProjectNotFound
            | Self::SubscriptionNotFound
            | Self::PlanNotFound => StatusCode::NOT_FOUND,
            Self::Validation { .. } | Self::BadRequest(_) | Self::WebhookError(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::DoubleActivation | Self::NotPremiumPlan | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Self::Database(DbError::NotFound) => StatusCode::NOT_FOUND,
            Self::Database(DbError::ActivePeriodOverlap) => StatusCode::CONFLICT,
            Self::Internal(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound => "ACCOUNT_NOT_FOUND",
            Self::ProjectNotFound => "PROJECT_NOT_FOUND",
            Self::SubscriptionNotFound => "SUBSCRIPTION_NOT_FOUND",
            Self::PlanNotFound => "PLAN_NOT_FOUND",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::DoubleActivation => "SUBSCRIPTION_ALREADY_ACTIVE",
            Self::NotPremiumPlan => "NOT_PREMIUM_PLAN",
            Self::Conflict(_) => "CONFLICT",
            Self::WebhookError(_) => "WEBHOOK_ERROR",
            Self::Database(DbError::NotFound) => "NOT_FOUND",
            Self::Database(DbError::ActivePeriodOverlap) => "ACTIVE_PERIOD_OVERLAP",
            Self::Internal(_) | Self::Database(_) => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation { field, errors } => {
                let mut details = serde_json::Map::new();
                details.insert((*field).to_string(), serde_json::json!(errors));
                Some(serde_json::Value::Object(details))
            }
            _ => None,
        }
    }

    /// Validation error for one field
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            errors: vec![message.into()],
        }
    }
}

impl From<InvalidChoice> for ApiError {
    fn from(err: InvalidChoice) -> Self {
        Self::Validation {
            field: err.field,
            errors: vec![format!(
                "Invalid {}. Acceptable values are {:?}.",
                err.field, err.acceptable
            )],
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Decode(choice) => Self::Internal(choice.to_string()),
            other => Self::Database(other),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AccountNotFound => Self::AccountNotFound,
            LedgerError::SubscriptionNotFound => Self::SubscriptionNotFound,
            LedgerError::PlanNotFound | LedgerError::NoDefaultPlan(_) => Self::PlanNotFound,
            LedgerError::DoubleActivation => Self::DoubleActivation,
            LedgerError::NotPremiumPlan => Self::NotPremiumPlan,
            LedgerError::Conflict => Self::Conflict(err.to_string()),
            LedgerError::QuantityOutOfRange { .. } => Self::BadRequest(err.to_string()),
            LedgerError::Webhook(message) => Self::WebhookError(message),
            LedgerError::Database(db) => db.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log internal errors
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = ?self, "Internal API error");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
