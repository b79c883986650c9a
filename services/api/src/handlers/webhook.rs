//! Payment webhook handler

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use std::time::Instant;

use fieldhub_billing_core::LedgerError;

use crate::state::AppState;

/// POST /webhooks/payment
///
/// Handle payment-provider events with signature verification. The events
/// drive subscription lifecycle transitions.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let start = Instant::now();

    let Some(sig_header) = headers.get("x-payment-signature") else {
        tracing::warn!("Missing X-Payment-Signature header");
        return StatusCode::BAD_REQUEST;
    };

    let Ok(signature) = sig_header.to_str() else {
        tracing::warn!("Invalid X-Payment-Signature header encoding");
        return StatusCode::BAD_REQUEST;
    };

    match state.ledger.process_webhook(&body, signature).await {
        Ok(_) => {
            metrics::counter!("billing_webhooks_processed_total", "status" => "success")
                .increment(1);
            metrics::histogram!(
                "billing_operation_duration_seconds",
                "operation" => "process_webhook"
            )
            .record(start.elapsed().as_secs_f64());

            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(error = ?e, "Webhook processing failed");
            metrics::counter!("billing_webhooks_processed_total", "status" => "error").increment(1);

            match e {
                LedgerError::Webhook(_) => StatusCode::BAD_REQUEST,
                LedgerError::SubscriptionNotFound => StatusCode::NOT_FOUND,
                LedgerError::Conflict => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }
}
