//! Payment webhook handling
//!
//! The payment provider drives subscription lifecycle transitions through
//! signed events. The signature header has the form `t=<unix>,v1=<hex>`
//! where `v1` is the HMAC-SHA256 of `"<unix>.<payload>"` under the shared
//! webhook secret.

use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, warn};
use uuid::Uuid;

use fieldhub_types::SubscriptionId;

use crate::error::LedgerError;

/// Payment event types the ledger understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventType {
    /// A checkout was created for the subscription
    CheckoutCreated,
    /// The provider is waiting for the first payment
    PaymentPending,
    /// A payment succeeded
    PaymentSucceeded,
    /// A payment failed
    PaymentFailed,
    /// The provider cancelled the subscription
    SubscriptionCancelled,
    /// The draft expired without payment
    DraftExpired,
    /// Unknown event type
    Unknown(String),
}

impl From<&str> for PaymentEventType {
    fn from(s: &str) -> Self {
        match s {
            "checkout.created" => Self::CheckoutCreated,
            "payment.pending" => Self::PaymentPending,
            "payment.succeeded" => Self::PaymentSucceeded,
            "payment.failed" => Self::PaymentFailed,
            "subscription.cancelled" => Self::SubscriptionCancelled,
            "draft.expired" => Self::DraftExpired,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Parsed payment event
#[derive(Debug, Clone)]
pub struct PaymentEvent {
    /// Provider event ID
    pub id: String,
    /// Event type
    pub event_type: PaymentEventType,
    /// The subscription the event applies to
    pub subscription_id: SubscriptionId,
    /// When the transition takes effect
    pub effective_at: DateTime<Utc>,
    /// Period end carried by cancellation events
    pub active_until: Option<DateTime<Utc>>,
    /// When the event was created (Unix timestamp)
    pub created: i64,
}

// Raw event for parsing
#[derive(Debug, Deserialize)]
struct RawPaymentEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    subscription: Uuid,
    effective_at: DateTime<Utc>,
    #[serde(default)]
    active_until: Option<DateTime<Utc>>,
}

/// Webhook handler verifying and parsing payment events
#[derive(Clone)]
pub struct WebhookHandler {
    webhook_secret: String,
    tolerance: Duration,
}

impl WebhookHandler {
    /// Create a new webhook handler
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
            tolerance: Duration::from_secs(300),
        }
    }

    /// Set the timestamp freshness tolerance
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Verify a webhook payload against its signature header and parse
    /// the event
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<PaymentEvent, LedgerError> {
        self.verify_signature(payload, signature, now)?;

        let raw: RawPaymentEvent = serde_json::from_slice(payload)
            .map_err(|e| LedgerError::Webhook(e.to_string()))?;

        debug!(event_id = %raw.id, event_type = %raw.event_type, "parsed payment event");

        Ok(PaymentEvent {
            event_type: PaymentEventType::from(raw.event_type.as_str()),
            id: raw.id,
            subscription_id: SubscriptionId(raw.subscription),
            effective_at: raw.effective_at,
            active_until: raw.active_until,
            created: raw.created,
        })
    }

    /// Verify the `t=...,v1=...` signature header
    fn verify_signature(
        &self,
        payload: &[u8],
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let mut timestamp: Option<&str> = None;
        let mut sig_v1: Option<&str> = None;

        for part in signature.split(',') {
            if let Some((key, value)) = part.split_once('=') {
                match key {
                    "t" => timestamp = Some(value),
                    "v1" => sig_v1 = Some(value),
                    _ => {}
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            warn!("missing timestamp in webhook signature");
            LedgerError::Webhook("missing timestamp".to_string())
        })?;

        let sig_v1 = sig_v1.ok_or_else(|| {
            warn!("missing v1 signature in webhook signature");
            LedgerError::Webhook("missing signature".to_string())
        })?;

        let payload = std::str::from_utf8(payload)
            .map_err(|_| LedgerError::Webhook("invalid payload encoding".to_string()))?;
        let signed_payload = format!("{timestamp}.{payload}");

        let mut mac = Hmac::<Sha256>::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| LedgerError::Webhook("invalid webhook secret".to_string()))?;
        mac.update(signed_payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        if !constant_time_eq(sig_v1.as_bytes(), expected.as_bytes()) {
            warn!("webhook signature verification failed");
            return Err(LedgerError::Webhook(
                "signature verification failed".to_string(),
            ));
        }

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| LedgerError::Webhook("invalid timestamp format".to_string()))?;
        if (now.timestamp() - ts).unsigned_abs() > self.tolerance.as_secs() {
            warn!(timestamp = ts, now = now.timestamp(), "webhook timestamp too old");
            return Err(LedgerError::Webhook("timestamp too old".to_string()));
        }

        Ok(())
    }
}

/// Constant-time comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Sign a payload the way the provider does. Exposed for tests and local
/// tooling.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(payload);
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={signature}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SECRET: &str = "whsec_test";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap()
    }

    fn event_payload(event_type: &str) -> String {
        format!(
            r#"{{
                "id": "evt_1",
                "type": "{event_type}",
                "created": {created},
                "subscription": "0a0f0c8e-6f2d-4a3f-9c60-1f16312dcd40",
                "effective_at": "2023-06-01T12:00:00Z"
            }}"#,
            created = now().timestamp()
        )
    }

    #[test]
    fn valid_signature_parses_event() {
        let payload = event_payload("payment.succeeded");
        let signature = sign_payload(SECRET, now().timestamp(), payload.as_bytes());

        let event = WebhookHandler::new(SECRET)
            .verify_and_parse(payload.as_bytes(), &signature, now())
            .unwrap();

        assert_eq!(event.event_type, PaymentEventType::PaymentSucceeded);
        assert_eq!(event.id, "evt_1");
        assert_eq!(event.active_until, None);
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let payload = event_payload("payment.succeeded");
        let signature = sign_payload(SECRET, now().timestamp(), payload.as_bytes());
        let tampered = payload.replace("payment.succeeded", "subscription.cancelled");

        let result =
            WebhookHandler::new(SECRET).verify_and_parse(tampered.as_bytes(), &signature, now());

        assert!(matches!(result, Err(LedgerError::Webhook(_))));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let payload = event_payload("payment.succeeded");
        let signature = sign_payload("whsec_other", now().timestamp(), payload.as_bytes());

        let result =
            WebhookHandler::new(SECRET).verify_and_parse(payload.as_bytes(), &signature, now());

        assert!(matches!(result, Err(LedgerError::Webhook(_))));
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let stale = now().timestamp() - 3600;
        let payload = event_payload("payment.succeeded");
        let signature = sign_payload(SECRET, stale, payload.as_bytes());

        let result =
            WebhookHandler::new(SECRET).verify_and_parse(payload.as_bytes(), &signature, now());

        assert!(matches!(result, Err(LedgerError::Webhook(_))));
    }

    #[test]
    fn malformed_signature_header_is_rejected() {
        let payload = event_payload("payment.succeeded");

        for header in ["", "t=123", "v1=abc", "nonsense"] {
            let result =
                WebhookHandler::new(SECRET).verify_and_parse(payload.as_bytes(), header, now());
            assert!(result.is_err(), "header {header:?} should be rejected");
        }
    }

    #[test]
    fn unknown_event_types_still_parse() {
        let payload = event_payload("invoice.finalized");
        let signature = sign_payload(SECRET, now().timestamp(), payload.as_bytes());

        let event = WebhookHandler::new(SECRET)
            .verify_and_parse(payload.as_bytes(), &signature, now())
            .unwrap();

        assert_eq!(
            event.event_type,
            PaymentEventType::Unknown("invoice.finalized".to_string())
        );
    }
}
