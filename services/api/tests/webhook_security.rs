//! Webhook security tests
//!
//! Tests for payment webhook signature verification as exposed to this
//! service. Signatures are generated exactly the way the payment provider
//! does, then verified through the same handler the webhook endpoint uses.

use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use fieldhub_billing_core::{PaymentEventType, WebhookHandler};

const SECRET: &str = "whsec_test_secret_key";

/// Generate a valid webhook signature for testing
fn generate_signature(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let signed_payload = format!("{}.{}", timestamp, std::str::from_utf8(payload).unwrap());

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(signed_payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    format!("t={},v1={}", timestamp, signature)
}

/// Generate a webhook payload for testing
fn test_webhook_payload(event_type: &str, subscription: Uuid) -> Vec<u8> {
    let payload = serde_json::json!({
        "id": "evt_test_123",
        "type": event_type,
        "created": now().timestamp(),
        "subscription": subscription,
        "effective_at": "2023-06-01T00:00:00Z"
    });
    serde_json::to_vec(&payload).unwrap()
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap()
}

#[test]
fn test_valid_signature_is_accepted() {
    let subscription = Uuid::new_v4();
    let payload = test_webhook_payload("payment.succeeded", subscription);
    let signature = generate_signature(&payload, SECRET, now().timestamp());

    let event = WebhookHandler::new(SECRET)
        .verify_and_parse(&payload, &signature, now())
        .expect("valid signature should verify");

    assert_eq!(event.event_type, PaymentEventType::PaymentSucceeded);
    assert_eq!(event.subscription_id.0, subscription);
}

#[test]
fn test_wrong_secret_is_rejected() {
    let payload = test_webhook_payload("payment.succeeded", Uuid::new_v4());
    let signature = generate_signature(&payload, "whsec_attacker", now().timestamp());

    let result = WebhookHandler::new(SECRET).verify_and_parse(&payload, &signature, now());
    assert!(result.is_err());
}

#[test]
fn test_tampered_payload_is_rejected() {
    let payload = test_webhook_payload("payment.succeeded", Uuid::new_v4());
    let signature = generate_signature(&payload, SECRET, now().timestamp());

    let mut tampered = payload.clone();
    let position = tampered
        .windows(b"payment.succeeded".len())
        .position(|window| window == b"payment.succeeded")
        .unwrap();
    tampered[position..position + 7].copy_from_slice(b"payXent");

    let result = WebhookHandler::new(SECRET).verify_and_parse(&tampered, &signature, now());
    assert!(result.is_err());
}

#[test]
fn test_replayed_signature_outside_tolerance_is_rejected() {
    let payload = test_webhook_payload("payment.succeeded", Uuid::new_v4());

    // One hour in the past and in the future, both beyond the default
    // 5 minute tolerance
    for drift in [-3600i64, 3600] {
        let timestamp = now().timestamp() + drift;
        let signature = generate_signature(&payload, SECRET, timestamp);

        let result = WebhookHandler::new(SECRET).verify_and_parse(&payload, &signature, now());
        assert!(result.is_err(), "drift {drift}s should be rejected");
    }
}

#[test]
fn test_drift_within_tolerance_is_accepted() {
    let payload = test_webhook_payload("payment.succeeded", Uuid::new_v4());
    let timestamp = now().timestamp() - 120;
    let signature = generate_signature(&payload, SECRET, timestamp);

    let result = WebhookHandler::new(SECRET).verify_and_parse(&payload, &signature, now());
    assert!(result.is_ok());
}

#[test]
fn test_missing_signature_components_are_rejected() {
    let payload = test_webhook_payload("payment.succeeded", Uuid::new_v4());
    let valid = generate_signature(&payload, SECRET, now().timestamp());
    let v1_only = valid.split_once(',').unwrap().1.to_string();
    let t_only = valid.split_once(',').unwrap().0.to_string();

    for header in [String::new(), v1_only, t_only, "garbage".to_string()] {
        let result = WebhookHandler::new(SECRET).verify_and_parse(&payload, &header, now());
        assert!(result.is_err(), "header {header:?} should be rejected");
    }
}

#[test]
fn test_unknown_event_type_still_verifies() {
    let payload = test_webhook_payload("invoice.created", Uuid::new_v4());
    let signature = generate_signature(&payload, SECRET, now().timestamp());

    let event = WebhookHandler::new(SECRET)
        .verify_and_parse(&payload, &signature, now())
        .unwrap();

    assert_eq!(
        event.event_type,
        PaymentEventType::Unknown("invoice.created".to_string())
    );
}
