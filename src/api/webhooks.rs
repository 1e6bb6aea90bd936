use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use ring::hmac;
use std::sync::Arc;
use tracing::{info, warn};

use super::{ApiError, AppState};
use crate::db::StripeSubscriptionState;

/// Parsed `stripe-signature` header: the timestamp and every v1 signature.
#[derive(Debug)]
struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> Option<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value.to_string()),
            _ => {}
        }
    }

    if signatures.is_empty() {
        return None;
    }

    Some(SignatureHeader {
        timestamp: timestamp?,
        signatures,
    })
}

/// Verify an event signature: HMAC-SHA256 over `"{timestamp}.{payload}"`,
/// with the timestamp bounded by the configured tolerance to stop replays.
fn verify_signature(
    secret: &str,
    header: &str,
    payload: &[u8],
    now: i64,
    tolerance_seconds: i64,
) -> bool {
    let Some(parsed) = parse_signature_header(header) else {
        return false;
    };

    if (now - parsed.timestamp).abs() > tolerance_seconds {
        return false;
    }

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let mut signed_payload = parsed.timestamp.to_string().into_bytes();
    signed_payload.push(b'.');
    signed_payload.extend_from_slice(payload);

    parsed.signatures.iter().any(|signature| {
        hex::decode(signature)
            .is_ok_and(|sig| hmac::verify(&key, &signed_payload, &sig).is_ok())
    })
}

fn subscription_state(object: &serde_json::Value, is_active: bool) -> Option<StripeSubscriptionState> {
    Some(StripeSubscriptionState {
        stripe_subscription_id: object.get("id")?.as_str()?.to_string(),
        stripe_customer_id: object
            .get("customer")
            .and_then(|v| v.as_str())
            .map(String::from),
        price_id: object
            .pointer("/items/data/0/price/id")
            .and_then(|v| v.as_str())
            .map(String::from),
        is_active,
        current_period_start: object.get("current_period_start").and_then(|v| v.as_i64()),
        current_period_end: object.get("current_period_end").and_then(|v| v.as_i64()),
        cancel_at_period_end: object
            .get("cancel_at_period_end")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
    })
}

/// POST /webhooks/stripe
///
/// Public endpoint; the signature header is the authentication. Events for
/// subscriptions we do not know are acknowledged and skipped so Stripe
/// does not retry them forever.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (secret, tolerance) = {
        let config = state.config().read().await;
        (
            config.billing.stripe_webhook_secret.clone(),
            config.billing.webhook_tolerance_seconds,
        )
    };

    if secret.is_empty() {
        return Err(ApiError::internal("Stripe webhook secret not configured"));
    }

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::validation("Missing stripe-signature header"))?;

    let now = chrono::Utc::now().timestamp();
    if !verify_signature(&secret, signature, &body, now, tolerance) {
        warn!("Rejected Stripe webhook with invalid signature");
        return Err(ApiError::validation("Invalid webhook signature"));
    }

    let event: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|_| ApiError::validation("Invalid webhook payload"))?;

    let event_type = event
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ApiError::validation("Webhook event missing type"))?;

    let object = event
        .pointer("/data/object")
        .ok_or_else(|| ApiError::validation("Webhook event missing data.object"))?;

    match event_type {
        "customer.subscription.created" | "customer.subscription.updated" => {
            let Some(subscription) = subscription_state(object, is_subscription_active(object))
            else {
                return Err(ApiError::validation("Malformed subscription object"));
            };
            let matched = state
                .store()
                .apply_stripe_subscription_state(subscription)
                .await?;
            if !matched {
                info!("Stripe {} for unknown customer, skipped", event_type);
            }
        }
        "customer.subscription.deleted" => {
            let Some(subscription) = subscription_state(object, false) else {
                return Err(ApiError::validation("Malformed subscription object"));
            };
            state
                .store()
                .apply_stripe_subscription_state(subscription)
                .await?;
        }
        "invoice.paid" => {
            handle_invoice_paid(&state, object).await?;
        }
        "invoice.payment_failed" => {
            if let Some(subscription_id) = object.get("subscription").and_then(|v| v.as_str()) {
                state
                    .store()
                    .set_subscription_active_by_stripe_id(subscription_id, false)
                    .await?;
                warn!("Payment failed for subscription {}", subscription_id);
            }
        }
        other => {
            info!("Ignoring Stripe event type: {}", other);
        }
    }

    Ok(Json(serde_json::json!({ "status": "success" })))
}

fn is_subscription_active(object: &serde_json::Value) -> bool {
    matches!(
        object.get("status").and_then(|v| v.as_str()),
        Some("active" | "trialing")
    )
}

async fn handle_invoice_paid(
    state: &AppState,
    object: &serde_json::Value,
) -> Result<(), ApiError> {
    let Some(subscription_id) = object.get("subscription").and_then(|v| v.as_str()) else {
        // One-off invoices carry no subscription.
        return Ok(());
    };

    let Some(subscription) = state
        .store()
        .set_subscription_active_by_stripe_id(subscription_id, true)
        .await?
    else {
        info!("Invoice paid for unknown subscription {}", subscription_id);
        return Ok(());
    };

    let Some(user) = state.store().get_user(subscription.user_id).await? else {
        return Ok(());
    };
    let Some(plan) = state.store().get_plan(subscription.plan_id).await? else {
        return Ok(());
    };

    let amount_cents = object
        .get("amount_paid")
        .and_then(|v| v.as_i64())
        .and_then(|v| i32::try_from(v).ok())
        .unwrap_or(plan.price_cents);

    let mailer = state.shared.mailer.clone();
    let period_end = subscription.current_period_end.clone();
    tokio::spawn(async move {
        if let Err(e) = mailer
            .send_subscription_confirmation(
                &user.email,
                &plan.name,
                amount_cents,
                period_end.as_deref(),
            )
            .await
        {
            warn!("Failed to send subscription confirmation: {}", e);
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        let mut signed = timestamp.to_string().into_bytes();
        signed.push(b'.');
        signed.extend_from_slice(payload);
        let tag = hmac::sign(&key, &signed);
        format!("t={},v1={}", timestamp, hex::encode(tag.as_ref()))
    }

    #[test]
    fn valid_signature_accepted() {
        let payload = br#"{"type":"invoice.paid"}"#;
        let header = sign("whsec_test", 1_700_000_000, payload);

        assert!(verify_signature(
            "whsec_test",
            &header,
            payload,
            1_700_000_000,
            300
        ));
    }

    #[test]
    fn wrong_secret_rejected() {
        let payload = br#"{"type":"invoice.paid"}"#;
        let header = sign("whsec_test", 1_700_000_000, payload);

        assert!(!verify_signature(
            "whsec_other",
            &header,
            payload,
            1_700_000_000,
            300
        ));
    }

    #[test]
    fn tampered_payload_rejected() {
        let header = sign("whsec_test", 1_700_000_000, b"original");

        assert!(!verify_signature(
            "whsec_test",
            &header,
            b"tampered",
            1_700_000_000,
            300
        ));
    }

    #[test]
    fn stale_timestamp_rejected() {
        let payload = b"{}";
        let header = sign("whsec_test", 1_700_000_000, payload);

        assert!(!verify_signature(
            "whsec_test",
            &header,
            payload,
            1_700_000_000 + 301,
            300
        ));
    }

    #[test]
    fn timestamp_within_tolerance_accepted() {
        let payload = b"{}";
        let header = sign("whsec_test", 1_700_000_000, payload);

        assert!(verify_signature(
            "whsec_test",
            &header,
            payload,
            1_700_000_000 + 299,
            300
        ));
    }

    #[test]
    fn malformed_header_rejected() {
        assert!(!verify_signature("s", "nonsense", b"{}", 0, 300));
        assert!(!verify_signature("s", "t=123", b"{}", 123, 300));
        assert!(!verify_signature("s", "v1=abcd", b"{}", 0, 300));
    }

    #[test]
    fn multiple_v1_signatures_any_match() {
        let payload = b"{}";
        let valid = sign("whsec_test", 1_700_000_000, payload);
        let header = format!("{valid},v1=deadbeef");

        assert!(verify_signature(
            "whsec_test",
            &header,
            payload,
            1_700_000_000,
            300
        ));
    }

    #[test]
    fn subscription_state_extracted_from_event() {
        let object = serde_json::json!({
            "id": "sub_123",
            "customer": "cus_456",
            "status": "active",
            "cancel_at_period_end": true,
            "current_period_start": 1_700_000_000,
            "current_period_end": 1_702_592_000,
            "items": { "data": [ { "price": { "id": "price_plus_monthly" } } ] }
        });

        let state = subscription_state(&object, true).unwrap();
        assert_eq!(state.stripe_subscription_id, "sub_123");
        assert_eq!(state.stripe_customer_id.as_deref(), Some("cus_456"));
        assert_eq!(state.price_id.as_deref(), Some("price_plus_monthly"));
        assert!(state.cancel_at_period_end);
        assert_eq!(state.current_period_end, Some(1_702_592_000));
    }
}
