use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::error;
use uuid::Uuid;

use skylane_core::payment::{PaymentGateway, PaymentIntent};
use skylane_core::{CoreError, CoreResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_BASE_URL: &str = "https://api.stripe.com/v1";

pub const EVENT_PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const EVENT_PAYMENT_FAILED: &str = "payment_intent.payment_failed";

/// Metadata key carrying the booking a payment intent belongs to.
pub const METADATA_BOOKING_ID: &str = "booking_id";

/// Stripe payment-intents over the form-encoded REST API, authenticated
/// with the secret key via HTTP basic auth.
pub struct StripeGateway {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl StripeGateway {
    pub fn new(secret_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    async fn parse_intent(&self, response: reqwest::Response) -> CoreResult<PaymentIntent> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Stripe request failed: HTTP {status} - {body}");
            return Err(CoreError::Upstream(format!(
                "payment processor returned HTTP {status}"
            )));
        }
        response
            .json::<PaymentIntent>()
            .await
            .map_err(|e| CoreError::Upstream(format!("invalid payment processor response: {e}")))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        booking_id: Uuid,
        description: &str,
    ) -> CoreResult<PaymentIntent> {
        let url = format!("{}/payment_intents", self.base_url);
        let booking_id = booking_id.to_string();
        let amount = amount_minor.to_string();
        let params = [
            ("amount", amount.as_str()),
            ("currency", currency),
            ("description", description),
            ("metadata[booking_id]", booking_id.as_str()),
        ];

        let response = self
            .http
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .map_err(|e| CoreError::Upstream(e.to_string()))?;
        self.parse_intent(response).await
    }

    async fn get_intent(&self, intent_id: &str) -> CoreResult<PaymentIntent> {
        let url = format!("{}/payment_intents/{intent_id}", self.base_url);
        let response = self
            .http
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| CoreError::Upstream(e.to_string()))?;
        self.parse_intent(response).await
    }
}

// ============================================================================
// Webhook payload
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: PaymentIntentObject,
}

#[derive(Debug, Deserialize)]
pub struct PaymentIntentObject {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentIntentObject {
    pub fn booking_id(&self) -> Option<Uuid> {
        self.metadata
            .get(METADATA_BOOKING_ID)
            .and_then(|raw| Uuid::parse_str(raw).ok())
    }
}

/// Verify a `Stripe-Signature` header (`t=<ts>,v1=<hex>,...`) against the
/// raw payload: HMAC-SHA256 of `"{t}.{payload}"` keyed by the webhook
/// secret must match one of the `v1` entries.
pub fn verify_webhook_signature(payload: &[u8], header: &str, secret: &str) -> bool {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }
    let (Some(timestamp), false) = (timestamp, signatures.is_empty()) else {
        return false;
    };

    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    signatures.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|expected| mac.clone().verify_slice(&expected).is_ok())
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(payload: &[u8], timestamp: &str, secret: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_signature_is_accepted() {
        let payload = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;
        let signature = sign(payload, "1700000000", "whsec_test");
        let header = format!("t=1700000000,v1={signature}");
        assert!(verify_webhook_signature(payload, &header, "whsec_test"));
    }

    #[test]
    fn test_wrong_secret_or_tampered_payload_is_rejected() {
        let payload = br#"{"id":"evt_1"}"#;
        let signature = sign(payload, "1700000000", "whsec_test");
        let header = format!("t=1700000000,v1={signature}");
        assert!(!verify_webhook_signature(payload, &header, "whsec_other"));
        assert!(!verify_webhook_signature(b"{}", &header, "whsec_test"));
        assert!(!verify_webhook_signature(payload, "t=1700000000", "whsec_test"));
        assert!(!verify_webhook_signature(payload, "garbage", "whsec_test"));
    }

    #[test]
    fn test_event_payload_deserializes() {
        let raw = r#"{
            "id": "evt_123",
            "type": "payment_intent.succeeded",
            "data": {
                "object": {
                    "id": "pi_123",
                    "status": "succeeded",
                    "metadata": {"booking_id": "7e5a95a3-4296-45c7-bd37-45a24008317c"}
                }
            }
        }"#;
        let event: StripeEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.event_type, EVENT_PAYMENT_SUCCEEDED);
        assert_eq!(
            event.data.object.booking_id(),
            Some(Uuid::parse_str("7e5a95a3-4296-45c7-bd37-45a24008317c").unwrap())
        );
    }

    #[test]
    fn test_event_without_booking_metadata() {
        let raw = r#"{
            "id": "evt_9",
            "type": "payment_intent.payment_failed",
            "data": {"object": {"id": "pi_9", "status": "requires_payment_method"}}
        }"#;
        let event: StripeEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.event_type, EVENT_PAYMENT_FAILED);
        assert_eq!(event.data.object.booking_id(), None);
    }
}
