use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::CoreResult;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    RequiresCapture,
    Processing,
    Succeeded,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for PaymentIntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PaymentIntentStatus::RequiresPaymentMethod => "requires_payment_method",
            PaymentIntentStatus::RequiresConfirmation => "requires_confirmation",
            PaymentIntentStatus::RequiresAction => "requires_action",
            PaymentIntentStatus::RequiresCapture => "requires_capture",
            PaymentIntentStatus::Processing => "processing",
            PaymentIntentStatus::Succeeded => "succeeded",
            PaymentIntentStatus::Canceled => "canceled",
            PaymentIntentStatus::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// A processor-side payment intent, referenced by its opaque ID.
/// `amount` is in the smallest currency unit; the conversion from the
/// stored major-unit price happens only at the gateway boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: PaymentIntentStatus,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent with the processor. `amount_minor` is in
    /// the smallest currency unit (cents for USD).
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        booking_id: Uuid,
        description: &str,
    ) -> CoreResult<PaymentIntent>;

    /// Retrieve the current state of an intent.
    async fn get_intent(&self, intent_id: &str) -> CoreResult<PaymentIntent>;
}
