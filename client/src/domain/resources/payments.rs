//! Payment sessions. Writes are authenticated and carry an idempotency key.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::resource_id;
use crate::domain::{AccessError, AccessLayer, RequestDescriptor};

/// Body of `POST /payments/sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSessionRequest {
    /// Activity being paid for.
    pub activity_id: String,
    /// Stage being paid for, when the purchase is per stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_id: Option<String>,
    /// Amount in the currency's minor unit.
    pub amount_minor: u64,
    /// ISO 4217 code.
    pub currency: String,
}

/// Lifecycle state reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Created, awaiting payment.
    Pending,
    /// The payer must complete an extra step such as 3-D Secure.
    RequiresAction,
    /// Paid.
    Succeeded,
    /// The payment was declined or errored.
    Failed,
    /// Abandoned before completion.
    Cancelled,
    /// A status this client does not know yet.
    #[serde(other)]
    Unknown,
}

/// A payment session as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    /// Session identifier.
    pub id: String,
    /// Current lifecycle state.
    pub status: PaymentStatus,
    /// Hosted checkout page, when the provider issues one.
    #[serde(default)]
    pub checkout_url: Option<String>,
    /// Amount in the currency's minor unit.
    pub amount_minor: u64,
    /// ISO 4217 code.
    pub currency: String,
}

impl AccessLayer {
    /// Open a payment session.
    ///
    /// The same idempotency key accompanies every retry of this call, so a
    /// replayed request never opens a second session.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when the request is unusable, otherwise the
    /// classified [`AccessError`] of the call.
    pub async fn submit_payment_session(
        &self,
        request: &PaymentSessionRequest,
        cancel: &CancellationToken,
    ) -> Result<PaymentSession, AccessError> {
        resource_id("activity", &request.activity_id)?;
        if request.amount_minor == 0 {
            return Err(AccessError::validation("A payment amount must be positive."));
        }
        let body = serde_json::to_value(request).map_err(|error| {
            AccessError::unknown(format!("Could not prepare the payment: {error}"))
        })?;
        let descriptor = RequestDescriptor::post("/payments/sessions").with_json(body);
        self.fetch_json(&descriptor, cancel).await
    }

    /// Fetch a payment session.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an unusable id, otherwise the classified
    /// [`AccessError`] of the call.
    pub async fn get_payment_session(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<PaymentSession, AccessError> {
        let id = resource_id("payment session", id)?;
        let descriptor = RequestDescriptor::get(format!("/payments/sessions/{id}"));
        self.fetch_json(&descriptor, cancel).await
    }
}
