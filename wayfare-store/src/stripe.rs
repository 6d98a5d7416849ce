use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use wayfare_core::payment::{
    IntentRequest, IntentStatus, PaymentAdapter, ProcessorCard, ProcessorIntent, ProcessorRefund,
};
use wayfare_core::{CoreError, CoreResult};
use wayfare_shared::Masked;

/// Stripe REST client. Requests are form-encoded and amounts are sent in
/// minor units exactly as stored.
pub struct StripePaymentAdapter {
    client: Client,
    secret_key: Masked<String>,
    api_url: String,
}

impl StripePaymentAdapter {
    pub fn new(secret_key: Masked<String>, api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            secret_key,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> CoreResult<T> {
        let response = request
            .bearer_auth(self.secret_key.expose())
            .send()
            .await
            .map_err(|e| CoreError::ExternalService(format!("Stripe request failed: {}", e)))?;

        match response.status() {
            status if status.is_success() => response
                .json::<T>()
                .await
                .map_err(|e| CoreError::ExternalService(format!("Invalid Stripe response: {}", e))),
            StatusCode::UNAUTHORIZED => Err(CoreError::ExternalService(
                "Stripe rejected the API key".to_string(),
            )),
            StatusCode::NOT_FOUND => Err(CoreError::not_found("Unknown processor object")),
            status => {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ErrorEnvelope>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                Err(CoreError::ExternalService(format!(
                    "Stripe error {}: {}",
                    status.as_u16(),
                    message
                )))
            }
        }
    }
}

#[derive(Deserialize)]
struct IntentObject {
    id: String,
    client_secret: Option<String>,
    status: String,
    #[serde(default)]
    last_payment_error: Option<serde_json::Value>,
}

impl From<IntentObject> for ProcessorIntent {
    fn from(obj: IntentObject) -> Self {
        let failed_attempt = obj.last_payment_error.is_some();
        ProcessorIntent {
            id: obj.id,
            client_secret: obj.client_secret,
            status: intent_status(&obj.status, failed_attempt),
        }
    }
}

#[derive(Deserialize)]
struct RefundObject {
    id: String,
    status: String,
}

#[derive(Deserialize)]
struct MethodObject {
    id: String,
    card: Option<CardDetails>,
}

#[derive(Deserialize)]
struct CardDetails {
    brand: String,
    last4: String,
    exp_month: u32,
    exp_year: u32,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    payment_intent: Option<IntentObject>,
}

/// A declined confirmation leaves the intent in `requires_payment_method`
/// with `last_payment_error` set; locally that attempt has failed.
fn intent_status(raw: &str, failed_attempt: bool) -> IntentStatus {
    match raw {
        "succeeded" => IntentStatus::Succeeded,
        "canceled" => IntentStatus::Canceled,
        "processing" => IntentStatus::Processing,
        "requires_action" | "requires_confirmation" | "requires_capture" => {
            IntentStatus::RequiresAction
        }
        "requires_payment_method" if failed_attempt => IntentStatus::Failed,
        _ => IntentStatus::RequiresPaymentMethod,
    }
}

#[async_trait]
impl PaymentAdapter for StripePaymentAdapter {
    async fn create_and_confirm_intent(&self, request: &IntentRequest) -> CoreResult<ProcessorIntent> {
        let form = [
            ("amount", request.amount.amount_minor.to_string()),
            ("currency", request.amount.currency.to_lowercase()),
            ("payment_method", request.processor_method_id.clone()),
            ("confirm", "true".to_string()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("automatic_payment_methods[allow_redirects]", "never".to_string()),
            ("metadata[booking_id]", request.booking_id.to_string()),
            ("metadata[user_id]", request.user_id.to_string()),
        ];

        let response = self
            .client
            .post(format!("{}/payment_intents", self.api_url))
            .bearer_auth(self.secret_key.expose())
            .form(&form)
            .send()
            .await
            .map_err(|e| CoreError::ExternalService(format!("Stripe request failed: {}", e)))?;

        // A card decline answers 402 but still creates the intent; keep it so
        // the webhook can settle the local record.
        if response.status() == StatusCode::PAYMENT_REQUIRED {
            let body = response.text().await.unwrap_or_default();
            let envelope: ErrorEnvelope = serde_json::from_str(&body)
                .map_err(|e| CoreError::ExternalService(format!("Invalid Stripe response: {}", e)))?;
            return match envelope.error.payment_intent {
                Some(intent) => {
                    tracing::warn!("Card declined for intent {}: {}", intent.id, envelope.error.message);
                    Ok(intent.into())
                }
                None => Err(CoreError::ExternalService(envelope.error.message)),
            };
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::ExternalService(format!(
                "Stripe error {}: {}",
                status.as_u16(),
                body
            )));
        }

        let intent: IntentObject = response
            .json()
            .await
            .map_err(|e| CoreError::ExternalService(format!("Invalid Stripe response: {}", e)))?;
        Ok(intent.into())
    }

    async fn get_intent(&self, intent_id: &str) -> CoreResult<ProcessorIntent> {
        let intent: IntentObject = self
            .send(self.client.get(format!("{}/payment_intents/{}", self.api_url, intent_id)))
            .await?;
        Ok(intent.into())
    }

    async fn refund(&self, intent_id: &str) -> CoreResult<ProcessorRefund> {
        let refund: RefundObject = self
            .send(
                self.client
                    .post(format!("{}/refunds", self.api_url))
                    .form(&[("payment_intent", intent_id)]),
            )
            .await?;
        Ok(ProcessorRefund {
            id: refund.id,
            status: refund.status,
        })
    }

    async fn retrieve_method(&self, processor_method_id: &str) -> CoreResult<ProcessorCard> {
        let method: MethodObject = self
            .send(
                self.client
                    .get(format!("{}/payment_methods/{}", self.api_url, processor_method_id)),
            )
            .await?;
        let card = method
            .card
            .ok_or_else(|| CoreError::validation("Only card payment methods are supported"))?;
        Ok(ProcessorCard {
            id: method.id,
            brand: card.brand,
            last4: card.last4,
            exp_month: card.exp_month,
            exp_year: card.exp_year,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_status_mapping() {
        assert_eq!(intent_status("succeeded", false), IntentStatus::Succeeded);
        assert_eq!(intent_status("requires_capture", false), IntentStatus::RequiresAction);
        assert_eq!(
            intent_status("requires_payment_method", false),
            IntentStatus::RequiresPaymentMethod
        );
        assert_eq!(intent_status("requires_payment_method", true), IntentStatus::Failed);
    }

    #[test]
    fn test_decline_envelope_carries_intent() {
        let body = r#"{"error":{"message":"Your card was declined.","payment_intent":
            {"id":"pi_1","client_secret":"pi_1_secret","status":"requires_payment_method",
             "last_payment_error":{"code":"card_declined"}}}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap();
        let intent: ProcessorIntent = envelope.error.payment_intent.unwrap().into();
        assert_eq!(intent.id, "pi_1");
        assert_eq!(intent.status, IntentStatus::Failed);
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let adapter = StripePaymentAdapter::new(Masked("sk_test".to_string()), "http://localhost/v1/");
        assert_eq!(adapter.api_url, "http://localhost/v1");
    }
}
