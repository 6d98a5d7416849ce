use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wayfare_core::booking::BookingStatus;
use wayfare_core::payment::{
    IntentRequest, IntentStatus, Payment, PaymentAdapter, PaymentStatus, ProcessorCard,
    ProcessorIntent, ProcessorRefund,
};
use wayfare_core::repository::{BookingRepository, PaymentMethodRepository, PaymentRepository};
use wayfare_core::{BookingId, CoreError, CoreResult, PaymentId, PaymentMethodId, UserId};
use wayfare_shared::models::events::DomainEvent;

use crate::notifier::Notifier;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentCreated {
    pub client_secret: Option<String>,
    pub payment_id: PaymentId,
}

/// Drives payments against the processor and keeps the local records in step
pub struct PaymentOrchestrator {
    adapter: Arc<dyn PaymentAdapter>,
    bookings: Arc<dyn BookingRepository>,
    methods: Arc<dyn PaymentMethodRepository>,
    payments: Arc<dyn PaymentRepository>,
    notifier: Arc<Notifier>,
}

impl PaymentOrchestrator {
    pub fn new(
        adapter: Arc<dyn PaymentAdapter>,
        bookings: Arc<dyn BookingRepository>,
        methods: Arc<dyn PaymentMethodRepository>,
        payments: Arc<dyn PaymentRepository>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            adapter,
            bookings,
            methods,
            payments,
            notifier,
        }
    }

    /// Create and confirm an intent for the booking total.
    ///
    /// The local record always starts `pending`; only the processor webhook
    /// moves it on.
    pub async fn create_payment_intent(
        &self,
        user_id: UserId,
        booking_id: BookingId,
        payment_method_id: PaymentMethodId,
    ) -> CoreResult<PaymentIntentCreated> {
        let booking = self
            .bookings
            .get_user_booking(booking_id, user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Booking not found"))?;

        if booking.status == BookingStatus::Cancelled {
            return Err(CoreError::invalid_state("Cannot pay for a cancelled booking"));
        }

        let method = self
            .methods
            .get_user_method(payment_method_id, user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Payment method not found"))?;

        let intent = self
            .adapter
            .create_and_confirm_intent(&IntentRequest {
                amount: booking.total_price.clone(),
                processor_method_id: method.processor_method_id.clone(),
                booking_id,
                user_id,
            })
            .await?;

        let now = Utc::now();
        let payment = Payment {
            id: PaymentId::new(),
            user_id,
            booking_id,
            payment_method_id: method.id,
            amount: booking.total_price,
            status: PaymentStatus::Pending,
            processor_intent_id: intent.id.clone(),
            refund_id: None,
            created_at: now,
            updated_at: now,
        };
        self.payments.insert_payment(&payment).await?;

        tracing::info!(
            "Payment {} created for booking {} (intent {}, {})",
            payment.id,
            booking_id,
            intent.id,
            payment.amount
        );

        Ok(PaymentIntentCreated {
            client_secret: intent.client_secret,
            payment_id: payment.id,
        })
    }

    /// Refund a completed payment in full
    pub async fn refund(&self, user_id: UserId, payment_id: PaymentId) -> CoreResult<Payment> {
        let payment = self
            .payments
            .get_user_payment(payment_id, user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Payment not found"))?;

        if !payment.status.can_transition_to(PaymentStatus::Refunded) {
            return Err(CoreError::invalid_state(format!(
                "Only completed payments can be refunded (payment is {})",
                payment.status
            )));
        }

        let refund = self.adapter.refund(&payment.processor_intent_id).await?;

        let refunded = self
            .payments
            .transition_payment(
                payment_id,
                PaymentStatus::Completed,
                PaymentStatus::Refunded,
                Some(&refund.id),
            )
            .await?
            .ok_or_else(|| {
                tracing::error!(
                    "Refund {} issued but payment {} was no longer completed",
                    refund.id,
                    payment_id
                );
                CoreError::invalid_state("Payment changed while refunding")
            })?;

        tracing::info!("Payment {} refunded ({})", payment_id, refund.id);
        self.notifier
            .publish(DomainEvent::PaymentRefunded {
                payment_id: payment_id.as_uuid(),
                user_id: user_id.as_uuid(),
                amount: refunded.amount.clone(),
                refund_id: refund.id,
            })
            .await;

        Ok(refunded)
    }

    /// Process a status update (from the processor webhook).
    ///
    /// The event body is only a hint: the intent is re-read from the processor
    /// and its status decides. Unknown intents and non-final statuses are
    /// acknowledged with `None`.
    pub async fn process_status_update(&self, intent_id: &str) -> CoreResult<Option<Payment>> {
        let Some(payment) = self.payments.find_by_intent(intent_id).await? else {
            tracing::warn!("Webhook for unknown intent {}", intent_id);
            return Ok(None);
        };

        let intent = self.adapter.get_intent(intent_id).await?;
        let next = match intent.status {
            IntentStatus::Succeeded => PaymentStatus::Completed,
            IntentStatus::Failed | IntentStatus::Canceled => PaymentStatus::Failed,
            _ => return Ok(None),
        };

        let Some(updated) = self
            .payments
            .transition_payment(payment.id, PaymentStatus::Pending, next, None)
            .await?
        else {
            // Duplicate delivery, or the payment already moved on.
            return Ok(None);
        };

        tracing::info!("Payment {} is now {}", updated.id, updated.status);
        let event = match next {
            PaymentStatus::Completed => DomainEvent::PaymentCompleted {
                payment_id: updated.id.as_uuid(),
                user_id: updated.user_id.as_uuid(),
                amount: updated.amount.clone(),
            },
            _ => DomainEvent::PaymentFailed {
                payment_id: updated.id.as_uuid(),
                user_id: updated.user_id.as_uuid(),
            },
        };
        self.notifier.publish(event).await;

        Ok(Some(updated))
    }

    pub async fn list_payments(&self, user_id: UserId) -> CoreResult<Vec<Payment>> {
        self.payments.list_user_payments(user_id).await
    }
}

/// In-process processor for development and tests.
///
/// Intents succeed immediately unless the card id contains `declined`.
#[derive(Default)]
pub struct MockPaymentAdapter {
    intents: Mutex<HashMap<String, IntentStatus>>,
}

impl MockPaymentAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force an intent into a status, as the processor would on its side.
    pub fn set_intent_status(&self, intent_id: &str, status: IntentStatus) {
        if let Ok(mut intents) = self.intents.lock() {
            intents.insert(intent_id.to_string(), status);
        }
    }

    fn lookup(&self, intent_id: &str) -> CoreResult<IntentStatus> {
        let intents = self
            .intents
            .lock()
            .map_err(|_| CoreError::ExternalService("mock processor poisoned".to_string()))?;
        intents
            .get(intent_id)
            .cloned()
            .ok_or_else(|| CoreError::ExternalService(format!("No such intent: {}", intent_id)))
    }
}

#[async_trait::async_trait]
impl PaymentAdapter for MockPaymentAdapter {
    async fn create_and_confirm_intent(&self, request: &IntentRequest) -> CoreResult<ProcessorIntent> {
        let id = format!("mock_pi_{}", uuid::Uuid::new_v4().simple());
        let status = if request.processor_method_id.contains("declined") {
            IntentStatus::Failed
        } else {
            IntentStatus::Succeeded
        };
        self.set_intent_status(&id, status.clone());

        Ok(ProcessorIntent {
            client_secret: Some(format!("{}_secret_mock", id)),
            id,
            status,
        })
    }

    async fn get_intent(&self, intent_id: &str) -> CoreResult<ProcessorIntent> {
        Ok(ProcessorIntent {
            id: intent_id.to_string(),
            client_secret: None,
            status: self.lookup(intent_id)?,
        })
    }

    async fn refund(&self, intent_id: &str) -> CoreResult<ProcessorRefund> {
        if self.lookup(intent_id)? != IntentStatus::Succeeded {
            return Err(CoreError::ExternalService(format!(
                "Intent {} has nothing to refund",
                intent_id
            )));
        }
        Ok(ProcessorRefund {
            id: format!("mock_re_{}", uuid::Uuid::new_v4().simple()),
            status: "succeeded".to_string(),
        })
    }

    async fn retrieve_method(&self, processor_method_id: &str) -> CoreResult<ProcessorCard> {
        let brand = processor_method_id
            .strip_prefix("pm_card_")
            .filter(|b| ["visa", "mastercard", "amex"].contains(b))
            .unwrap_or("visa");
        Ok(ProcessorCard {
            id: processor_method_id.to_string(),
            brand: brand.to_string(),
            last4: if brand == "amex" { "8431" } else { "4242" }.to_string(),
            exp_month: 12,
            exp_year: 2034,
        })
    }
}
