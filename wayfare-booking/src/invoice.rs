use chrono::{DateTime, Utc};
use std::sync::Arc;
use wayfare_core::invoice::{Invoice, InvoiceStatus};
use wayfare_core::repository::{InvoiceRepository, PaymentRepository};
use wayfare_core::{CoreError, CoreResult, InvoiceId, PaymentId, UserId};

/// Invoice lifecycle: `draft -> issued -> paid`, voidable until void.
/// Independent of the payment's own status.
pub struct InvoiceService {
    payments: Arc<dyn PaymentRepository>,
    invoices: Arc<dyn InvoiceRepository>,
}

impl InvoiceService {
    pub fn new(payments: Arc<dyn PaymentRepository>, invoices: Arc<dyn InvoiceRepository>) -> Self {
        Self { payments, invoices }
    }

    /// Draft an invoice for one of the caller's payments
    pub async fn create_invoice(&self, user_id: UserId, payment_id: PaymentId) -> CoreResult<Invoice> {
        let payment = self
            .payments
            .get_user_payment(payment_id, user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Payment not found"))?;

        if self.invoices.find_by_payment(payment_id).await?.is_some() {
            return Err(InvoiceError::AlreadyInvoiced(payment_id).into());
        }

        let now = Utc::now();
        let id = InvoiceId::new();
        let invoice = Invoice {
            id,
            user_id,
            payment_id,
            booking_id: payment.booking_id,
            number: invoice_number(id, now),
            amount: payment.amount,
            status: InvoiceStatus::Draft,
            issued_at: None,
            paid_at: None,
            voided_at: None,
            created_at: now,
        };
        self.invoices.insert_invoice(&invoice).await?;

        tracing::info!("Invoice {} drafted for payment {}", invoice.number, payment_id);
        Ok(invoice)
    }

    pub async fn list_invoices(&self, user_id: UserId) -> CoreResult<Vec<Invoice>> {
        self.invoices.list_user_invoices(user_id).await
    }

    pub async fn get_invoice(&self, user_id: UserId, id: InvoiceId) -> CoreResult<Invoice> {
        self.invoices
            .get_user_invoice(id, user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Invoice not found"))
    }

    pub async fn issue(&self, user_id: UserId, id: InvoiceId) -> CoreResult<Invoice> {
        self.transition(user_id, id, InvoiceStatus::Issued).await
    }

    pub async fn mark_paid(&self, user_id: UserId, id: InvoiceId) -> CoreResult<Invoice> {
        self.transition(user_id, id, InvoiceStatus::Paid).await
    }

    pub async fn void(&self, user_id: UserId, id: InvoiceId) -> CoreResult<Invoice> {
        self.transition(user_id, id, InvoiceStatus::Void).await
    }

    async fn transition(&self, user_id: UserId, id: InvoiceId, to: InvoiceStatus) -> CoreResult<Invoice> {
        let from = InvoiceStatus::sources_of(to);
        if let Some(invoice) = self
            .invoices
            .transition_invoice(id, user_id, &from, to, Utc::now())
            .await?
        {
            tracing::info!("Invoice {} is now {}", invoice.number, invoice.status);
            return Ok(invoice);
        }

        // Nothing matched: tell a missing invoice apart from a bad transition.
        let current = self.get_invoice(user_id, id).await?;
        Err(InvoiceError::InvalidTransition {
            from: current.status,
            to,
        }
        .into())
    }
}

/// `INV-YYYYMMDD-XXXXXXXX`, the suffix taken from the invoice id.
fn invoice_number(id: InvoiceId, at: DateTime<Utc>) -> String {
    let simple = id.as_uuid().simple().to_string().to_uppercase();
    format!("INV-{}-{}", at.format("%Y%m%d"), &simple[..8])
}

#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    #[error("Payment {0} already has an invoice")]
    AlreadyInvoiced(PaymentId),

    #[error("Cannot move invoice from {from} to {to}")]
    InvalidTransition {
        from: InvoiceStatus,
        to: InvoiceStatus,
    },
}

impl From<InvoiceError> for CoreError {
    fn from(err: InvoiceError) -> Self {
        CoreError::InvalidState(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wayfare_core::payment::{Payment, PaymentStatus};
    use wayfare_core::{BookingId, PaymentMethodId};
    use wayfare_shared::Money;
    use wayfare_store::memory::MemoryStore;

    async fn setup() -> (InvoiceService, UserId, PaymentId) {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new();
        let payment = Payment {
            id: PaymentId::new(),
            user_id: user,
            booking_id: BookingId::new(),
            payment_method_id: PaymentMethodId::new(),
            amount: Money::new(9_900, "USD"),
            status: PaymentStatus::Completed,
            processor_intent_id: "pi_1".to_string(),
            refund_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.insert_payment(&payment).await.unwrap();
        (InvoiceService::new(store.clone(), store), user, payment.id)
    }

    #[test]
    fn test_number_format() {
        let id = InvoiceId(uuid::Uuid::parse_str("0a1b2c3d-0000-4000-8000-000000000000").unwrap());
        let at = Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap();
        assert_eq!(invoice_number(id, at), "INV-20250131-0A1B2C3D");
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let (service, user, payment) = setup().await;
        let invoice = service.create_invoice(user, payment).await.unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.amount.amount_minor, 9_900);

        let issued = service.issue(user, invoice.id).await.unwrap();
        assert!(issued.issued_at.is_some());
        let paid = service.mark_paid(user, invoice.id).await.unwrap();
        assert!(paid.paid_at.is_some());
        let void = service.void(user, invoice.id).await.unwrap();
        assert_eq!(void.status, InvoiceStatus::Void);

        let err = service.issue(user, invoice.id).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_cannot_pay_a_draft() {
        let (service, user, payment) = setup().await;
        let invoice = service.create_invoice(user, payment).await.unwrap();
        let err = service.mark_paid(user, invoice.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot move invoice from draft to paid");
    }

    #[tokio::test]
    async fn test_one_invoice_per_payment() {
        let (service, user, payment) = setup().await;
        service.create_invoice(user, payment).await.unwrap();
        assert!(matches!(
            service.create_invoice(user, payment).await,
            Err(CoreError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_foreign_payment_and_invoice_are_not_found() {
        let (service, user, payment) = setup().await;
        let stranger = UserId::new();
        assert!(matches!(
            service.create_invoice(stranger, payment).await,
            Err(CoreError::NotFound(_))
        ));

        let invoice = service.create_invoice(user, payment).await.unwrap();
        assert!(matches!(
            service.issue(stranger, invoice.id).await,
            Err(CoreError::NotFound(_))
        ));
    }
}
