use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use wayfare_core::invoice::{Invoice, InvoiceStatus};
use wayfare_core::repository::InvoiceRepository;
use wayfare_core::{BookingId, CoreError, CoreResult, InvoiceId, PaymentId, UserId};
use wayfare_shared::Money;

use crate::{is_unique_violation, storage};

pub struct StoreInvoiceRepository {
    pool: PgPool,
}

impl StoreInvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct InvoiceRow {
    id: Uuid,
    user_id: Uuid,
    payment_id: Uuid,
    booking_id: Uuid,
    number: String,
    amount_minor: i64,
    currency: String,
    status: String,
    issued_at: Option<DateTime<Utc>>,
    paid_at: Option<DateTime<Utc>>,
    voided_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = CoreError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        Ok(Invoice {
            id: InvoiceId(row.id),
            user_id: UserId(row.user_id),
            payment_id: PaymentId(row.payment_id),
            booking_id: BookingId(row.booking_id),
            number: row.number,
            amount: Money::new(row.amount_minor, row.currency),
            status: row.status.parse()?,
            issued_at: row.issued_at,
            paid_at: row.paid_at,
            voided_at: row.voided_at,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl InvoiceRepository for StoreInvoiceRepository {
    async fn insert_invoice(&self, i: &Invoice) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO invoices (id, user_id, payment_id, booking_id, number, amount_minor, currency, status, issued_at, paid_at, voided_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(i.id.0)
        .bind(i.user_id.0)
        .bind(i.payment_id.0)
        .bind(i.booking_id.0)
        .bind(&i.number)
        .bind(i.amount.amount_minor)
        .bind(&i.amount.currency)
        .bind(i.status.as_str())
        .bind(i.issued_at)
        .bind(i.paid_at)
        .bind(i.voided_at)
        .bind(i.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CoreError::invalid_state("Payment already has an invoice")
            } else {
                storage(e)
            }
        })?;
        Ok(())
    }

    async fn get_user_invoice(&self, id: InvoiceId, user: UserId) -> CoreResult<Option<Invoice>> {
        let row = sqlx::query_as::<_, InvoiceRow>(
            "SELECT * FROM invoices WHERE id = $1 AND user_id = $2",
        )
        .bind(id.0)
        .bind(user.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        row.map(Invoice::try_from).transpose()
    }

    async fn find_by_payment(&self, payment: PaymentId) -> CoreResult<Option<Invoice>> {
        let row = sqlx::query_as::<_, InvoiceRow>("SELECT * FROM invoices WHERE payment_id = $1")
            .bind(payment.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        row.map(Invoice::try_from).transpose()
    }

    async fn list_user_invoices(&self, user: UserId) -> CoreResult<Vec<Invoice>> {
        let rows = sqlx::query_as::<_, InvoiceRow>(
            "SELECT * FROM invoices WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user.0)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        rows.into_iter().map(Invoice::try_from).collect()
    }

    async fn transition_invoice(
        &self,
        id: InvoiceId,
        user: UserId,
        from: &[InvoiceStatus],
        to: InvoiceStatus,
        at: DateTime<Utc>,
    ) -> CoreResult<Option<Invoice>> {
        let from: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();
        let row = sqlx::query_as::<_, InvoiceRow>(
            r#"
            UPDATE invoices
            SET status = $4,
                issued_at = CASE WHEN $4 = 'issued' THEN $5 ELSE issued_at END,
                paid_at = CASE WHEN $4 = 'paid' THEN $5 ELSE paid_at END,
                voided_at = CASE WHEN $4 = 'void' THEN $5 ELSE voided_at END
            WHERE id = $1 AND user_id = $2 AND status = ANY($3)
            RETURNING *
            "#,
        )
        .bind(id.0)
        .bind(user.0)
        .bind(from)
        .bind(to.as_str())
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        row.map(Invoice::try_from).transpose()
    }
}
