use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use wayfare_core::payment::{Payment, PaymentMethod, PaymentStatus, PaymentStatusSummary};
use wayfare_core::repository::{PaymentMethodRepository, PaymentRepository};
use wayfare_core::{BookingId, CoreError, CoreResult, PaymentId, PaymentMethodId, UserId};
use wayfare_shared::Money;

use crate::{is_exclusion_violation, storage, to_count, to_int};

/// Payments and saved payment methods.
pub struct StorePaymentRepository {
    pool: PgPool,
}

impl StorePaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The card becomes default only when `may_default` is set and the user
    /// has none yet.
    async fn insert_method_row(
        &self,
        m: &PaymentMethod,
        expiry: (i32, i32),
        may_default: bool,
    ) -> Result<PaymentMethod, sqlx::Error> {
        let row = sqlx::query_as::<_, MethodRow>(
            r#"
            INSERT INTO payment_methods (id, user_id, processor_method_id, brand, last4, exp_month, exp_year, is_default, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7,
                    $9 AND NOT EXISTS (SELECT 1 FROM payment_methods WHERE user_id = $2 AND is_default),
                    $8)
            RETURNING *
            "#,
        )
        .bind(m.id.0)
        .bind(m.user_id.0)
        .bind(&m.processor_method_id)
        .bind(&m.brand)
        .bind(&m.last4)
        .bind(expiry.0)
        .bind(expiry.1)
        .bind(m.created_at)
        .bind(may_default)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    user_id: Uuid,
    booking_id: Uuid,
    payment_method_id: Uuid,
    amount_minor: i64,
    currency: String,
    status: String,
    processor_intent_id: String,
    refund_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = CoreError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId(row.id),
            user_id: UserId(row.user_id),
            booking_id: BookingId(row.booking_id),
            payment_method_id: PaymentMethodId(row.payment_method_id),
            amount: Money::new(row.amount_minor, row.currency),
            status: row.status.parse()?,
            processor_intent_id: row.processor_intent_id,
            refund_id: row.refund_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MethodRow {
    id: Uuid,
    user_id: Uuid,
    processor_method_id: String,
    brand: String,
    last4: String,
    exp_month: i32,
    exp_year: i32,
    is_default: bool,
    created_at: DateTime<Utc>,
}

impl From<MethodRow> for PaymentMethod {
    fn from(row: MethodRow) -> Self {
        PaymentMethod {
            id: PaymentMethodId(row.id),
            user_id: UserId(row.user_id),
            processor_method_id: row.processor_method_id,
            brand: row.brand,
            last4: row.last4,
            exp_month: to_count(row.exp_month),
            exp_year: to_count(row.exp_year),
            is_default: row.is_default,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PaymentRepository for StorePaymentRepository {
    async fn insert_payment(&self, p: &Payment) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, user_id, booking_id, payment_method_id, amount_minor, currency, status, processor_intent_id, refund_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(p.id.0)
        .bind(p.user_id.0)
        .bind(p.booking_id.0)
        .bind(p.payment_method_id.0)
        .bind(p.amount.amount_minor)
        .bind(&p.amount.currency)
        .bind(p.status.as_str())
        .bind(&p.processor_intent_id)
        .bind(&p.refund_id)
        .bind(p.created_at)
        .bind(p.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn get_user_payment(&self, id: PaymentId, user: UserId) -> CoreResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(
            "SELECT * FROM payments WHERE id = $1 AND user_id = $2",
        )
        .bind(id.0)
        .bind(user.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        row.map(Payment::try_from).transpose()
    }

    async fn find_by_intent(&self, intent_id: &str) -> CoreResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(
            "SELECT * FROM payments WHERE processor_intent_id = $1",
        )
        .bind(intent_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        row.map(Payment::try_from).transpose()
    }

    async fn list_user_payments(&self, user: UserId) -> CoreResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            "SELECT * FROM payments WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user.0)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        rows.into_iter().map(Payment::try_from).collect()
    }

    async fn transition_payment(
        &self,
        id: PaymentId,
        from: PaymentStatus,
        to: PaymentStatus,
        refund_id: Option<&str>,
    ) -> CoreResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            UPDATE payments
            SET status = $3, refund_id = COALESCE($4, refund_id), updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id.0)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(refund_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        row.map(Payment::try_from).transpose()
    }

    async fn payment_summary(&self) -> CoreResult<Vec<PaymentStatusSummary>> {
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*), COALESCE(SUM(amount_minor), 0)::bigint
            FROM payments
            GROUP BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        let mut summary: Vec<PaymentStatusSummary> = PaymentStatus::ALL
            .into_iter()
            .map(|status| PaymentStatusSummary {
                status,
                count: 0,
                amount_minor: 0,
            })
            .collect();
        for (status, count, amount) in rows {
            let status: PaymentStatus = status.parse()?;
            if let Some(slot) = summary.iter_mut().find(|s| s.status == status) {
                slot.count = count as u64;
                slot.amount_minor = amount;
            }
        }
        Ok(summary)
    }
}

#[async_trait]
impl PaymentMethodRepository for StorePaymentRepository {
    async fn insert_method(&self, m: &PaymentMethod) -> CoreResult<PaymentMethod> {
        let expiry = (
            to_int(m.exp_month, "exp_month")?,
            to_int(m.exp_year, "exp_year")?,
        );
        match self.insert_method_row(m, expiry, true).await {
            // A concurrent first card won the default; store this one plain.
            Err(err) if is_exclusion_violation(&err) => {
                tracing::debug!("Default card taken concurrently, saving {} as non-default", m.id);
                self.insert_method_row(m, expiry, false).await.map_err(storage)
            }
            other => other.map_err(storage),
        }
    }

    async fn get_user_method(
        &self,
        id: PaymentMethodId,
        user: UserId,
    ) -> CoreResult<Option<PaymentMethod>> {
        let row = sqlx::query_as::<_, MethodRow>(
            "SELECT * FROM payment_methods WHERE id = $1 AND user_id = $2",
        )
        .bind(id.0)
        .bind(user.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        Ok(row.map(Into::into))
    }

    async fn list_user_methods(&self, user: UserId) -> CoreResult<Vec<PaymentMethod>> {
        let rows = sqlx::query_as::<_, MethodRow>(
            r#"
            SELECT * FROM payment_methods
            WHERE user_id = $1
            ORDER BY is_default DESC, created_at DESC
            "#,
        )
        .bind(user.0)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_method(&self, id: PaymentMethodId, user: UserId) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM payment_methods WHERE id = $1 AND user_id = $2")
            .bind(id.0)
            .bind(user.0)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_default_method(&self, id: PaymentMethodId, user: UserId) -> CoreResult<bool> {
        // One statement flips every card of the user, so there is never a
        // moment with two defaults.
        let result = sqlx::query(
            r#"
            UPDATE payment_methods
            SET is_default = (id = $1)
            WHERE user_id = $2
              AND EXISTS (SELECT 1 FROM payment_methods WHERE id = $1 AND user_id = $2)
            "#,
        )
        .bind(id.0)
        .bind(user.0)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(result.rows_affected() > 0)
    }
}
