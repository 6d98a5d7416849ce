use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use wayfare_core::booking::{Booking, BookingStatus, BookingTarget, TravelBooking};
use wayfare_core::repository::{BookingRepository, TravelBookingRepository};
use wayfare_core::{BookingId, CoreError, CoreResult, DestinationId, TravelBookingId, UserId};
use wayfare_shared::Money;

use crate::{storage, to_count, to_int};

/// Destination bookings and travel bookings share one pool handle.
pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    destination_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    guests: i32,
    total_minor: i64,
    currency: String,
    status: String,
    special_requests: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: BookingId(row.id),
            user_id: UserId(row.user_id),
            destination_id: DestinationId(row.destination_id),
            start_date: row.start_date,
            end_date: row.end_date,
            guests: to_count(row.guests),
            total_price: Money::new(row.total_minor, row.currency),
            status: row.status.parse()?,
            special_requests: row.special_requests,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TravelBookingRow {
    id: Uuid,
    user_id: Uuid,
    target_type: String,
    reference_id: Uuid,
    status: String,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    quantity: i32,
    total_minor: i64,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TravelBookingRow> for TravelBooking {
    type Error = CoreError;

    fn try_from(row: TravelBookingRow) -> Result<Self, Self::Error> {
        Ok(TravelBooking {
            id: TravelBookingId(row.id),
            user_id: UserId(row.user_id),
            target: BookingTarget::from_parts(&row.target_type, row.reference_id)?,
            status: row.status.parse()?,
            start_date: row.start_date,
            end_date: row.end_date,
            quantity: to_count(row.quantity),
            total_price: Money::new(row.total_minor, row.currency),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn lock_target_sql(target: BookingTarget) -> &'static str {
    match target {
        BookingTarget::Flight(_) => "SELECT id FROM flights WHERE id = $1 FOR UPDATE",
        BookingTarget::Car(_) => "SELECT id FROM cars WHERE id = $1 FOR UPDATE",
        BookingTarget::Hotel(_) => "SELECT id FROM hotels WHERE id = $1 FOR UPDATE",
        BookingTarget::Cruise(_) => "SELECT id FROM cruises WHERE id = $1 FOR UPDATE",
    }
}

fn status_names(statuses: &[BookingStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

fn collect<R, T>(rows: Vec<R>) -> CoreResult<Vec<T>>
where
    T: TryFrom<R, Error = CoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn insert_booking(&self, b: &Booking) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, destination_id, start_date, end_date, guests, total_minor, currency, status, special_requests, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(b.id.0)
        .bind(b.user_id.0)
        .bind(b.destination_id.0)
        .bind(b.start_date)
        .bind(b.end_date)
        .bind(to_int(b.guests, "guests")?)
        .bind(b.total_price.amount_minor)
        .bind(&b.total_price.currency)
        .bind(b.status.as_str())
        .bind(&b.special_requests)
        .bind(b.created_at)
        .bind(b.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn get_booking(&self, id: BookingId) -> CoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        row.map(Booking::try_from).transpose()
    }

    async fn get_user_booking(&self, id: BookingId, user: UserId) -> CoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(
            "SELECT * FROM bookings WHERE id = $1 AND user_id = $2",
        )
        .bind(id.0)
        .bind(user.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        row.map(Booking::try_from).transpose()
    }

    async fn list_user_bookings(&self, user: UserId) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(
            "SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user.0)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        collect(rows)
    }

    async fn list_bookings(&self) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        collect(rows)
    }

    async fn transition_booking(
        &self,
        id: BookingId,
        owner: Option<UserId>,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> CoreResult<Option<Booking>> {
        // The status check and the write are one statement, so two racing
        // cancellations cannot both succeed.
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            UPDATE bookings
            SET status = $4, updated_at = NOW()
            WHERE id = $1
              AND ($2::uuid IS NULL OR user_id = $2)
              AND status = ANY($3)
            RETURNING *
            "#,
        )
        .bind(id.0)
        .bind(owner.map(|o| o.0))
        .bind(status_names(from))
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        row.map(Booking::try_from).transpose()
    }

    async fn count_bookings_by_status(&self) -> CoreResult<Vec<(BookingStatus, u64)>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM bookings GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(storage)?;

        let mut counts: Vec<(BookingStatus, u64)> =
            BookingStatus::ALL.into_iter().map(|s| (s, 0)).collect();
        for (status, count) in rows {
            let status: BookingStatus = status.parse()?;
            if let Some(slot) = counts.iter_mut().find(|(s, _)| *s == status) {
                slot.1 = count as u64;
            }
        }
        Ok(counts)
    }
}

#[async_trait]
impl TravelBookingRepository for StoreBookingRepository {
    async fn insert_travel_booking(
        &self,
        b: &TravelBooking,
        check: &(dyn for<'a> Fn(&'a [TravelBooking]) -> CoreResult<()> + Send + Sync),
    ) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        // Holding the catalog row serializes bookings of the same item.
        let locked: Option<Uuid> = sqlx::query_scalar(lock_target_sql(b.target))
            .bind(b.target.reference_id())
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage)?;
        if locked.is_none() {
            return Err(CoreError::not_found(format!("No {} {}", b.target.kind(), b.target.reference_id())));
        }

        let rows = sqlx::query_as::<_, TravelBookingRow>(
            r#"
            SELECT * FROM travel_bookings
            WHERE target_type = $1 AND reference_id = $2 AND status <> 'cancelled'
            "#,
        )
        .bind(b.target.kind())
        .bind(b.target.reference_id())
        .fetch_all(&mut *tx)
        .await
        .map_err(storage)?;
        check(&collect(rows)?)?;

        sqlx::query(
            r#"
            INSERT INTO travel_bookings (id, user_id, target_type, reference_id, status, start_date, end_date, quantity, total_minor, currency, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(b.id.0)
        .bind(b.user_id.0)
        .bind(b.target.kind())
        .bind(b.target.reference_id())
        .bind(b.status.as_str())
        .bind(b.start_date)
        .bind(b.end_date)
        .bind(to_int(b.quantity, "quantity")?)
        .bind(b.total_price.amount_minor)
        .bind(&b.total_price.currency)
        .bind(b.created_at)
        .bind(b.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;
        tx.commit().await.map_err(storage)
    }

    async fn get_user_travel_booking(
        &self,
        id: TravelBookingId,
        user: UserId,
    ) -> CoreResult<Option<TravelBooking>> {
        let row = sqlx::query_as::<_, TravelBookingRow>(
            "SELECT * FROM travel_bookings WHERE id = $1 AND user_id = $2",
        )
        .bind(id.0)
        .bind(user.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        row.map(TravelBooking::try_from).transpose()
    }

    async fn list_user_travel_bookings(&self, user: UserId) -> CoreResult<Vec<TravelBooking>> {
        let rows = sqlx::query_as::<_, TravelBookingRow>(
            "SELECT * FROM travel_bookings WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user.0)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        collect(rows)
    }

    async fn active_bookings_for(&self, target: BookingTarget) -> CoreResult<Vec<TravelBooking>> {
        let rows = sqlx::query_as::<_, TravelBookingRow>(
            r#"
            SELECT * FROM travel_bookings
            WHERE target_type = $1 AND reference_id = $2 AND status <> 'cancelled'
            "#,
        )
        .bind(target.kind())
        .bind(target.reference_id())
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        collect(rows)
    }

    async fn transition_travel_booking(
        &self,
        id: TravelBookingId,
        owner: Option<UserId>,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> CoreResult<Option<TravelBooking>> {
        let row = sqlx::query_as::<_, TravelBookingRow>(
            r#"
            UPDATE travel_bookings
            SET status = $4, updated_at = NOW()
            WHERE id = $1
              AND ($2::uuid IS NULL OR user_id = $2)
              AND status = ANY($3)
            RETURNING *
            "#,
        )
        .bind(id.0)
        .bind(owner.map(|o| o.0))
        .bind(status_names(from))
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        row.map(TravelBooking::try_from).transpose()
    }
}
