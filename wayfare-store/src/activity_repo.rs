use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use wayfare_catalog::average_rating;
use wayfare_core::activity::{Activity, ActivityQuery, Review, UserActivity};
use wayfare_core::repository::{ActivityRepository, UserActivityRepository};
use wayfare_core::{
    ActivityId, CoreError, CoreResult, DestinationId, ReviewId, UserActivityId, UserId,
};
use wayfare_shared::Money;

use crate::{storage, to_count, to_int};

/// Activities with their reviews, plus the per-user activity log.
pub struct StoreActivityRepository {
    pool: PgPool,
}

impl StoreActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ActivityRow {
    id: Uuid,
    destination_id: Option<Uuid>,
    title: String,
    category: String,
    description: String,
    price_minor: i64,
    currency: String,
    rating: f64,
    review_count: i32,
    created_at: DateTime<Utc>,
}

impl From<ActivityRow> for Activity {
    fn from(row: ActivityRow) -> Self {
        Activity {
            id: ActivityId(row.id),
            destination_id: row.destination_id.map(DestinationId),
            title: row.title,
            category: row.category,
            description: row.description,
            price: Money::new(row.price_minor, row.currency),
            rating: row.rating,
            review_count: to_count(row.review_count),
            reviews: Vec::new(),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    user_id: Uuid,
    author_name: String,
    rating: Option<i16>,
    comment: String,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: ReviewId(row.id),
            user_id: UserId(row.user_id),
            author_name: row.author_name,
            rating: row.rating.and_then(|r| u8::try_from(r).ok()),
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserActivityRow {
    id: Uuid,
    user_id: Uuid,
    activity_type: String,
    destination: Option<String>,
    category: Option<String>,
    price_minor: Option<i64>,
    currency: Option<String>,
    start_date: Option<NaiveDate>,
    preferences: Vec<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserActivityRow> for UserActivity {
    type Error = CoreError;

    fn try_from(row: UserActivityRow) -> Result<Self, Self::Error> {
        let price = match (row.price_minor, row.currency) {
            (Some(amount), Some(currency)) => Some(Money::new(amount, currency)),
            _ => None,
        };
        Ok(UserActivity {
            id: UserActivityId(row.id),
            user_id: UserId(row.user_id),
            activity_type: row.activity_type.parse()?,
            destination: row.destination,
            category: row.category,
            price,
            start_date: row.start_date,
            preferences: row.preferences,
            created_at: row.created_at,
        })
    }
}

impl StoreActivityRepository {
    async fn reviews_for(&self, id: ActivityId) -> CoreResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT id, user_id, author_name, rating, comment, created_at
            FROM reviews
            WHERE activity_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl ActivityRepository for StoreActivityRepository {
    async fn create_activity(&self, a: &Activity) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activities (id, destination_id, title, category, description, price_minor, currency, rating, review_count, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(a.id.0)
        .bind(a.destination_id.map(|d| d.0))
        .bind(&a.title)
        .bind(&a.category)
        .bind(&a.description)
        .bind(a.price.amount_minor)
        .bind(&a.price.currency)
        .bind(a.rating)
        .bind(to_int(a.review_count, "review_count")?)
        .bind(a.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn get_activity(&self, id: ActivityId) -> CoreResult<Option<Activity>> {
        let row = sqlx::query_as::<_, ActivityRow>("SELECT * FROM activities WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut activity = Activity::from(row);
        activity.reviews = self.reviews_for(id).await?;
        Ok(Some(activity))
    }

    async fn list_activities(&self, query: &ActivityQuery) -> CoreResult<Vec<Activity>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT * FROM activities
            WHERE ($1::uuid IS NULL OR destination_id = $1)
              AND ($2::text IS NULL OR LOWER(category) = LOWER(TRIM($2)))
            ORDER BY created_at
            "#,
        )
        .bind(query.destination.map(|d| d.0))
        .bind(query.category.as_deref())
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn search_activities(&self, term: &str, limit: usize) -> CoreResult<Vec<Activity>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT * FROM activities
            WHERE POSITION($1 IN LOWER(title)) > 0 OR POSITION($1 IN LOWER(category)) > 0
            ORDER BY title
            LIMIT $2
            "#,
        )
        .bind(term)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn add_review(&self, id: ActivityId, review: &Review) -> CoreResult<Option<Activity>> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        // Row lock serializes concurrent reviews of the same activity.
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM activities WHERE id = $1 FOR UPDATE")
                .bind(id.0)
                .fetch_optional(&mut *tx)
                .await
                .map_err(storage)?;
        if locked.is_none() {
            return Ok(None);
        }

        sqlx::query(
            r#"
            INSERT INTO reviews (id, activity_id, user_id, author_name, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(review.id.0)
        .bind(id.0)
        .bind(review.user_id.0)
        .bind(&review.author_name)
        .bind(review.rating.map(i16::from))
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        let ratings: Vec<Option<i16>> =
            sqlx::query_scalar("SELECT rating FROM reviews WHERE activity_id = $1")
                .bind(id.0)
                .fetch_all(&mut *tx)
                .await
                .map_err(storage)?;
        let count = ratings.len();
        let average = average_rating(
            ratings
                .into_iter()
                .map(|r| r.and_then(|r| u8::try_from(r).ok())),
        );

        let row = sqlx::query_as::<_, ActivityRow>(
            r#"
            UPDATE activities SET rating = $2, review_count = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.0)
        .bind(average)
        .bind(count as i32)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage)?;

        tx.commit().await.map_err(storage)?;

        let mut activity = Activity::from(row);
        activity.reviews = self.reviews_for(id).await?;
        Ok(Some(activity))
    }
}

#[async_trait]
impl UserActivityRepository for StoreActivityRepository {
    async fn record_activity(&self, a: &UserActivity) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_activities (id, user_id, activity_type, destination, category, price_minor, currency, start_date, preferences, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(a.id.0)
        .bind(a.user_id.0)
        .bind(a.activity_type.as_str())
        .bind(&a.destination)
        .bind(&a.category)
        .bind(a.price.as_ref().map(|p| p.amount_minor))
        .bind(a.price.as_ref().map(|p| p.currency.clone()))
        .bind(a.start_date)
        .bind(&a.preferences)
        .bind(a.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn recent_activity(&self, user: UserId, limit: usize) -> CoreResult<Vec<UserActivity>> {
        let rows = sqlx::query_as::<_, UserActivityRow>(
            r#"
            SELECT * FROM user_activities
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user.0)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        rows.into_iter().map(UserActivity::try_from).collect()
    }
}
