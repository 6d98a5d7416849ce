use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use wayfare_core::notification::Notification;
use wayfare_core::repository::NotificationRepository;
use wayfare_core::{CoreResult, NotificationId, UserId};

use crate::storage;

pub struct StoreNotificationRepository {
    pool: PgPool,
}

impl StoreNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    title: String,
    message: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: NotificationId(row.id),
            user_id: UserId(row.user_id),
            kind: row.kind,
            title: row.title,
            message: row.message,
            read: row.read,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl NotificationRepository for StoreNotificationRepository {
    async fn insert_notification(&self, n: &Notification) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, kind, title, message, read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(n.id.0)
        .bind(n.user_id.0)
        .bind(&n.kind)
        .bind(&n.title)
        .bind(&n.message)
        .bind(n.read)
        .bind(n.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn list_user_notifications(&self, user: UserId) -> CoreResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user.0)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn unread_count(&self, user: UserId) -> CoreResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT read")
                .bind(user.0)
                .fetch_one(&self.pool)
                .await
                .map_err(storage)?;
        Ok(count as u64)
    }

    async fn mark_read(&self, id: NotificationId, user: UserId) -> CoreResult<bool> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id.0)
                .bind(user.0)
                .execute(&self.pool)
                .await
                .map_err(storage)?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user: UserId) -> CoreResult<u64> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE user_id = $1 AND NOT read")
                .bind(user.0)
                .execute(&self.pool)
                .await
                .map_err(storage)?;
        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, id: NotificationId, user: UserId) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id.0)
            .bind(user.0)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(result.rows_affected() > 0)
    }
}
