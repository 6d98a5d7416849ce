use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{NotificationId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    /// Event kind that produced it, e.g. `booking_confirmed`.
    pub kind: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(user_id: UserId, kind: &str, title: String, message: String) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            kind: kind.to_string(),
            title,
            message,
            read: false,
            created_at: Utc::now(),
        }
    }
}
