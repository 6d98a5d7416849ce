use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use wayfare_shared::Money;

use crate::{ActivityId, CoreError, DestinationId, ReviewId, UserActivityId, UserId};

// ============================================================================
// Bookable activities and their reviews
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default)]
    pub id: ActivityId,
    pub destination_id: Option<DestinationId>,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    /// Mean of the present review ratings, 0 when there are none.
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub author_name: String,
    /// 1-5 stars. Reviews may be text-only.
    pub rating: Option<u8>,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    pub destination: Option<DestinationId>,
    pub category: Option<String>,
}

// ============================================================================
// User activity log
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserActivityKind {
    Search,
    View,
    Booking,
    Wishlist,
}

impl UserActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserActivityKind::Search => "search",
            UserActivityKind::View => "view",
            UserActivityKind::Booking => "booking",
            UserActivityKind::Wishlist => "wishlist",
        }
    }
}

impl fmt::Display for UserActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserActivityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "search" => Ok(UserActivityKind::Search),
            "view" => Ok(UserActivityKind::View),
            "booking" => Ok(UserActivityKind::Booking),
            "wishlist" => Ok(UserActivityKind::Wishlist),
            other => Err(CoreError::validation(format!("unknown activity type '{}'", other))),
        }
    }
}

/// One entry of a user's browsing/booking history, the input of preference
/// aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    pub id: UserActivityId,
    pub user_id: UserId,
    pub activity_type: UserActivityKind,
    pub destination: Option<String>,
    pub category: Option<String>,
    pub price: Option<Money>,
    pub start_date: Option<NaiveDate>,
    pub preferences: Vec<String>,
    pub created_at: DateTime<Utc>,
}
