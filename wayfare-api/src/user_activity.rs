use axum::{extract::State, http::StatusCode, routing::{get, post}, Extension, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use wayfare_core::activity::{UserActivity, UserActivityKind};
use wayfare_core::UserActivityId;
use wayfare_insights::{aggregate, PreferenceProfile};
use wayfare_shared::Money;

use crate::extract::Json;
use crate::{error::AppError, middleware::Claims, state::AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordActivityRequest {
    activity_type: UserActivityKind,
    destination: Option<String>,
    category: Option<String>,
    price: Option<Money>,
    start_date: Option<NaiveDate>,
    #[serde(default)]
    preferences: Vec<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/user-activity", post(record_activity).get(recent_activity))
        .route("/api/user-activity/preferences", get(preferences))
}

/// Blank strings are treated as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// POST /api/user-activity
async fn record_activity(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<RecordActivityRequest>,
) -> Result<(StatusCode, Json<UserActivity>), AppError> {
    let record = UserActivity {
        id: UserActivityId::new(),
        user_id: claims.user_id(),
        activity_type: req.activity_type,
        destination: non_blank(req.destination),
        category: non_blank(req.category),
        price: req.price,
        start_date: req.start_date,
        preferences: req.preferences,
        created_at: Utc::now(),
    };
    state.repos.user_activity.record_activity(&record).await?;
    tracing::debug!("Recorded {} activity for user {}", record.activity_type, record.user_id);
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/user-activity
async fn recent_activity(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<UserActivity>>, AppError> {
    let records = state
        .repos
        .user_activity
        .recent_activity(claims.user_id(), state.history_limit)
        .await?;
    Ok(Json(records))
}

/// GET /api/user-activity/preferences
async fn preferences(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<PreferenceProfile>, AppError> {
    Ok(Json(profile_for(&state, &claims).await?))
}

/// Preference profile over the caller's most recent history.
pub(crate) async fn profile_for(state: &AppState, claims: &Claims) -> Result<PreferenceProfile, AppError> {
    let records = state
        .repos
        .user_activity
        .recent_activity(claims.user_id(), state.history_limit)
        .await?;
    Ok(aggregate(&records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  Lisbon ".to_string())).as_deref(), Some("Lisbon"));
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(None), None);
    }
}
