use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Router,
};
use chrono::Utc;
use serde::Deserialize;
use wayfare_catalog::rating::validate_rating;
use wayfare_core::activity::{Activity, ActivityQuery, Review};
use wayfare_core::{ActivityId, CoreError, ReviewId};

use crate::extract::{Json, Path, Query};
use crate::{error::AppError, middleware::Claims, state::AppState};

#[derive(Debug, Deserialize)]
struct ReviewRequest {
    rating: Option<u8>,
    #[serde(default)]
    comment: String,
}

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/activities", get(list_activities))
        .route("/api/activities/{id}", get(get_activity))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/activities/{id}/reviews", post(add_review))
}

/// GET /api/activities?destination&category
async fn list_activities(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<Activity>>, AppError> {
    Ok(Json(state.repos.activities.list_activities(&query).await?))
}

/// GET /api/activities/:id
async fn get_activity(
    State(state): State<AppState>,
    Path(id): Path<ActivityId>,
) -> Result<Json<Activity>, AppError> {
    let activity = state
        .repos
        .activities
        .get_activity(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Activity not found"))?;
    Ok(Json(activity))
}

/// POST /api/activities/:id/reviews
/// Returns the activity with its recomputed rating
async fn add_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<ActivityId>,
    Json(req): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<Activity>), AppError> {
    validate_rating(req.rating).map_err(CoreError::from)?;
    let comment = req.comment.trim();
    if req.rating.is_none() && comment.is_empty() {
        return Err(CoreError::validation("a rating or a comment is required").into());
    }

    let author = state
        .repos
        .users
        .get_user(claims.user_id())
        .await?
        .ok_or_else(|| CoreError::not_found("User not found"))?;

    let review = Review {
        id: ReviewId::new(),
        user_id: author.id,
        author_name: author.name,
        rating: req.rating,
        comment: comment.to_string(),
        created_at: Utc::now(),
    };
    let activity = state
        .repos
        .activities
        .add_review(id, &review)
        .await?
        .ok_or_else(|| CoreError::not_found("Activity not found"))?;

    tracing::info!(
        "Review {} added to activity {} (rating now {:.2} over {} ratings)",
        review.id,
        activity.id,
        activity.rating,
        activity.review_count
    );
    Ok((StatusCode::CREATED, Json(activity)))
}
