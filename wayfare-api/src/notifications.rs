use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{delete, get, post},
    Extension, Router,
};
use futures_util::stream::Stream;
use serde::Serialize;
use std::convert::Infallible;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use wayfare_core::notification::Notification;
use wayfare_core::{CoreError, NotificationId};

use crate::extract::{Json, Path};
use crate::{error::AppError, middleware::Claims, state::AppState};

#[derive(Debug, Serialize)]
struct NotificationList {
    notifications: Vec<Notification>,
    unread: u64,
}

#[derive(Debug, Serialize)]
struct MarkedRead {
    updated: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/stream", get(stream_notifications))
        .route("/api/notifications/read-all", post(mark_all_read))
        .route("/api/notifications/{id}", delete(delete_notification))
        .route("/api/notifications/{id}/read", post(mark_read))
}

/// GET /api/notifications
async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<NotificationList>, AppError> {
    let user = claims.user_id();
    let notifications = state.repos.notifications.list_user_notifications(user).await?;
    let unread = state.repos.notifications.unread_count(user).await?;
    Ok(Json(NotificationList {
        notifications,
        unread,
    }))
}

/// POST /api/notifications/:id/read
async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<NotificationId>,
) -> Result<StatusCode, AppError> {
    if !state.repos.notifications.mark_read(id, claims.user_id()).await? {
        return Err(CoreError::not_found("Notification not found").into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/notifications/read-all
async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MarkedRead>, AppError> {
    let updated = state.repos.notifications.mark_all_read(claims.user_id()).await?;
    Ok(Json(MarkedRead { updated }))
}

/// DELETE /api/notifications/:id
async fn delete_notification(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<NotificationId>,
) -> Result<StatusCode, AppError> {
    if !state
        .repos
        .notifications
        .delete_notification(id, claims.user_id())
        .await?
    {
        return Err(CoreError::not_found("Notification not found").into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/notifications/stream
/// Server-sent events carrying the caller's new notifications
async fn stream_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let user_id = claims.user_id().as_uuid();
    let stream = BroadcastStream::new(state.notifier.subscribe()).filter_map(move |result| {
        match result {
            Ok(pushed) if pushed.user_id == user_id => Event::default()
                .event("notification")
                .json_data(&pushed)
                .ok()
                .map(Ok),
            // Lagged receivers skip what they missed; the list endpoint has it.
            _ => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
