use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Router,
};
use wayfare_booking::NewBooking;
use wayfare_core::booking::Booking;
use wayfare_core::BookingId;

use crate::extract::{Json, Path};
use crate::{error::AppError, middleware::Claims, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", post(create_booking).get(list_bookings))
        .route("/api/bookings/{id}", get(get_booking))
        .route("/api/bookings/{id}/cancel", post(cancel_booking))
}

/// POST /api/bookings
async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<NewBooking>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state.bookings.create_booking(claims.user_id(), req).await?;
    state.metrics.bookings_created.inc();
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /api/bookings
async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.bookings.list_bookings(claims.user_id()).await?))
}

/// GET /api/bookings/:id
async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<BookingId>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.bookings.get_booking(claims.user_id(), id).await?))
}

/// POST /api/bookings/:id/cancel
async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<BookingId>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.bookings.cancel_booking(claims.user_id(), id).await?;
    state.metrics.bookings_cancelled.inc();
    Ok(Json(booking))
}
