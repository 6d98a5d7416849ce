use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use wayfare_booking::PaymentIntentCreated;
use wayfare_core::payment::{Payment, PaymentMethod};
use wayfare_core::{BookingId, PaymentId, PaymentMethodId};

use crate::extract::{Json, Path};
use crate::{error::AppError, middleware::Claims, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateIntentRequest {
    booking_id: BookingId,
    payment_method_id: PaymentMethodId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddMethodRequest {
    /// Processor-side id of a card tokenized by the client.
    payment_method_id: String,
}

/// The subset of a processor event the webhook reads.
#[derive(Debug, Deserialize)]
struct ProcessorEvent {
    #[serde(rename = "type")]
    type_: String,
    data: ProcessorEventData,
}

#[derive(Debug, Deserialize)]
struct ProcessorEventData {
    object: IntentObject,
}

#[derive(Debug, Deserialize)]
struct IntentObject {
    id: String,
}

#[derive(Debug, Serialize)]
struct WebhookAck {
    received: bool,
}

const HANDLED_EVENTS: [&str; 3] = [
    "payment_intent.succeeded",
    "payment_intent.payment_failed",
    "payment_intent.canceled",
];

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/api/payments/webhook", post(handle_webhook))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/payments", get(list_payments))
        .route("/api/payments/intent", post(create_intent))
        .route("/api/payments/{id}/refund", post(refund))
        .route("/api/payments/methods", post(add_method).get(list_methods))
        .route("/api/payments/methods/{id}", delete(remove_method))
        .route("/api/payments/methods/{id}/default", post(set_default_method))
}

/// POST /api/payments/intent
async fn create_intent(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateIntentRequest>,
) -> Result<Json<PaymentIntentCreated>, AppError> {
    let created = state
        .payments
        .create_payment_intent(claims.user_id(), req.booking_id, req.payment_method_id)
        .await?;
    state.metrics.payment_intents.inc();
    Ok(Json(created))
}

/// POST /api/payments/:id/refund
async fn refund(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<PaymentId>,
) -> Result<Json<Payment>, AppError> {
    let payment = state.payments.refund(claims.user_id(), id).await?;
    state.metrics.refunds.inc();
    Ok(Json(payment))
}

/// GET /api/payments
async fn list_payments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Payment>>, AppError> {
    Ok(Json(state.payments.list_payments(claims.user_id()).await?))
}

/// POST /api/payments/webhook
/// Receive payment status updates from the processor
async fn handle_webhook(
    State(state): State<AppState>,
    Json(event): Json<ProcessorEvent>,
) -> Result<Json<WebhookAck>, AppError> {
    let intent_id = &event.data.object.id;
    tracing::info!("Received webhook: {} for intent {}", event.type_, intent_id);

    if HANDLED_EVENTS.contains(&event.type_.as_str()) {
        state.payments.process_status_update(intent_id).await?;
    }

    Ok(Json(WebhookAck { received: true }))
}

// ============================================================================
// Payment methods
// ============================================================================

/// POST /api/payments/methods
async fn add_method(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddMethodRequest>,
) -> Result<(StatusCode, Json<PaymentMethod>), AppError> {
    let method = state
        .payment_methods
        .add_method(claims.user_id(), &req.payment_method_id)
        .await?;
    Ok((StatusCode::CREATED, Json(method)))
}

/// GET /api/payments/methods
async fn list_methods(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<PaymentMethod>>, AppError> {
    Ok(Json(state.payment_methods.list_methods(claims.user_id()).await?))
}

/// DELETE /api/payments/methods/:id
async fn remove_method(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<PaymentMethodId>,
) -> Result<StatusCode, AppError> {
    state.payment_methods.remove_method(claims.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/payments/methods/:id/default
async fn set_default_method(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<PaymentMethodId>,
) -> Result<Json<Vec<PaymentMethod>>, AppError> {
    Ok(Json(state.payment_methods.set_default(claims.user_id(), id).await?))
}
