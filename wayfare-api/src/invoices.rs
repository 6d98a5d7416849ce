use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;
use wayfare_core::invoice::Invoice;
use wayfare_core::{InvoiceId, PaymentId};

use crate::extract::{Json, Path};
use crate::{error::AppError, middleware::Claims, state::AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateInvoiceRequest {
    payment_id: PaymentId,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/invoices", post(create_invoice).get(list_invoices))
        .route("/api/invoices/{id}", get(get_invoice))
        .route("/api/invoices/{id}/issue", post(issue_invoice))
        .route("/api/invoices/{id}/pay", post(pay_invoice))
        .route("/api/invoices/{id}/void", post(void_invoice))
}

/// POST /api/invoices
async fn create_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<Invoice>), AppError> {
    let invoice = state
        .invoices
        .create_invoice(claims.user_id(), req.payment_id)
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

async fn list_invoices(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    Ok(Json(state.invoices.list_invoices(claims.user_id()).await?))
}

async fn get_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<InvoiceId>,
) -> Result<Json<Invoice>, AppError> {
    Ok(Json(state.invoices.get_invoice(claims.user_id(), id).await?))
}

async fn issue_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<InvoiceId>,
) -> Result<Json<Invoice>, AppError> {
    Ok(Json(state.invoices.issue(claims.user_id(), id).await?))
}

async fn pay_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<InvoiceId>,
) -> Result<Json<Invoice>, AppError> {
    Ok(Json(state.invoices.mark_paid(claims.user_id(), id).await?))
}

async fn void_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<InvoiceId>,
) -> Result<Json<Invoice>, AppError> {
    Ok(Json(state.invoices.void(claims.user_id(), id).await?))
}
