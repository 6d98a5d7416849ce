use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use wayfare_core::CoreError;

#[derive(Debug)]
pub enum AppError {
    Core(CoreError),
    Forbidden(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Core(CoreError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg),
            AppError::Core(err @ (CoreError::InvalidState(_) | CoreError::Validation(_))) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            AppError::Core(CoreError::Unauthorized(msg)) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Core(err @ (CoreError::ExternalService(_) | CoreError::Storage(_))) => {
                tracing::error!("Internal Server Error: {}", err);
                internal()
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                internal()
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

fn internal() -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        let err = match err.downcast::<CoreError>() {
            Ok(core) => return Self::Core(core),
            Err(other) => other,
        };
        match rejection_text(&err) {
            Some(text) => Self::Core(CoreError::validation(text)),
            None => Self::Anyhow(err),
        }
    }
}

/// Extractor rejections are client errors.
fn rejection_text(err: &anyhow::Error) -> Option<String> {
    if let Some(rejection) = err.downcast_ref::<JsonRejection>() {
        return Some(rejection.body_text());
    }
    if let Some(rejection) = err.downcast_ref::<PathRejection>() {
        return Some(rejection.body_text());
    }
    err.downcast_ref::<QueryRejection>()
        .map(|rejection| rejection.body_text())
}
