use axum::{
    extract::State,
    routing::{get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use wayfare_core::assistant::ChatTurn;
use wayfare_insights::SuggestionSet;

use crate::extract::Json;
use crate::{error::AppError, middleware::Claims, state::AppState, user_activity::profile_for};

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
struct ChatReply {
    reply: String,
}

#[derive(Debug, Deserialize)]
struct VisaRequest {
    nationality: String,
    destination: String,
}

#[derive(Debug, Deserialize)]
struct NewsRequest {
    destination: String,
}

#[derive(Debug, Serialize)]
struct Analysis {
    analysis: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/suggestions", get(suggestions))
        .route("/api/suggestions/visa", post(visa_analysis))
        .route("/api/suggestions/news", post(news_analysis))
}

/// POST /api/chat
async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let reply = state.advisor.chat(&req.message, req.history).await?;
    Ok(Json(ChatReply { reply }))
}

/// GET /api/suggestions
/// Built from the caller's preference profile
async fn suggestions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<SuggestionSet>, AppError> {
    let profile = profile_for(&state, &claims).await?;
    Ok(Json(state.advisor.suggestions(&profile).await?))
}

/// POST /api/suggestions/visa
async fn visa_analysis(
    State(state): State<AppState>,
    Json(req): Json<VisaRequest>,
) -> Result<Json<Analysis>, AppError> {
    let analysis = state
        .advisor
        .visa_analysis(&req.nationality, &req.destination)
        .await?;
    Ok(Json(Analysis { analysis }))
}

/// POST /api/suggestions/news
async fn news_analysis(
    State(state): State<AppState>,
    Json(req): Json<NewsRequest>,
) -> Result<Json<Analysis>, AppError> {
    Ok(Json(Analysis {
        analysis: state.advisor.news_analysis(&req.destination).await?,
    }))
}
