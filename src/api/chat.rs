//! Chat API endpoints
//!
//! - POST /api/v1/chat/ask - Answer a question from the lessons
//! - GET /api/v1/chat/suggest - Autocomplete the question being typed

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::services::ChatReply;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub suggestions: Vec<String>,
}

/// Build the chat router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ask", post(ask))
        .route("/suggest", get(suggest))
}

fn ensure_enabled(state: &AppState) -> Result<(), ApiError> {
    if state.settings.current().chat_enabled {
        Ok(())
    } else {
        Err(ApiError::forbidden("Chat is disabled"))
    }
}

async fn ask(
    State(state): State<AppState>,
    Json(body): Json<AskRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    ensure_enabled(&state)?;
    Ok(Json(state.chat_service.ask(&body.question).await))
}

async fn suggest(
    State(state): State<AppState>,
    Query(query): Query<SuggestQuery>,
) -> Result<Json<SuggestResponse>, ApiError> {
    ensure_enabled(&state)?;
    let suggestions = state.chat_service.suggest(&query.q).await;
    Ok(Json(SuggestResponse { suggestions }))
}
