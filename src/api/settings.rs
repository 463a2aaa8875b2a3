//! Settings endpoints
//!
//! - GET /api/v1/settings - Current snapshot
//! - PUT /api/v1/settings - Apply a partial update

use axum::{extract::State, routing::get, Json, Router};

use crate::api::middleware::{ApiError, AppState};
use crate::services::{Settings, SettingsPatch};

/// Build the settings router
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_settings).put(update_settings))
}

async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json((*state.settings.current()).clone())
}

async fn update_settings(
    State(state): State<AppState>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<Settings>, ApiError> {
    let updated = state.settings.update(patch).await?;
    Ok(Json((*updated).clone()))
}
