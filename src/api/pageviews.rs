//! Pageview endpoints
//!
//! - POST /api/v1/pageviews - Record a view
//! - GET /api/v1/pageviews?path= - View count for a path

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::{PageView, RecordPageViewInput};

#[derive(Debug, Deserialize)]
pub struct CountQuery {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub path: String,
    pub views: i64,
}

/// Build the pageviews router
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(count_views).post(record_view))
}

async fn record_view(
    State(state): State<AppState>,
    Json(input): Json<RecordPageViewInput>,
) -> Result<(StatusCode, Json<PageView>), ApiError> {
    let view = state.pageview_service.record(input).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn count_views(
    State(state): State<AppState>,
    Query(query): Query<CountQuery>,
) -> Result<Json<CountResponse>, ApiError> {
    let views = state.pageview_service.count(&query.path).await?;
    Ok(Json(CountResponse {
        path: query.path.trim().to_string(),
        views,
    }))
}
