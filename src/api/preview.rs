//! Live preview endpoint
//!
//! - POST /api/v1/preview - Render authoring markdown with the preview ruleset

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

use crate::api::middleware::AppState;
use crate::api::responses::HtmlResponse;
use crate::services::{MarkdownRenderer, Ruleset};

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub content: String,
}

/// Build the preview router
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(preview))
}

async fn preview(
    State(state): State<AppState>,
    Json(body): Json<PreviewRequest>,
) -> Json<HtmlResponse> {
    let renderer = MarkdownRenderer::with_options(state.settings.render_options(Ruleset::Preview));
    Json(HtmlResponse {
        html: renderer.render(&body.content),
    })
}
