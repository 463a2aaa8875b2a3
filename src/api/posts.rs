//! Post API endpoints
//!
//! - GET /api/v1/posts - List posts (`?subject=`)
//! - POST /api/v1/posts - Create a post
//! - GET /api/v1/posts/{id} - Get a post, redacted while locked
//! - PUT /api/v1/posts/{id} - Partial update
//! - DELETE /api/v1/posts/{id} - Delete
//! - POST /api/v1/posts/{id}/unlock - Open a protected post

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{PostListResponse, SuccessResponse};
use crate::models::{CreatePostInput, PostView, UpdatePostInput};

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub subject: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UnlockRequest {
    pub password: String,
}

/// Build the posts router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/{id}", get(get_post).put(update_post).delete(delete_post))
        .route("/{id}/unlock", post(unlock_post))
}

async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<PostListResponse>, ApiError> {
    let posts = state.post_service.list(query.subject.as_deref()).await?;
    Ok(Json(posts.into()))
}

async fn create_post(
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> Result<(StatusCode, Json<PostView>), ApiError> {
    let view = state.post_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostView>, ApiError> {
    Ok(Json(state.post_service.get(id).await?))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdatePostInput>,
) -> Result<Json<PostView>, ApiError> {
    Ok(Json(state.post_service.update(id, input).await?))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.post_service.delete(id).await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn unlock_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UnlockRequest>,
) -> Result<Json<PostView>, ApiError> {
    Ok(Json(state.post_service.unlock(id, &body.password).await?))
}
