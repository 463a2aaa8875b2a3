//! Quiz API endpoints
//!
//! - GET /api/v1/quizzes - List quizzes (`?active=true` for unexpired only)
//! - POST /api/v1/quizzes - Create a quiz
//! - GET /api/v1/quizzes/{id} - Quiz with answers hidden
//! - DELETE /api/v1/quizzes/{id} - Delete
//! - POST /api/v1/quizzes/{id}/submit - Grade an attempt
//! - GET /api/v1/quizzes/{id}/paper - Printable question paper (`?answers=true` for the key)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{QuizListResponse, SuccessResponse};
use crate::models::{CreateQuizInput, QuizForTaker, QuizResult, QuizSubmission};

#[derive(Debug, Deserialize)]
pub struct ListQuizzesQuery {
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct PaperQuery {
    #[serde(default)]
    pub answers: bool,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedQuizResponse {
    pub id: i64,
    pub quiz: QuizForTaker,
}

/// Build the quizzes router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_quizzes).post(create_quiz))
        .route("/{id}", get(get_quiz).delete(delete_quiz))
        .route("/{id}/submit", post(submit_quiz))
        .route("/{id}/paper", get(question_paper))
}

async fn list_quizzes(
    State(state): State<AppState>,
    Query(query): Query<ListQuizzesQuery>,
) -> Result<Json<QuizListResponse>, ApiError> {
    let quizzes = state.quiz_service.list(query.active).await?;
    Ok(Json(quizzes.into()))
}

async fn create_quiz(
    State(state): State<AppState>,
    Json(input): Json<CreateQuizInput>,
) -> Result<(StatusCode, Json<CreatedQuizResponse>), ApiError> {
    let quiz = state.quiz_service.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedQuizResponse {
            id: quiz.id,
            quiz: quiz.without_answers(),
        }),
    ))
}

async fn get_quiz(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<QuizForTaker>, ApiError> {
    Ok(Json(state.quiz_service.get(id).await?))
}

async fn delete_quiz(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.quiz_service.delete(id).await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn submit_quiz(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(submission): Json<QuizSubmission>,
) -> Result<Json<QuizResult>, ApiError> {
    Ok(Json(state.quiz_service.submit(id, submission).await?))
}

async fn question_paper(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<PaperQuery>,
) -> Result<Html<String>, ApiError> {
    let paper = state
        .quiz_service
        .question_paper(id, query.answers, query.password.as_deref())
        .await?;
    Ok(Html(paper.html))
}
