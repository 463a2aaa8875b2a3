//! Shared API plumbing
//!
//! Contains:
//! - `AppState`, the services shared by every handler
//! - `ApiError`, the JSON error body and its status mapping
//! - Conversions from service errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cache::create_cache;
use crate::config::Config;
use crate::db::repositories::{
    SqlxPageViewRepository, SqlxPostRepository, SqlxQuizRepository, SqlxSettingsRepository,
};
use crate::db::DynDatabasePool;
use crate::services::{
    ChatService, PageViewService, PageViewServiceError, PostService, PostServiceError,
    QuizService, QuizServiceError, SettingsServiceError, SettingsStore,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub post_service: Arc<PostService>,
    pub quiz_service: Arc<QuizService>,
    pub chat_service: Arc<ChatService>,
    pub pageview_service: Arc<PageViewService>,
    pub settings: Arc<SettingsStore>,
}

impl AppState {
    /// Wire repositories, cache and services over a migrated pool
    pub async fn build(pool: DynDatabasePool, config: &Config) -> anyhow::Result<Self> {
        let cache = create_cache(&config.cache);

        let post_repo = SqlxPostRepository::boxed(pool.clone());
        let quiz_repo = SqlxQuizRepository::boxed(pool.clone());
        let pageview_repo = SqlxPageViewRepository::boxed(pool.clone());
        let settings_repo = SqlxSettingsRepository::boxed(pool.clone());

        let chat_service = Arc::new(ChatService::new(post_repo.clone(), cache));
        let post_service = Arc::new(PostService::new(post_repo, chat_service.clone()));
        let quiz_service = Arc::new(QuizService::new(quiz_repo, config.quiz.clone()));
        let pageview_service = Arc::new(PageViewService::new(pageview_repo));
        let settings = Arc::new(SettingsStore::load(settings_repo).await?);

        Ok(Self {
            pool,
            post_service,
            quiz_service,
            chat_service,
            pageview_service,
            settings,
        })
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn gone(message: impl Into<String>) -> Self {
        Self::new("GONE", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "GONE" => StatusCode::GONE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Log the cause, keep it out of the response body
fn internal(e: anyhow::Error) -> ApiError {
    tracing::error!("Request failed: {:#}", e);
    ApiError::internal_error("Internal server error")
}

impl From<PostServiceError> for ApiError {
    fn from(e: PostServiceError) -> Self {
        match e {
            PostServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            PostServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            PostServiceError::WrongPassword => ApiError::forbidden(e.to_string()),
            PostServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<QuizServiceError> for ApiError {
    fn from(e: QuizServiceError) -> Self {
        match e {
            QuizServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            QuizServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            QuizServiceError::Expired(_) => ApiError::gone(e.to_string()),
            QuizServiceError::WrongPassword => ApiError::forbidden(e.to_string()),
            QuizServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<PageViewServiceError> for ApiError {
    fn from(e: PageViewServiceError) -> Self {
        match e {
            PageViewServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            PageViewServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<SettingsServiceError> for ApiError {
    fn from(e: SettingsServiceError) -> Self {
        match e {
            SettingsServiceError::InvalidValue(msg) => ApiError::validation_error(msg),
            SettingsServiceError::InternalError(e) => internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::validation_error("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::gone("x").status(), StatusCode::GONE);
        assert_eq!(
            ApiError::new("SOMETHING_ELSE", "x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_service_errors_map_to_codes() {
        let e: ApiError = QuizServiceError::Expired(3).into();
        assert_eq!(e.error.code, "GONE");

        let e: ApiError = PostServiceError::WrongPassword.into();
        assert_eq!(e.error.code, "FORBIDDEN");

        let e: ApiError = PostServiceError::NotFound(9).into();
        assert_eq!(e.error.code, "NOT_FOUND");
        assert_eq!(e.error.message, "Post not found: 9");

        let e: ApiError = SettingsServiceError::InternalError(anyhow::anyhow!("disk full")).into();
        assert_eq!(e.error.code, "INTERNAL_ERROR");
        assert!(!e.error.message.contains("disk full"));
    }
}
