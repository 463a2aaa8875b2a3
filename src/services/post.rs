//! Post service
//!
//! Business logic for lessons:
//! - CRUD with entry-time validation
//! - Derived read time on every write
//! - Password gate with redacted reads
//! - Chat corpus invalidation on change

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::db::repositories::PostRepository;
use crate::models::{BlogPost, CreatePostInput, PostView, UpdatePostInput};
use crate::services::chat::ChatService;

/// Post service errors
#[derive(Debug, Error)]
pub enum PostServiceError {
    #[error("Post not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Incorrect password")]
    WrongPassword,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct PostService {
    repo: Arc<dyn PostRepository>,
    chat: Arc<ChatService>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>, chat: Arc<ChatService>) -> Self {
        Self { repo, chat }
    }

    pub async fn create(&self, input: CreatePostInput) -> Result<PostView, PostServiceError> {
        validate_title(&input.title)?;

        let mut post = BlogPost::new(input.title.trim().to_string(), input.content);
        post.image_url = non_empty(input.image_url);
        post.password = non_empty(input.password);
        post.subject = non_empty(input.subject);

        let created = self.repo.create(&post).await?;
        self.chat.invalidate().await;

        tracing::info!("Created post {} ({})", created.id, created.title);
        Ok(PostView::unlocked(created))
    }

    /// Protected posts come back locked and redacted
    pub async fn get(&self, id: i64) -> Result<PostView, PostServiceError> {
        let post = self.find(id).await?;
        Ok(PostView::public(post))
    }

    pub async fn list(&self, subject: Option<&str>) -> Result<Vec<PostView>, PostServiceError> {
        let subject = subject.map(str::trim).filter(|s| !s.is_empty());
        let posts = self.repo.list(subject).await?;
        Ok(posts.into_iter().map(PostView::public).collect())
    }

    /// Apply the fields present in `input`. An empty string clears an
    /// optional field.
    pub async fn update(
        &self,
        id: i64,
        input: UpdatePostInput,
    ) -> Result<PostView, PostServiceError> {
        let mut post = self.find(id).await?;

        if let Some(title) = input.title {
            validate_title(&title)?;
            post.title = title.trim().to_string();
        }
        if let Some(content) = input.content {
            post.content = content;
            post.refresh_read_time();
        }
        if let Some(image_url) = input.image_url {
            post.image_url = non_empty(Some(image_url));
        }
        if let Some(password) = input.password {
            post.password = non_empty(Some(password));
        }
        if let Some(subject) = input.subject {
            post.subject = non_empty(Some(subject));
        }
        post.updated_at = Utc::now();

        let updated = self.repo.update(&post).await?;
        self.chat.invalidate().await;

        tracing::info!("Updated post {}", id);
        Ok(PostView::public(updated))
    }

    pub async fn delete(&self, id: i64) -> Result<(), PostServiceError> {
        if !self.repo.delete(id).await? {
            return Err(PostServiceError::NotFound(id));
        }
        self.chat.invalidate().await;

        tracing::info!("Deleted post {}", id);
        Ok(())
    }

    /// Full post when `password` opens the gate
    pub async fn unlock(&self, id: i64, password: &str) -> Result<PostView, PostServiceError> {
        let post = self.find(id).await?;
        if !post.password_matches(password) {
            tracing::debug!("Rejected unlock attempt for post {}", id);
            return Err(PostServiceError::WrongPassword);
        }
        Ok(PostView::unlocked(post))
    }

    async fn find(&self, id: i64) -> Result<BlogPost, PostServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(PostServiceError::NotFound(id))
    }
}

fn validate_title(title: &str) -> Result<(), PostServiceError> {
    if title.trim().is_empty() {
        return Err(PostServiceError::ValidationError(
            "Title cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
