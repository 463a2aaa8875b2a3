//! Shared API response types

use serde::Serialize;

use crate::models::{PostView, QuizForTaker};

/// Rendered HTML fragment
#[derive(Debug, Serialize)]
pub struct HtmlResponse {
    pub html: String,
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<PostView>,
    pub total: usize,
}

impl From<Vec<PostView>> for PostListResponse {
    fn from(posts: Vec<PostView>) -> Self {
        Self {
            total: posts.len(),
            posts,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuizListResponse {
    pub quizzes: Vec<QuizForTaker>,
    pub total: usize,
}

impl From<Vec<QuizForTaker>> for QuizListResponse {
    fn from(quizzes: Vec<QuizForTaker>) -> Self {
        Self {
            total: quizzes.len(),
            quizzes,
        }
    }
}

/// Acknowledgement for deletes
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
