//! Data models
//!
//! This module contains the data structures used throughout Learning Lab:
//! - Stored entities (BlogPost, Quiz, PageView)
//! - API request/response types
//! - Internal data transfer objects

mod pageview;
mod post;
mod quiz;

pub use pageview::{PageView, RecordPageViewInput};
pub use post::{display_date, read_time, BlogPost, CreatePostInput, PostView, UpdatePostInput};
pub use quiz::{
    Answer, CreateQuizInput, Difficulty, QuestionFeedback, QuestionForTaker, QuestionInput,
    QuestionType, Quiz, QuizForTaker, QuizQuestion, QuizResult, QuizSubmission, SubmittedAnswer,
};
