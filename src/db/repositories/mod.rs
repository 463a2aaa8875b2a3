//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles storage for a single entity.

pub mod pageview;
pub mod post;
pub mod quiz;
pub mod settings;

pub use pageview::{PageViewRepository, SqlxPageViewRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use quiz::{QuizRepository, SqlxQuizRepository};
pub use settings::{Setting, SettingsRepository, SqlxSettingsRepository};
