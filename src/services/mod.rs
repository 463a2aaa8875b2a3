//! Services layer - Business logic
//!
//! The text transforms (`markdown`, `chat`, `suggest`) are pure functions
//! over strings. The remaining services coordinate repositories, the cache
//! and validation.

pub mod chat;
pub mod markdown;
pub mod pageview;
pub mod post;
pub mod quiz;
pub mod settings;
pub mod suggest;

pub use chat::{answer, ChatReply, ChatService, CorpusEntry, ERROR_ANSWER, FALLBACK_ANSWER};
pub use markdown::{render, MarkdownRenderer, RenderOptions, Ruleset};
pub use pageview::{PageViewService, PageViewServiceError};
pub use post::{PostService, PostServiceError};
pub use quiz::{QuestionPaper, QuizService, QuizServiceError};
pub use settings::{Settings, SettingsPatch, SettingsServiceError, SettingsStore, Theme};
pub use suggest::{suggest, KeywordIndex};
