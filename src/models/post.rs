//! Blog post model
//!
//! This module provides:
//! - `BlogPost` entity for a published lesson
//! - Input types for creating and updating posts
//! - Display helpers for the derived `date` and `read_time` fields

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reading speed used for the `read_time` display string
pub const WORDS_PER_MINUTE: usize = 200;

/// Blog post entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    /// Unique identifier
    pub id: i64,
    /// Post title
    pub title: String,
    /// Content in the markdown subset
    pub content: String,
    /// Display date, e.g. "March 4, 2025"
    pub date: String,
    /// Display read time, e.g. "3 min read"
    pub read_time: String,
    /// Optional cover image
    #[serde(default)]
    pub image_url: Option<String>,
    /// Optional plaintext gate. Never serialized.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Optional subject tag
    #[serde(default)]
    pub subject: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    /// Create a new post; `date` and `read_time` are derived here.
    pub fn new(title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by database
            date: display_date(&now),
            read_time: read_time(&content),
            title,
            content,
            image_url: None,
            password: None,
            subject: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether reading this post requires a password
    pub fn is_protected(&self) -> bool {
        self.password.as_deref().map_or(false, |p| !p.is_empty())
    }

    /// Check a password attempt against the gate
    pub fn password_matches(&self, attempt: &str) -> bool {
        match self.password.as_deref() {
            Some(p) if !p.is_empty() => p == attempt,
            _ => true,
        }
    }

    /// Recompute derived display fields after the content changed
    pub fn refresh_read_time(&mut self) {
        self.read_time = read_time(&self.content);
    }
}

/// Format a timestamp the way post cards display it
pub fn display_date(at: &DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}

/// Estimated reading time, rounded up, never below one minute
pub fn read_time(content: &str) -> String {
    let words = content.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    format!("{} min read", minutes)
}

/// Input for creating a new post
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
}

impl CreatePostInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            image_url: None,
            password: None,
            subject: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

/// Input for updating a post. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub password: Option<String>,
    pub subject: Option<String>,
}

/// Post as shown to readers: content withheld while locked.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(flatten)]
    pub post: BlogPost,
    pub locked: bool,
}

impl PostView {
    /// Redact content of a protected post
    pub fn public(mut post: BlogPost) -> Self {
        let locked = post.is_protected();
        if locked {
            post.content = String::new();
        }
        Self { post, locked }
    }

    /// Full view after a successful unlock
    pub fn unlocked(post: BlogPost) -> Self {
        Self { post, locked: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_read_time_minimum_one_minute() {
        assert_eq!(read_time(""), "1 min read");
        assert_eq!(read_time("just a few words"), "1 min read");
    }

    #[test]
    fn test_read_time_rounds_up() {
        let content = "word ".repeat(201);
        assert_eq!(read_time(&content), "2 min read");
    }

    #[test]
    fn test_display_date() {
        let at = Utc.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap();
        assert_eq!(display_date(&at), "March 4, 2025");
    }

    #[test]
    fn test_password_gate() {
        let mut post = BlogPost::new("T".into(), "body".into());
        assert!(!post.is_protected());
        assert!(post.password_matches("anything"));

        post.password = Some("secret".into());
        assert!(post.is_protected());
        assert!(post.password_matches("secret"));
        assert!(!post.password_matches("guess"));
    }

    #[test]
    fn test_empty_password_is_not_a_gate() {
        let mut post = BlogPost::new("T".into(), "body".into());
        post.password = Some(String::new());
        assert!(!post.is_protected());
    }

    #[test]
    fn test_public_view_redacts_locked_content() {
        let mut post = BlogPost::new("T".into(), "secret body".into());
        post.password = Some("pw".into());

        let view = PostView::public(post);
        assert!(view.locked);
        assert!(view.post.content.is_empty());

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["locked"], true);
        assert_eq!(json["title"], "T");
    }
}
