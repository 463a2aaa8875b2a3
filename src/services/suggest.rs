//! Chat input autocomplete
//!
//! Completes the word being typed from the vocabulary of the lessons.

use std::collections::HashSet;

use crate::services::chat::CorpusEntry;

/// Words too common to be worth suggesting
pub const STOPWORDS: &[&str] = &["and", "the", "this", "that", "with"];

pub const MAX_SUGGESTIONS: usize = 3;

/// Keywords are longer than this many characters.
pub const MIN_KEYWORD_LEN: usize = 3;

/// Deduplicated keyword vocabulary, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    keywords: Vec<String>,
}

impl KeywordIndex {
    /// Titles come before bodies for each post, posts in corpus order.
    pub fn build(corpus: &[CorpusEntry]) -> Self {
        let mut seen = HashSet::new();
        let mut keywords = Vec::new();

        let texts = corpus
            .iter()
            .flat_map(|entry| [entry.title.as_str(), entry.content.as_str()]);

        for text in texts {
            let lowered = text.to_lowercase();
            for word in lowered.split(|c: char| !c.is_alphanumeric()) {
                if word.chars().count() > MIN_KEYWORD_LEN
                    && !STOPWORDS.contains(&word)
                    && seen.insert(word.to_string())
                {
                    keywords.push(word.to_string());
                }
            }
        }

        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Up to [`MAX_SUGGESTIONS`] completions for the last word of `partial`.
    /// Words are split on non-alphanumerics, as keywords are. Nothing is
    /// suggested once the user has typed a trailing space or punctuation.
    pub fn suggest(&self, partial: &str) -> Vec<String> {
        if partial.is_empty() || partial.ends_with(char::is_whitespace) {
            return Vec::new();
        }

        let current = match partial.split(|c: char| !c.is_alphanumeric()).last() {
            Some(word) if !word.is_empty() => word.to_lowercase(),
            _ => return Vec::new(),
        };

        self.keywords
            .iter()
            .filter(|keyword| keyword.starts_with(&current) && **keyword != current)
            .take(MAX_SUGGESTIONS)
            .cloned()
            .collect()
    }
}

/// One-shot form of [`KeywordIndex::suggest`]
pub fn suggest(partial: &str, corpus: &[CorpusEntry]) -> Vec<String> {
    KeywordIndex::build(corpus).suggest(partial)
}
