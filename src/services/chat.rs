//! Lesson chatbot
//!
//! Answers questions by lexical overlap against the stored lessons: no
//! embeddings, no ranking model. The question is tokenized, every sentence
//! of the corpus is scored by how many question tokens it contains as
//! plain substrings, and the best sentence is expanded back to the
//! paragraph it came from in the original post.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cache::MemoryCache;
use crate::db::repositories::PostRepository;
use crate::services::markdown::MarkdownRenderer;
use crate::services::suggest::KeywordIndex;

/// Returned when no sentence shares a token with the question.
pub const FALLBACK_ANSWER: &str =
    "I couldn't find an answer to that in the lessons yet. Try rephrasing your question.";

/// Returned when the lessons could not be searched at all.
pub const ERROR_ANSWER: &str =
    "Sorry, something went wrong while searching the lessons. Please try again.";

/// Question tokens shorter than this are ignored.
pub const MIN_TOKEN_LEN: usize = 4;

/// Corpus sentences shorter than this are ignored.
pub const MIN_SENTENCE_LEN: usize = 10;

const CORPUS_CACHE_KEY: &str = "chat:corpus";

/// One searchable lesson
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub title: String,
    pub content: String,
}

impl CorpusEntry {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Extraction result with the pieces the API reports separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Answer body, without attribution
    pub text: String,
    /// Title of the post the best sentence came from
    pub source: Option<String>,
    /// Overlap score of the best sentence
    pub score: usize,
}

impl Extraction {
    /// Answer text with the attribution suffix
    pub fn into_answer(self) -> String {
        match self.source {
            Some(title) => format!("{}\n\n(Source: {})", self.text, title),
            None => self.text,
        }
    }
}

/// Answer `question` from `corpus`. Never fails: unanswerable questions get
/// [`FALLBACK_ANSWER`].
pub fn answer(question: &str, corpus: &[CorpusEntry]) -> String {
    match extract(question, corpus) {
        Some(extraction) => extraction.into_answer(),
        None => FALLBACK_ANSWER.to_string(),
    }
}

/// Best-scoring passage for `question`, or `None` when nothing overlaps.
pub fn extract(question: &str, corpus: &[CorpusEntry]) -> Option<Extraction> {
    let tokens = question_tokens(question);
    if tokens.is_empty() {
        return None;
    }

    let combined = corpus
        .iter()
        .map(|entry| entry.content.to_lowercase())
        .collect::<Vec<_>>()
        .join("\n");

    let mut ranked: Vec<(usize, &str)> = split_sentences(&combined)
        .into_iter()
        .map(|sentence| (score(sentence, &tokens), sentence))
        .collect();

    // Stable: ties keep corpus order.
    ranked.sort_by(|a, b| b.0.cmp(&a.0));

    let (top_score, top_sentence) = *ranked.first()?;
    if top_score == 0 {
        return None;
    }

    let source = corpus
        .iter()
        .find(|entry| entry.content.to_lowercase().contains(top_sentence));

    let recovered = source.and_then(|entry| recover_passage(&entry.content, top_sentence));

    let text = match recovered {
        Some(passage) => passage.to_string(),
        None => {
            tracing::debug!("Passage recovery failed, answering from sentences");
            let sentences: Vec<String> = ranked
                .iter()
                .take(2)
                .filter(|(score, _)| *score > 0)
                .map(|(_, sentence)| capitalize(sentence))
                .collect();
            format!("{}.", sentences.join(". "))
        }
    };

    Some(Extraction {
        text,
        source: source.map(|entry| entry.title.clone()),
        score: top_score,
    })
}

/// Lowercased, distinct question tokens of at least [`MIN_TOKEN_LEN`] chars.
pub fn question_tokens(question: &str) -> Vec<String> {
    let lowered = question.to_lowercase();
    let mut tokens: Vec<String> = Vec::new();
    for token in lowered.split(|c: char| !c.is_alphanumeric()) {
        if token.chars().count() >= MIN_TOKEN_LEN && !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// Split on `.`, `!` and `?`, dropping fragments under [`MIN_SENTENCE_LEN`].
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|sentence| sentence.chars().count() >= MIN_SENTENCE_LEN)
        .collect()
}

/// Number of tokens occurring anywhere in the sentence, word boundaries
/// ignored.
pub fn score(sentence: &str, tokens: &[String]) -> usize {
    tokens
        .iter()
        .filter(|token| sentence.contains(token.as_str()))
        .count()
}

/// The original-case text from the line holding the sentence up to the
/// next blank line. `None` when lowercasing shifted byte offsets.
fn recover_passage<'a>(content: &'a str, sentence: &str) -> Option<&'a str> {
    let lowered = content.to_lowercase();
    if lowered.len() != content.len() {
        return None;
    }

    let at = lowered.find(sentence)?;
    let start = lowered[..at].rfind('\n').map_or(0, |nl| nl + 1);
    let end = lowered[at..]
        .find("\n\n")
        .map_or(lowered.len(), |offset| at + offset);

    let passage = content.get(start..end)?.trim();
    (!passage.is_empty()).then_some(passage)
}

fn capitalize(sentence: &str) -> String {
    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Reply returned to chat clients
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub answer: String,
    pub html: String,
    pub source: Option<String>,
    pub found: bool,
}

impl ChatReply {
    fn new(answer: String, source: Option<String>, found: bool) -> Self {
        let html = MarkdownRenderer::chat().render(&answer);
        Self {
            answer,
            html,
            source,
            found,
        }
    }
}

/// Chat service: loads the public corpus (cached) and runs the extractor
/// and suggestion index over it.
pub struct ChatService {
    repo: Arc<dyn PostRepository>,
    cache: Arc<MemoryCache>,
}

impl ChatService {
    pub fn new(repo: Arc<dyn PostRepository>, cache: Arc<MemoryCache>) -> Self {
        Self { repo, cache }
    }

    /// Password-protected posts are left out.
    pub async fn corpus(&self) -> anyhow::Result<Vec<CorpusEntry>> {
        if let Some(corpus) = self
            .cache
            .get::<Vec<CorpusEntry>>(CORPUS_CACHE_KEY)
            .await
            .ok()
            .flatten()
        {
            return Ok(corpus);
        }

        let corpus: Vec<CorpusEntry> = self
            .repo
            .list(None)
            .await?
            .into_iter()
            .filter(|post| !post.is_protected())
            .map(|post| CorpusEntry::new(post.title, post.content))
            .collect();

        let _ = self.cache.set(CORPUS_CACHE_KEY, &corpus).await;
        tracing::debug!("Chat corpus rebuilt with {} posts", corpus.len());
        Ok(corpus)
    }

    /// Drop the cached corpus after any post write
    pub async fn invalidate(&self) {
        self.cache.delete(CORPUS_CACHE_KEY).await;
    }

    pub async fn ask(&self, question: &str) -> ChatReply {
        let corpus = match self.corpus().await {
            Ok(corpus) => corpus,
            Err(e) => {
                tracing::warn!("Failed to load chat corpus: {:#}", e);
                return ChatReply::new(ERROR_ANSWER.to_string(), None, false);
            }
        };

        match extract(question, &corpus) {
            Some(extraction) => {
                let source = extraction.source.clone();
                ChatReply::new(extraction.into_answer(), source, true)
            }
            None => ChatReply::new(FALLBACK_ANSWER.to_string(), None, false),
        }
    }

    /// Autocomplete for the chat input. Load failures yield no suggestions.
    pub async fn suggest(&self, partial: &str) -> Vec<String> {
        match self.corpus().await {
            Ok(corpus) => KeywordIndex::build(&corpus).suggest(partial),
            Err(e) => {
                tracing::warn!("Failed to load chat corpus: {:#}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sky_corpus() -> Vec<CorpusEntry> {
        vec![CorpusEntry::new("T", "The sky is blue. Grass is green.")]
    }

    #[test]
    fn test_short_tokens_are_ignored() {
        assert_eq!(question_tokens("what color is the sky"), vec!["what", "color"]);
    }

    #[test]
    fn test_tokens_are_distinct_and_lowercased() {
        assert_eq!(question_tokens("Rings? RINGS, rings!"), vec!["rings"]);
    }

    #[test]
    fn test_question_with_only_short_overlap_falls_back() {
        // "sky" is three characters, so nothing overlaps.
        assert_eq!(answer("what color sky", &sky_corpus()), FALLBACK_ANSWER);
    }

    #[test]
    fn test_answer_recovers_whole_paragraph_with_source() {
        let reply = answer("why is the sky blue", &sky_corpus());
        assert_eq!(reply, "The sky is blue. Grass is green.\n\n(Source: T)");
    }

    #[test]
    fn test_answer_is_bounded_by_blank_lines() {
        let corpus = vec![
            CorpusEntry::new("Intro", "Welcome to class."),
            CorpusEntry::new(
                "Space",
                "Intro line here.\n\nPlanets orbit the sun. Saturn has bright rings.\n\nMoons are small worlds.",
            ),
        ];

        let reply = answer("which planet has rings", &corpus);
        assert_eq!(
            reply,
            "Planets orbit the sun. Saturn has bright rings.\n\n(Source: Space)"
        );
    }

    #[test]
    fn test_higher_overlap_wins() {
        let corpus = vec![CorpusEntry::new(
            "Cells",
            "Cells divide often.\n\nMitochondria produce energy for cells.\n\nEnergy is stored.",
        )];
        let extraction = extract("where do cells produce energy", &corpus).unwrap();
        assert_eq!(extraction.score, 3);
        assert_eq!(extraction.text, "Mitochondria produce energy for cells.");
    }

    #[test]
    fn test_substring_matches_count() {
        // "start" contains "star" even though they are different words.
        let tokens = question_tokens("star");
        assert_eq!(score("press start to begin", &tokens), 1);
    }

    #[test]
    fn test_falls_back_to_sentences_when_offsets_shift() {
        // Lowercasing 'İ' changes its byte length, so the passage cannot be
        // sliced out of the original.
        let corpus = vec![CorpusEntry::new(
            "Cities",
            "İstanbul straddles two continents. It sits on the Bosphorus strait.",
        )];

        let reply = answer("which continents", &corpus);
        assert!(reply.contains("straddles two continents."));
        assert!(reply.ends_with("\n\n(Source: Cities)"));
        assert!(!reply.contains("Bosphorus"));
    }

    #[test]
    fn test_sentence_fallback_joins_top_two() {
        let corpus = vec![CorpusEntry::new(
            "Cities",
            "İstanbul has many bridges. Tokyo has many bridges too. Paris has bridges as well.",
        )];

        // 'İ' lowercases to "i\u{307}", which uppercases back to "I\u{307}".
        assert_eq!(
            answer("bridges", &corpus),
            "I\u{307}stanbul has many bridges. Tokyo has many bridges too.\n\n(Source: Cities)"
        );
    }

    #[test]
    fn test_ties_keep_corpus_order() {
        let rivers = CorpusEntry::new("Rivers", "Rivers carry water to the sea.");
        let canals = CorpusEntry::new("Canals", "Canals carry water between towns.");

        assert_eq!(
            answer("carry", &[rivers.clone(), canals.clone()]),
            "Rivers carry water to the sea.\n\n(Source: Rivers)"
        );
        assert_eq!(
            answer("carry", &[canals, rivers]),
            "Canals carry water between towns.\n\n(Source: Canals)"
        );
    }

    #[test]
    fn test_short_sentences_are_skipped() {
        let sentences = split_sentences("ok. this one is long enough! tiny? ");
        assert_eq!(sentences, vec!["this one is long enough"]);
    }

    #[test]
    fn test_empty_inputs_never_fail() {
        assert_eq!(answer("", &sky_corpus()), FALLBACK_ANSWER);
        assert_eq!(answer("photosynthesis", &[]), FALLBACK_ANSWER);
        assert_eq!(answer("", &[]), FALLBACK_ANSWER);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("hello there"), "Hello there");
        assert_eq!(capitalize(""), "");
    }
}
