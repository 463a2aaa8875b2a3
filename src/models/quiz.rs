//! Quiz model
//!
//! This module provides:
//! - `Quiz` and `QuizQuestion` entities
//! - Entry-time validation of question shape
//! - Submission and grading result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
}

/// Expected answer: an option string or a boolean
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Bool(bool),
    Text(String),
}

impl Answer {
    /// Human readable form for question papers
    pub fn display(&self) -> String {
        match self {
            Answer::Bool(true) => "True".to_string(),
            Answer::Bool(false) => "False".to_string(),
            Answer::Text(text) => text.clone(),
        }
    }
}

/// A single quiz question
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: Answer,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    /// Check the question is answerable as entered
    pub fn validate(&self) -> Result<(), String> {
        if self.question.trim().is_empty() {
            return Err("Question text cannot be empty".to_string());
        }

        match self.kind {
            QuestionType::MultipleChoice => {
                if self.options.len() < 2 {
                    return Err(format!(
                        "Question '{}' needs at least two options",
                        self.question
                    ));
                }
                if self.options.iter().any(|o| o.trim().is_empty()) {
                    return Err(format!("Question '{}' has an empty option", self.question));
                }
                match &self.correct_answer {
                    Answer::Text(text) if self.options.contains(text) => Ok(()),
                    Answer::Text(text) => Err(format!(
                        "Correct answer '{}' is not one of the options",
                        text
                    )),
                    Answer::Bool(_) => Err(format!(
                        "Question '{}' expects an option as its answer",
                        self.question
                    )),
                }
            }
            QuestionType::TrueFalse => {
                if !self.options.is_empty() {
                    return Err(format!(
                        "True/false question '{}' cannot have options",
                        self.question
                    ));
                }
                match self.correct_answer {
                    Answer::Bool(_) => Ok(()),
                    Answer::Text(_) => Err(format!(
                        "Question '{}' expects true or false as its answer",
                        self.question
                    )),
                }
            }
        }
    }

    /// Grade one submitted answer
    pub fn is_correct(&self, given: &Answer) -> bool {
        match (&self.correct_answer, given) {
            (Answer::Bool(expected), Answer::Bool(actual)) => expected == actual,
            (Answer::Bool(expected), Answer::Text(actual)) => {
                actual.trim().parse::<bool>().map_or(false, |a| a == *expected)
            }
            (Answer::Text(expected), Answer::Text(actual)) => {
                expected.trim().to_lowercase() == actual.trim().to_lowercase()
            }
            (Answer::Text(_), Answer::Bool(_)) => false,
        }
    }
}

/// Difficulty label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Difficulty {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(anyhow::anyhow!("Invalid difficulty: {}", s)),
        }
    }
}

/// Quiz entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub questions: Vec<QuizQuestion>,
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl Quiz {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_protected(&self) -> bool {
        self.password.as_deref().map_or(false, |p| !p.is_empty())
    }

    pub fn password_matches(&self, attempt: Option<&str>) -> bool {
        match self.password.as_deref() {
            Some(p) if !p.is_empty() => attempt == Some(p),
            _ => true,
        }
    }

    /// Copy with correct answers and explanations stripped, for takers
    pub fn without_answers(&self) -> QuizForTaker {
        QuizForTaker {
            id: self.id,
            title: self.title.clone(),
            difficulty: self.difficulty,
            created_at: self.created_at,
            expires_at: self.expires_at,
            protected: self.is_protected(),
            questions: self
                .questions
                .iter()
                .map(|q| QuestionForTaker {
                    id: q.id.clone(),
                    question: q.question.clone(),
                    kind: q.kind,
                    options: q.options.clone(),
                })
                .collect(),
        }
    }
}

/// Quiz as served to someone taking it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizForTaker {
    pub id: i64,
    pub title: String,
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub protected: bool,
    pub questions: Vec<QuestionForTaker>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionForTaker {
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub options: Vec<String>,
}

/// Question as entered by an author; the id is assigned on create
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    #[serde(default)]
    pub id: Option<String>,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: Answer,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Input for creating a quiz
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizInput {
    pub title: String,
    pub questions: Vec<QuestionInput>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub password: Option<String>,
}

/// One answer in a submission
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: String,
    pub answer: Answer,
}

/// A quiz attempt
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSubmission {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
}

/// Grading outcome for one question
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionFeedback {
    pub question_id: String,
    pub correct: bool,
    pub given: Option<Answer>,
    pub correct_answer: Answer,
    pub explanation: Option<String>,
}

/// Grading outcome for a whole attempt
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub quiz_id: i64,
    pub score: usize,
    pub total: usize,
    pub percentage: f64,
    pub feedback: Vec<QuestionFeedback>,
}
