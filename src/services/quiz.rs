//! Quiz service
//!
//! Creation with entry-time validation, grading of attempts, and printable
//! question papers rendered through the markdown pipeline.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::QuizConfig;
use crate::db::repositories::QuizRepository;
use crate::models::{
    CreateQuizInput, QuestionFeedback, QuestionType, Quiz, QuizForTaker, QuizQuestion,
    QuizResult, QuizSubmission,
};
use crate::services::markdown::MarkdownRenderer;

/// Quiz service errors
#[derive(Debug, Error)]
pub enum QuizServiceError {
    #[error("Quiz not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Quiz {0} has expired")]
    Expired(i64),

    #[error("Incorrect password")]
    WrongPassword,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Printable paper in both source and rendered form
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPaper {
    pub quiz_id: i64,
    pub title: String,
    pub markdown: String,
    pub html: String,
}

pub struct QuizService {
    repo: Arc<dyn QuizRepository>,
    config: QuizConfig,
}

impl QuizService {
    pub fn new(repo: Arc<dyn QuizRepository>, config: QuizConfig) -> Self {
        Self { repo, config }
    }

    pub async fn create(&self, input: CreateQuizInput) -> Result<Quiz, QuizServiceError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(QuizServiceError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
        if input.questions.is_empty() {
            return Err(QuizServiceError::ValidationError(
                "A quiz needs at least one question".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut questions = Vec::with_capacity(input.questions.len());
        for question in input.questions {
            let id = question
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            if !seen.insert(id.clone()) {
                return Err(QuizServiceError::ValidationError(format!(
                    "Duplicate question id '{}'",
                    id
                )));
            }

            let question = QuizQuestion {
                id,
                question: question.question.trim().to_string(),
                kind: question.kind,
                options: question.options,
                correct_answer: question.correct_answer,
                explanation: question.explanation.filter(|e| !e.trim().is_empty()),
            };
            question
                .validate()
                .map_err(QuizServiceError::ValidationError)?;
            questions.push(question);
        }

        let created_at = Utc::now();
        let expires_at = input
            .expires_at
            .unwrap_or_else(|| created_at + Duration::hours(self.config.default_expiry_hours));
        if expires_at <= created_at {
            return Err(QuizServiceError::ValidationError(
                "Expiration must be in the future".to_string(),
            ));
        }

        let quiz = Quiz {
            id: 0,
            title: title.to_string(),
            questions,
            difficulty: input.difficulty,
            created_at,
            expires_at,
            password: input.password.filter(|p| !p.is_empty()),
        };

        let created = self.repo.create(&quiz).await?;
        tracing::info!(
            "Created quiz {} with {} questions, expires {}",
            created.id,
            created.questions.len(),
            created.expires_at
        );
        Ok(created)
    }

    /// Quiz as a taker sees it
    pub async fn get(&self, id: i64) -> Result<QuizForTaker, QuizServiceError> {
        Ok(self.find(id).await?.without_answers())
    }

    pub async fn list(&self, active_only: bool) -> Result<Vec<QuizForTaker>, QuizServiceError> {
        let active_at = active_only.then(Utc::now);
        let quizzes = self.repo.list(active_at).await?;
        Ok(quizzes.iter().map(Quiz::without_answers).collect())
    }

    pub async fn delete(&self, id: i64) -> Result<(), QuizServiceError> {
        if !self.repo.delete(id).await? {
            return Err(QuizServiceError::NotFound(id));
        }
        tracing::info!("Deleted quiz {}", id);
        Ok(())
    }

    /// Grade an attempt. Unanswered questions count as wrong.
    pub async fn submit(
        &self,
        id: i64,
        submission: QuizSubmission,
    ) -> Result<QuizResult, QuizServiceError> {
        let quiz = self.find(id).await?;

        if quiz.is_expired() {
            return Err(QuizServiceError::Expired(id));
        }
        if !quiz.password_matches(submission.password.as_deref()) {
            return Err(QuizServiceError::WrongPassword);
        }

        if let Some(unknown) = submission
            .answers
            .iter()
            .find(|a| !quiz.questions.iter().any(|q| q.id == a.question_id))
        {
            return Err(QuizServiceError::ValidationError(format!(
                "Unknown question id '{}'",
                unknown.question_id
            )));
        }

        let feedback: Vec<QuestionFeedback> = quiz
            .questions
            .iter()
            .map(|question| {
                let given = submission
                    .answers
                    .iter()
                    .find(|a| a.question_id == question.id)
                    .map(|a| a.answer.clone());
                QuestionFeedback {
                    question_id: question.id.clone(),
                    correct: given.as_ref().is_some_and(|g| question.is_correct(g)),
                    given,
                    correct_answer: question.correct_answer.clone(),
                    explanation: question.explanation.clone(),
                }
            })
            .collect();

        let total = feedback.len();
        let score = feedback.iter().filter(|f| f.correct).count();
        let percentage = if total == 0 {
            0.0
        } else {
            (score as f64 / total as f64 * 1000.0).round() / 10.0
        };

        tracing::debug!("Quiz {} graded {}/{}", id, score, total);
        Ok(QuizResult {
            quiz_id: id,
            score,
            total,
            percentage,
            feedback,
        })
    }

    /// Printable paper. The answer key of a protected quiz needs its password.
    pub async fn question_paper(
        &self,
        id: i64,
        include_answers: bool,
        password: Option<&str>,
    ) -> Result<QuestionPaper, QuizServiceError> {
        let quiz = self.find(id).await?;
        if include_answers && !quiz.password_matches(password) {
            return Err(QuizServiceError::WrongPassword);
        }
        let markdown = paper_markdown(&quiz, include_answers);
        let html = MarkdownRenderer::preview().render(&markdown);

        Ok(QuestionPaper {
            quiz_id: quiz.id,
            title: quiz.title,
            markdown,
            html,
        })
    }

    async fn find(&self, id: i64) -> Result<Quiz, QuizServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(QuizServiceError::NotFound(id))
    }
}

/// Paper source in the authoring subset: one `##` section per question,
/// choices as empty checkboxes, the key as fill-in blanks.
pub fn paper_markdown(quiz: &Quiz, include_answers: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", quiz.title);
    let _ = writeln!(out);
    let _ = writeln!(out, "Difficulty: {}", quiz.difficulty);

    for (n, question) in quiz.questions.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Question {}", n + 1);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", question.question);
        let _ = writeln!(out);

        let choices: Vec<&str> = match question.kind {
            QuestionType::MultipleChoice => question.options.iter().map(String::as_str).collect(),
            QuestionType::TrueFalse => vec!["True", "False"],
        };
        for choice in choices {
            let _ = writeln!(out, "- [ ] {}", choice);
        }

        if include_answers {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "**Answer:** ___{}___",
                question.correct_answer.display()
            );
            if let Some(explanation) = &question.explanation {
                let _ = writeln!(out);
                let _ = writeln!(out, "{}", explanation);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxQuizRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Answer, Difficulty, QuestionInput, SubmittedAnswer};

    async fn setup() -> QuizService {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        QuizService::new(SqlxQuizRepository::boxed(pool), QuizConfig::default())
    }

    fn planets() -> QuestionInput {
        QuestionInput {
            id: Some("planets".into()),
            question: "Largest planet?".into(),
            kind: QuestionType::MultipleChoice,
            options: vec!["Mars".into(), "Jupiter".into()],
            correct_answer: Answer::Text("Jupiter".into()),
            explanation: Some("Jupiter is a gas giant.".into()),
        }
    }

    fn sun() -> QuestionInput {
        QuestionInput {
            id: Some("sun".into()),
            question: "The sun is a star.".into(),
            kind: QuestionType::TrueFalse,
            options: vec![],
            correct_answer: Answer::Bool(true),
            explanation: None,
        }
    }

    fn input(questions: Vec<QuestionInput>) -> CreateQuizInput {
        CreateQuizInput {
            title: "Space".into(),
            questions,
            difficulty: Difficulty::Easy,
            expires_at: None,
            password: None,
        }
    }

    fn answer(question_id: &str, answer: Answer) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id: question_id.into(),
            answer,
        }
    }

    #[tokio::test]
    async fn test_create_applies_default_expiry() {
        let service = setup().await;
        let quiz = service.create(input(vec![planets()])).await.unwrap();

        assert!(quiz.id > 0);
        assert_eq!(quiz.expires_at - quiz.created_at, Duration::hours(24 * 7));
    }

    #[tokio::test]
    async fn test_create_assigns_missing_question_ids() {
        let service = setup().await;
        let mut question = sun();
        question.id = None;
        let quiz = service.create(input(vec![question])).await.unwrap();

        assert!(Uuid::parse_str(&quiz.questions[0].id).is_ok());
    }

    #[tokio::test]
    async fn test_create_validation() {
        let service = setup().await;

        let result = service.create(input(vec![])).await;
        assert!(matches!(result, Err(QuizServiceError::ValidationError(_))));

        let mut bad = planets();
        bad.correct_answer = Answer::Text("Pluto".into());
        let result = service.create(input(vec![bad])).await;
        assert!(matches!(result, Err(QuizServiceError::ValidationError(_))));

        let result = service.create(input(vec![planets(), planets()])).await;
        assert!(matches!(result, Err(QuizServiceError::ValidationError(_))));

        let mut past = input(vec![sun()]);
        past.expires_at = Some(Utc::now() - Duration::hours(1));
        let result = service.create(past).await;
        assert!(matches!(result, Err(QuizServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_submit_grades_each_question() {
        let service = setup().await;
        let quiz = service.create(input(vec![planets(), sun()])).await.unwrap();

        let submission = QuizSubmission {
            password: None,
            answers: vec![
                answer("planets", Answer::Text(" jupiter".into())),
                answer("sun", Answer::Bool(false)),
            ],
        };
        let result = service.submit(quiz.id, submission).await.unwrap();

        assert_eq!(result.score, 1);
        assert_eq!(result.total, 2);
        assert_eq!(result.percentage, 50.0);
        assert!(result.feedback[0].correct);
        assert_eq!(
            result.feedback[0].explanation.as_deref(),
            Some("Jupiter is a gas giant.")
        );
        assert!(!result.feedback[1].correct);
    }

    #[tokio::test]
    async fn test_unanswered_counts_as_wrong() {
        let service = setup().await;
        let quiz = service.create(input(vec![planets(), sun()])).await.unwrap();

        let result = service
            .submit(quiz.id, QuizSubmission::default())
            .await
            .unwrap();
        assert_eq!(result.score, 0);
        assert!(result.feedback.iter().all(|f| f.given.is_none()));
    }

    #[tokio::test]
    async fn test_submit_rejects_unknown_question() {
        let service = setup().await;
        let quiz = service.create(input(vec![sun()])).await.unwrap();

        let submission = QuizSubmission {
            password: None,
            answers: vec![answer("nope", Answer::Bool(true))],
        };
        assert!(matches!(
            service.submit(quiz.id, submission).await,
            Err(QuizServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_password_gate() {
        let service = setup().await;
        let mut locked = input(vec![sun()]);
        locked.password = Some("secret".into());
        let quiz = service.create(locked).await.unwrap();

        assert!(matches!(
            service.submit(quiz.id, QuizSubmission::default()).await,
            Err(QuizServiceError::WrongPassword)
        ));

        let submission = QuizSubmission {
            password: Some("secret".into()),
            answers: vec![answer("sun", Answer::Bool(true))],
        };
        assert_eq!(service.submit(quiz.id, submission).await.unwrap().score, 1);
    }

    #[tokio::test]
    async fn test_expired_quiz_rejects_submissions() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let repo = SqlxQuizRepository::boxed(pool);

        let now = Utc::now();
        let stale = Quiz {
            id: 0,
            title: "Old".into(),
            questions: vec![],
            difficulty: Difficulty::Medium,
            created_at: now - Duration::hours(2),
            expires_at: now - Duration::hours(1),
            password: None,
        };
        let stale = repo.create(&stale).await.unwrap();
        let service = QuizService::new(repo, QuizConfig::default());

        assert!(matches!(
            service.submit(stale.id, QuizSubmission::default()).await,
            Err(QuizServiceError::Expired(_))
        ));
        assert!(service.list(true).await.unwrap().is_empty());
        assert_eq!(service.list(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_hides_answers_and_delete() {
        let service = setup().await;
        let quiz = service.create(input(vec![planets()])).await.unwrap();

        let view = service.get(quiz.id).await.unwrap();
        assert_eq!(view.questions[0].options, vec!["Mars", "Jupiter"]);

        service.delete(quiz.id).await.unwrap();
        assert!(matches!(
            service.get(quiz.id).await,
            Err(QuizServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(quiz.id).await,
            Err(QuizServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_question_paper() {
        let service = setup().await;
        let quiz = service.create(input(vec![planets(), sun()])).await.unwrap();

        let paper = service.question_paper(quiz.id, false, None).await.unwrap();
        assert!(paper.markdown.starts_with("# Space\n"));
        assert!(paper.html.contains("<h1>Space</h1>"));
        assert!(paper.html.contains("<h2>Question 2</h2>"));
        assert!(paper
            .html
            .contains("<li><input type=\"checkbox\" disabled> Jupiter</li>"));
        assert!(!paper.html.contains("fill-blank"));

        let key = service.question_paper(quiz.id, true, None).await.unwrap();
        assert!(key
            .html
            .contains("<strong>Answer:</strong> <span class=\"fill-blank\">Jupiter</span>"));
        assert!(key
            .html
            .contains("<span class=\"fill-blank\">True</span>"));
        assert!(key.html.contains("<p>Jupiter is a gas giant.</p>"));
    }

    #[tokio::test]
    async fn test_answer_key_of_protected_quiz_needs_password() {
        let service = setup().await;
        let mut locked = input(vec![planets()]);
        locked.password = Some("secret".into());
        let quiz = service.create(locked).await.unwrap();

        let paper = service.question_paper(quiz.id, false, None).await.unwrap();
        assert!(!paper.html.contains("fill-blank"));

        for attempt in [None, Some("guess")] {
            assert!(matches!(
                service.question_paper(quiz.id, true, attempt).await,
                Err(QuizServiceError::WrongPassword)
            ));
        }

        let key = service
            .question_paper(quiz.id, true, Some("secret"))
            .await
            .unwrap();
        assert!(key.html.contains("<span class=\"fill-blank\">Jupiter</span>"));
    }
}
