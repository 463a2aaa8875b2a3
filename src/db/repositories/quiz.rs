//! Quiz repository
//!
//! Questions are stored as a JSON array in the `questions` column.

use crate::db::DynDatabasePool;
use crate::models::{Difficulty, Quiz, QuizQuestion};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::sync::Arc;

#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn create(&self, quiz: &Quiz) -> Result<Quiz>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Quiz>>;
    /// Newest first; with `active_at`, only quizzes expiring after that instant
    async fn list(&self, active_at: Option<DateTime<Utc>>) -> Result<Vec<Quiz>>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxQuizRepository {
    pool: DynDatabasePool,
}

impl SqlxQuizRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn QuizRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, title, questions, difficulty, password, created_at, expires_at FROM quizzes";

#[async_trait]
impl QuizRepository for SqlxQuizRepository {
    async fn create(&self, quiz: &Quiz) -> Result<Quiz> {
        let questions =
            serde_json::to_string(&quiz.questions).context("Failed to encode quiz questions")?;

        let result = sqlx::query(
            "INSERT INTO quizzes (title, questions, difficulty, password, created_at, expires_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&quiz.title)
        .bind(questions)
        .bind(quiz.difficulty.as_str())
        .bind(&quiz.password)
        .bind(quiz.created_at)
        .bind(quiz.expires_at)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create quiz")?;

        Ok(Quiz {
            id: result.last_insert_rowid(),
            ..quiz.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Quiz>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get quiz")?;
        row.map(|r| row_to_quiz(&r)).transpose()
    }

    async fn list(&self, active_at: Option<DateTime<Utc>>) -> Result<Vec<Quiz>> {
        let rows = match active_at {
            Some(now) => {
                sqlx::query(&format!(
                    "{} WHERE expires_at > ? ORDER BY created_at DESC, id DESC",
                    SELECT_COLUMNS
                ))
                .bind(now)
                .fetch_all(self.pool.sqlite())
                .await
            }
            None => {
                sqlx::query(&format!("{} ORDER BY created_at DESC, id DESC", SELECT_COLUMNS))
                    .fetch_all(self.pool.sqlite())
                    .await
            }
        }
        .context("Failed to list quizzes")?;

        rows.iter().map(row_to_quiz).collect()
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete quiz")?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_quiz(row: &sqlx::sqlite::SqliteRow) -> Result<Quiz> {
    let id: i64 = row.get("id");
    let questions: String = row.get("questions");
    let questions: Vec<QuizQuestion> = serde_json::from_str(&questions)
        .with_context(|| format!("Corrupt questions for quiz {}", id))?;
    let difficulty: String = row.get("difficulty");

    Ok(Quiz {
        id,
        title: row.get("title"),
        questions,
        difficulty: difficulty.parse().unwrap_or(Difficulty::Medium),
        password: row.get("password"),
        created_at: row.get("created_at"),
        expires_at: row.get("expires_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Answer, QuestionType};
    use chrono::Duration;

    async fn setup() -> SqlxQuizRepository {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        SqlxQuizRepository::new(pool)
    }

    fn quiz(title: &str, expires_in: Duration) -> Quiz {
        let now = Utc::now();
        Quiz {
            id: 0,
            title: title.into(),
            questions: vec![QuizQuestion {
                id: "q1".into(),
                question: "Is water wet?".into(),
                kind: QuestionType::TrueFalse,
                options: vec![],
                correct_answer: Answer::Bool(true),
                explanation: None,
            }],
            difficulty: Difficulty::Hard,
            created_at: now,
            expires_at: now + expires_in,
            password: None,
        }
    }

    #[tokio::test]
    async fn test_create_roundtrips_questions() {
        let repo = setup().await;
        let created = repo.create(&quiz("Water", Duration::hours(1))).await.unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Water");
        assert_eq!(fetched.difficulty, Difficulty::Hard);
        assert_eq!(fetched.questions.len(), 1);
        assert_eq!(fetched.questions[0].correct_answer, Answer::Bool(true));
    }

    #[tokio::test]
    async fn test_list_active_only() {
        let repo = setup().await;
        repo.create(&quiz("Live", Duration::hours(1))).await.unwrap();
        repo.create(&quiz("Stale", Duration::hours(-1))).await.unwrap();

        assert_eq!(repo.list(None).await.unwrap().len(), 2);
        let active = repo.list(Some(Utc::now())).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "Live");
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup().await;
        let created = repo.create(&quiz("Gone", Duration::hours(1))).await.unwrap();
        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
