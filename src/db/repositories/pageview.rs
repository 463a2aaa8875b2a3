//! Pageview repository

use crate::db::DynDatabasePool;
use crate::models::PageView;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

#[async_trait]
pub trait PageViewRepository: Send + Sync {
    async fn record(&self, path: &str, referrer: Option<&str>) -> Result<PageView>;
    async fn count_by_path(&self, path: &str) -> Result<i64>;
}

pub struct SqlxPageViewRepository {
    pool: DynDatabasePool,
}

impl SqlxPageViewRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PageViewRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PageViewRepository for SqlxPageViewRepository {
    async fn record(&self, path: &str, referrer: Option<&str>) -> Result<PageView> {
        let now = Utc::now();
        let result = sqlx::query("INSERT INTO pageviews (path, referrer, viewed_at) VALUES (?, ?, ?)")
            .bind(path)
            .bind(referrer)
            .bind(now)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to record pageview")?;

        Ok(PageView {
            id: result.last_insert_rowid(),
            path: path.to_string(),
            referrer: referrer.map(str::to_string),
            viewed_at: now,
        })
    }

    async fn count_by_path(&self, path: &str) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM pageviews WHERE path = ?")
            .bind(path)
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count pageviews")?;
        Ok(row.get("count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    #[tokio::test]
    async fn test_record_and_count() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let repo = SqlxPageViewRepository::new(pool);

        repo.record("/posts/1", None).await.unwrap();
        repo.record("/posts/1", Some("https://example.com")).await.unwrap();
        repo.record("/quizzes", None).await.unwrap();

        assert_eq!(repo.count_by_path("/posts/1").await.unwrap(), 2);
        assert_eq!(repo.count_by_path("/quizzes").await.unwrap(), 1);
        assert_eq!(repo.count_by_path("/nowhere").await.unwrap(), 0);
    }
}
