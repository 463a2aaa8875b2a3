//! Post repository

use crate::db::DynDatabasePool;
use crate::models::BlogPost;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: &BlogPost) -> Result<BlogPost>;
    async fn get_by_id(&self, id: i64) -> Result<Option<BlogPost>>;
    /// Newest first, optionally restricted to one subject
    async fn list(&self, subject: Option<&str>) -> Result<Vec<BlogPost>>;
    async fn update(&self, post: &BlogPost) -> Result<BlogPost>;
    /// Returns whether a row was removed
    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_COLUMNS: &str = "SELECT id, title, content, date, read_time, image_url, password, subject, created_at, updated_at FROM posts";

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &BlogPost) -> Result<BlogPost> {
        let result = sqlx::query(
            "INSERT INTO posts (title, content, date, read_time, image_url, password, subject, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.date)
        .bind(&post.read_time)
        .bind(&post.image_url)
        .bind(&post.password)
        .bind(&post.subject)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create post")?;

        Ok(BlogPost {
            id: result.last_insert_rowid(),
            ..post.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogPost>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get post")?;
        Ok(row.map(|r| row_to_post(&r)))
    }

    async fn list(&self, subject: Option<&str>) -> Result<Vec<BlogPost>> {
        let rows = match subject {
            Some(subject) => {
                sqlx::query(&format!(
                    "{} WHERE subject = ? ORDER BY created_at DESC, id DESC",
                    SELECT_COLUMNS
                ))
                .bind(subject)
                .fetch_all(self.pool.sqlite())
                .await
            }
            None => {
                sqlx::query(&format!("{} ORDER BY created_at DESC, id DESC", SELECT_COLUMNS))
                    .fetch_all(self.pool.sqlite())
                    .await
            }
        }
        .context("Failed to list posts")?;

        Ok(rows.iter().map(row_to_post).collect())
    }

    async fn update(&self, post: &BlogPost) -> Result<BlogPost> {
        let now = Utc::now();
        sqlx::query(
            "UPDATE posts SET title = ?, content = ?, read_time = ?, image_url = ?, password = ?, subject = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.read_time)
        .bind(&post.image_url)
        .bind(&post.password)
        .bind(&post.subject)
        .bind(now)
        .bind(post.id)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to update post")?;

        self.get_by_id(post.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete post")?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> BlogPost {
    BlogPost {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        date: row.get("date"),
        read_time: row.get("read_time"),
        image_url: row.get("image_url"),
        password: row.get("password"),
        subject: row.get("subject"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
