//! Pageview recording

use std::sync::Arc;

use thiserror::Error;

use crate::db::repositories::PageViewRepository;
use crate::models::{PageView, RecordPageViewInput};

#[derive(Debug, Error)]
pub enum PageViewServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct PageViewService {
    repo: Arc<dyn PageViewRepository>,
}

impl PageViewService {
    pub fn new(repo: Arc<dyn PageViewRepository>) -> Self {
        Self { repo }
    }

    pub async fn record(&self, input: RecordPageViewInput) -> Result<PageView, PageViewServiceError> {
        let path = normalize_path(&input.path)?;
        let referrer = input
            .referrer
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());

        let view = self.repo.record(path, referrer).await?;
        tracing::debug!("Recorded view of {}", view.path);
        Ok(view)
    }

    pub async fn count(&self, path: &str) -> Result<i64, PageViewServiceError> {
        let path = normalize_path(path)?;
        Ok(self.repo.count_by_path(path).await?)
    }
}

fn normalize_path(path: &str) -> Result<&str, PageViewServiceError> {
    let path = path.trim();
    if path.is_empty() {
        return Err(PageViewServiceError::ValidationError(
            "Path cannot be empty".to_string(),
        ));
    }
    Ok(path)
}
