//! Pageview model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single recorded page visit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub id: i64,
    pub path: String,
    pub referrer: Option<String>,
    pub viewed_at: DateTime<Utc>,
}

/// Input for recording a visit
#[derive(Debug, Clone, Deserialize)]
pub struct RecordPageViewInput {
    pub path: String,
    #[serde(default)]
    pub referrer: Option<String>,
}
