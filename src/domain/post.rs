use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Originating feed URL for ingested posts, `None` when authored by hand.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a post; the store assigns id and timestamp.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub source: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl NewPost {
    pub fn authored(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn ingested(title: impl Into<String>, content: impl Into<String>, source: &str) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            source: Some(source.to_string()),
            published_at: None,
        }
    }
}
