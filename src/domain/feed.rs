use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A subscribed RSS/Atom source polled by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub id: i64,
    pub url: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Feed {
    pub fn new(url: String) -> Self {
        Self {
            id: 0,
            url,
            enabled: true,
            created_at: Utc::now(),
        }
    }
}
