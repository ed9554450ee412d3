use serde::{Deserialize, Serialize};

/// One article preview as delivered to the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub preview: String,
    /// `YYYY-MM-DD HH:MM:SS` in UTC, or empty when the feed gave no usable date.
    pub published: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Success,
    Error,
}

/// Response body for `GET /news`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsBatch {
    pub category: String,
    pub feed_name: String,
    pub items: Vec<FeedItem>,
    pub status: BatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NewsBatch {
    pub fn success(category: String, feed_name: String, items: Vec<FeedItem>) -> Self {
        Self {
            category,
            feed_name,
            items,
            status: BatchStatus::Success,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            category: String::new(),
            feed_name: String::new(),
            items: Vec::new(),
            status: BatchStatus::Error,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == BatchStatus::Success
    }
}
