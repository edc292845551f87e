//! Discussion thread models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-document comment container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionThread {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub message_count: u64,
}

/// A single message in a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: u64,
    pub author: String,
    pub avatar_url: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub url: String,
}

/// A thread together with its messages, oldest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionView {
    pub thread: DiscussionThread,
    pub messages: Vec<Message>,
}

/// Request body for posting a message.
#[derive(Debug, Clone, Deserialize)]
pub struct PostMessageRequest {
    pub body: String,
}
