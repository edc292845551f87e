//! GitHub REST payloads, limited to the fields the hub reads or writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{DiscussionThread, Message, Revision};

#[derive(Debug, Deserialize)]
pub(super) struct ContentResponse {
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct WriteContentRequest<'a> {
    pub message: &'a str,
    pub content: String,
    pub branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(super) struct DeleteContentRequest<'a> {
    pub message: &'a str,
    pub sha: &'a str,
    pub branch: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct WriteContentResponse {
    pub content: WrittenContent,
}

#[derive(Debug, Deserialize)]
pub(super) struct WrittenContent {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct CommitItem {
    pub sha: String,
    pub html_url: String,
    pub commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
pub(super) struct CommitDetail {
    pub message: String,
    pub author: Option<CommitSignature>,
    pub committer: Option<CommitSignature>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CommitSignature {
    pub name: String,
    pub date: DateTime<Utc>,
}

impl CommitItem {
    /// Author name for display; the committer date places the commit in
    /// history (cherry-picks and rebases keep their original author date).
    pub fn into_revision(self) -> Revision {
        let CommitDetail {
            message,
            author,
            committer,
        } = self.commit;
        let timestamp = committer
            .as_ref()
            .or(author.as_ref())
            .map(|s| s.date)
            .unwrap_or_default();
        let author = author
            .map(|a| a.name)
            .unwrap_or_else(|| "unknown".to_string());
        Revision {
            id: self.sha,
            author,
            message,
            timestamp,
            url: self.html_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct IssueItem {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl IssueItem {
    pub fn into_thread(self) -> DiscussionThread {
        DiscussionThread {
            id: self.number,
            title: self.title,
            url: self.html_url,
            message_count: self.comments,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CreateIssueRequest<'a> {
    pub title: &'a str,
    pub body: String,
    pub labels: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
pub(super) struct CommentItem {
    pub id: u64,
    pub body: Option<String>,
    pub user: Option<UserItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserItem {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

impl CommentItem {
    pub fn into_message(self) -> Message {
        let (author, avatar_url) = match self.user {
            Some(u) => (u.login, u.avatar_url),
            None => ("ghost".to_string(), String::new()),
        };
        Message {
            id: self.id,
            author,
            avatar_url,
            body: self.body.unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            url: self.html_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CreateCommentRequest<'a> {
    pub body: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    pub message: Option<String>,
}
