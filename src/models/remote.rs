//! Shapes read back from the remote content store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored blob at its current revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub path: String,
    /// Decoded text content
    pub content: String,
    /// Content hash; required to update or delete this revision
    pub hash: String,
}

/// One point in a path's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub id: String,
    pub author: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub url: String,
}

impl Revision {
    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

/// A historical snapshot, split into metadata and body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionSnapshot {
    pub path: String,
    pub revision: String,
    pub metadata: super::DocumentMetadata,
    pub body: String,
}
