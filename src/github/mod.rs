//! Remote document repository.
//!
//! [`DocumentStore`] is the seam between the hub and the version-controlled
//! content store; [`GitHubClient`] implements it against the GitHub REST API.
//! Nothing above this module knows the store is a Git host.

mod client;
mod wire;

pub use client::*;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{DiscussionThread, Message, RemoteFile, Revision};

/// Path-addressed, revisioned document storage with per-document discussions.
///
/// Every operation requires a credential and fails with
/// [`AppError::Unauthenticated`] before touching the network when none is held.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Check the held credential against the identity endpoint.
    async fn validate_credential(&self) -> Result<bool, AppError>;

    /// Current content and hash, or `None` when the path does not exist.
    async fn read_file(&self, path: &str) -> Result<Option<RemoteFile>, AppError>;

    /// Write a brand-new path. Returns the new content hash.
    async fn create_file(&self, path: &str, content: &str, message: &str)
        -> Result<String, AppError>;

    /// Replace the content of `path` if `hash` is still current. Returns the new hash.
    async fn update_file(
        &self,
        path: &str,
        content: &str,
        hash: &str,
        message: &str,
    ) -> Result<String, AppError>;

    /// Remove `path` if `hash` is still current.
    async fn delete_file(&self, path: &str, hash: &str, message: &str) -> Result<(), AppError>;

    /// History of `path`, newest first.
    async fn list_revisions(&self, path: &str) -> Result<Vec<Revision>, AppError>;

    /// Content of `path` as of `revision`.
    async fn read_file_at_revision(&self, path: &str, revision: &str)
        -> Result<String, AppError>;

    /// The discussion thread of a document, created on first use.
    async fn find_or_create_thread(
        &self,
        document_title: &str,
        document_path: Option<&str>,
    ) -> Result<DiscussionThread, AppError>;

    /// Messages of a thread, oldest first.
    async fn list_messages(&self, thread_id: u64) -> Result<Vec<Message>, AppError>;

    /// Append a message to a thread.
    async fn post_message(&self, thread_id: u64, body: &str) -> Result<(), AppError>;
}

/// Deterministic thread title for a document.
pub fn thread_title(document_title: &str) -> String {
    format!("Discussion: {}", document_title.trim())
}
