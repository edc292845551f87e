//! Document editing workflow.
//!
//! Composes the content codec with a [`DocumentStore`]: documents are opened
//! as metadata + body + hash, and written back by merging the two and handing
//! the hash to the store as the concurrency token.

use std::sync::Arc;

use crate::catalog::new_document_id;
use crate::codec::{merge_metadata_and_body, split_metadata_and_body};
use crate::errors::AppError;
use crate::github::DocumentStore;
use crate::models::{
    CreateDocumentRequest, DeleteDocumentRequest, DiscussionView, DocumentDraft,
    DocumentMetadata, Message, Revision, RevisionSnapshot, UpdateDocumentRequest,
};

/// Join a collection-relative identifier onto the remote prefix.
pub fn remote_path(prefix: &str, document_id: &str) -> String {
    let id = document_id.trim_start_matches('/');
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        id.to_string()
    } else {
        format!("{}/{}", prefix, id)
    }
}

/// Reject identifiers that could address anything outside the collection.
pub fn validate_document_id(document_id: &str) -> Result<(), AppError> {
    let id = document_id.trim();
    if id.is_empty() {
        return Err(AppError::Validation("Document path is required".to_string()));
    }
    if id.starts_with('/')
        || id.contains('\\')
        || id.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(AppError::Validation(format!(
            "Invalid document path: {}",
            document_id
        )));
    }
    Ok(())
}

fn message_or(message: Option<String>, default: impl FnOnce() -> String) -> String {
    message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(default)
}

/// Display title for commit messages: the metadata title, else the identifier.
fn display_title<'a>(metadata: &'a DocumentMetadata, document_id: &'a str) -> &'a str {
    metadata
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(document_id)
}

/// Documents of the collection as stored remotely.
pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    prefix: String,
}

impl DocumentService {
    pub fn new(store: Arc<dyn DocumentStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    fn remote_path(&self, document_id: &str) -> Result<String, AppError> {
        validate_document_id(document_id)?;
        Ok(remote_path(&self.prefix, document_id.trim()))
    }

    /// Current metadata, body and hash of a document.
    pub async fn open(&self, document_id: &str) -> Result<DocumentDraft, AppError> {
        let path = self.remote_path(document_id)?;
        let file = self
            .store
            .read_file(&path)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", document_id)))?;

        let (metadata, body) = split_metadata_and_body(&file.content);
        Ok(DocumentDraft {
            path: document_id.trim().to_string(),
            metadata,
            body,
            hash: file.hash,
        })
    }

    /// Write a new document. The path is derived from category and title.
    pub async fn create(&self, request: CreateDocumentRequest) -> Result<DocumentDraft, AppError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }

        let document_id = new_document_id(request.category, title)?;
        let path = self.remote_path(&document_id)?;
        let metadata = DocumentMetadata {
            title: Some(title.to_string()),
            category: Some(request.category.as_str().to_string()),
            order: request.order,
            priority: request.priority.map(|p| p.as_str().to_string()),
        };

        let content = merge_metadata_and_body(&request.body, &metadata)?;
        let message = message_or(request.message, || format!("Create {}", title));
        let hash = self.store.create_file(&path, &content, &message).await?;

        tracing::info!("Created document {}", document_id);
        Ok(DocumentDraft {
            path: document_id,
            metadata,
            body: request.body,
            hash,
        })
    }

    /// Write back an opened document against the hash it was opened with.
    pub async fn save(&self, request: UpdateDocumentRequest) -> Result<DocumentDraft, AppError> {
        let path = self.remote_path(&request.path)?;
        if request.hash.trim().is_empty() {
            return Err(AppError::Validation("Content hash is required".to_string()));
        }

        let content = merge_metadata_and_body(&request.body, &request.metadata)?;
        let title = display_title(&request.metadata, request.path.trim()).to_string();
        let message = message_or(request.message, || format!("Update {}", title));
        let hash = self
            .store
            .update_file(&path, &content, request.hash.trim(), &message)
            .await?;

        tracing::info!("Updated document {}", request.path.trim());
        Ok(DocumentDraft {
            path: request.path.trim().to_string(),
            metadata: request.metadata,
            body: request.body,
            hash,
        })
    }

    pub async fn delete(&self, request: DeleteDocumentRequest) -> Result<(), AppError> {
        let path = self.remote_path(&request.path)?;
        if request.hash.trim().is_empty() {
            return Err(AppError::Validation("Content hash is required".to_string()));
        }

        let id = request.path.trim();
        let title = request
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(id)
            .to_string();
        let message = message_or(request.message, || format!("Delete {}", title));
        self.store
            .delete_file(&path, request.hash.trim(), &message)
            .await?;

        tracing::info!("Deleted document {}", id);
        Ok(())
    }

    /// Revisions of a document, newest first.
    pub async fn history(&self, document_id: &str) -> Result<Vec<Revision>, AppError> {
        let path = self.remote_path(document_id)?;
        self.store.list_revisions(&path).await
    }

    /// A document as of `revision`, split into metadata and body.
    pub async fn snapshot(
        &self,
        document_id: &str,
        revision: &str,
    ) -> Result<RevisionSnapshot, AppError> {
        let revision = revision.trim();
        if revision.is_empty() {
            return Err(AppError::Validation("Revision is required".to_string()));
        }

        let path = self.remote_path(document_id)?;
        let raw = self.store.read_file_at_revision(&path, revision).await?;
        let (metadata, body) = split_metadata_and_body(&raw);
        Ok(RevisionSnapshot {
            path: document_id.trim().to_string(),
            revision: revision.to_string(),
            metadata,
            body,
        })
    }

    /// The discussion of a document with its messages, oldest first.
    pub async fn discussion(
        &self,
        title: &str,
        document_id: Option<&str>,
    ) -> Result<DiscussionView, AppError> {
        let path = match document_id {
            Some(id) => Some(self.remote_path(id)?),
            None => None,
        };

        let thread = self.store.find_or_create_thread(title, path.as_deref()).await?;
        let messages = self.store.list_messages(thread.id).await?;
        Ok(DiscussionView { thread, messages })
    }

    /// Post to a thread and return its messages re-read.
    pub async fn post_message(&self, thread_id: u64, body: &str) -> Result<Vec<Message>, AppError> {
        if body.trim().is_empty() {
            return Err(AppError::Validation("Message must not be empty".to_string()));
        }
        self.store.post_message(thread_id, body).await?;
        self.store.list_messages(thread_id).await
    }
}
