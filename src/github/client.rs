//! GitHub REST implementation of [`DocumentStore`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::wire::{
    CommentItem, CommitItem, ContentResponse, CreateCommentRequest, CreateIssueRequest,
    DeleteContentRequest, ErrorBody, IssueItem, WriteContentRequest, WriteContentResponse,
};
use super::{thread_title, DocumentStore};
use crate::auth::Session;
use crate::codec::{decode_from_transport, encode_for_transport};
use crate::config::Config;
use crate::errors::AppError;
use crate::models::{DiscussionThread, Message, RemoteFile, Revision};

/// Items requested per page from list endpoints.
const PAGE_SIZE: usize = 100;
/// Hard stop for paginated listings.
const MAX_PAGES: usize = 10;

const USER_AGENT: &str = concat!("dochub/", env!("CARGO_PKG_VERSION"));

/// Repository client for one repository and branch.
///
/// Holds no document state of its own: every call is a fresh round trip
/// carrying the credential the [`Session`] holds at call time.
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: Url,
    owner: String,
    repo: String,
    branch: String,
    discussion_label: String,
    session: Arc<Session>,
}

impl GitHubClient {
    pub fn new(config: &Config, session: Arc<Session>) -> Result<Self, AppError> {
        let api_base = Url::parse(&config.api_base)
            .map_err(|e| AppError::Config(format!("Invalid API base URL: {}", e)))?;
        if api_base.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "API base URL cannot carry paths: {}",
                config.api_base
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base,
            owner: config.repo_owner.clone(),
            repo: config.repo_name.clone(),
            branch: config.branch.clone(),
            discussion_label: config.discussion_label.clone(),
            session,
        })
    }

    fn token(&self) -> Result<String, AppError> {
        self.session.token().ok_or_else(AppError::not_authenticated)
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn repo_endpoint<'a>(&'a self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        self.endpoint(
            ["repos", self.owner.as_str(), self.repo.as_str()]
                .into_iter()
                .chain(segments),
        )
    }

    fn contents_url(&self, path: &str) -> Result<Url, AppError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(AppError::Validation("Path must not be empty".to_string()));
        }
        Ok(self.repo_endpoint(std::iter::once("contents").chain(segments)))
    }

    async fn fetch_contents(
        &self,
        token: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<ContentResponse>, AppError> {
        let url = self.contents_url(path)?;
        tracing::debug!(path, git_ref, "GET contents");

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[("ref", git_ref)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(response, path).await?;
        Ok(Some(response.json().await?))
    }

    async fn put_contents(
        &self,
        token: &str,
        path: &str,
        request: &WriteContentRequest<'_>,
    ) -> Result<String, AppError> {
        let url = self.contents_url(path)?;
        tracing::debug!(path, update = request.sha.is_some(), "PUT contents");

        let response = self
            .http
            .put(url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;

        let response = ensure_write_success(response, path).await?;
        let written: WriteContentResponse = response.json().await?;
        Ok(written.content.sha)
    }

    /// GET every page of a list endpoint.
    async fn get_paginated<T>(
        &self,
        token: &str,
        url: Url,
        query: &[(&str, &str)],
        context: &str,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        let mut items = Vec::new();
        let per_page = PAGE_SIZE.to_string();

        for page in 1..=MAX_PAGES {
            let page = page.to_string();
            let response = self
                .http
                .get(url.clone())
                .bearer_auth(token)
                .query(query)
                .query(&[("per_page", per_page.as_str()), ("page", page.as_str())])
                .send()
                .await?;

            let response = ensure_success(response, context).await?;
            let batch: Vec<T> = response.json().await?;
            let last_page = batch.len() < PAGE_SIZE;
            items.extend(batch);
            if last_page {
                return Ok(items);
            }
        }

        tracing::warn!("Listing for {} truncated after {} pages", context, MAX_PAGES);
        Ok(items)
    }
}

#[async_trait]
impl DocumentStore for GitHubClient {
    async fn validate_credential(&self) -> Result<bool, AppError> {
        let Some(token) = self.session.token() else {
            return Ok(false);
        };

        let response = self
            .http
            .get(self.endpoint(["user"]))
            .bearer_auth(token)
            .send()
            .await?;

        let valid = response.status().is_success();
        if !valid {
            tracing::warn!("Credential rejected by remote: {}", response.status());
        }
        Ok(valid)
    }

    async fn read_file(&self, path: &str) -> Result<Option<RemoteFile>, AppError> {
        let token = self.token()?;
        let Some(body) = self.fetch_contents(&token, path, &self.branch).await? else {
            return Ok(None);
        };

        let content = decode_content(&body)?;
        Ok(Some(RemoteFile {
            path: body.path,
            content,
            hash: body.sha,
        }))
    }

    async fn create_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<String, AppError> {
        let token = self.token()?;
        let request = WriteContentRequest {
            message,
            content: encode_for_transport(content),
            branch: &self.branch,
            sha: None,
        };
        let hash = self.put_contents(&token, path, &request).await?;
        tracing::info!("Created {}", path);
        Ok(hash)
    }

    async fn update_file(
        &self,
        path: &str,
        content: &str,
        hash: &str,
        message: &str,
    ) -> Result<String, AppError> {
        let token = self.token()?;
        if hash.trim().is_empty() {
            return Err(AppError::Validation(
                "A content hash is required to update a file".to_string(),
            ));
        }

        let request = WriteContentRequest {
            message,
            content: encode_for_transport(content),
            branch: &self.branch,
            sha: Some(hash),
        };
        let new_hash = self.put_contents(&token, path, &request).await?;
        tracing::info!("Updated {}", path);
        Ok(new_hash)
    }

    async fn delete_file(&self, path: &str, hash: &str, message: &str) -> Result<(), AppError> {
        let token = self.token()?;
        if hash.trim().is_empty() {
            return Err(AppError::Validation(
                "A content hash is required to delete a file".to_string(),
            ));
        }

        let url = self.contents_url(path)?;
        tracing::debug!(path, "DELETE contents");

        let response = self
            .http
            .delete(url)
            .bearer_auth(&token)
            .json(&DeleteContentRequest {
                message,
                sha: hash,
                branch: &self.branch,
            })
            .send()
            .await?;

        ensure_write_success(response, path).await?;
        tracing::info!("Deleted {}", path);
        Ok(())
    }

    async fn list_revisions(&self, path: &str) -> Result<Vec<Revision>, AppError> {
        let token = self.token()?;
        let url = self.repo_endpoint(["commits"]);
        tracing::debug!(path, "GET commits");

        let commits: Vec<CommitItem> = self
            .get_paginated(
                &token,
                url,
                &[("path", path), ("sha", self.branch.as_str())],
                path,
            )
            .await?;

        let mut revisions: Vec<Revision> =
            commits.into_iter().map(CommitItem::into_revision).collect();
        // Newest commit first; stable, so equal commit times keep the remote's order.
        revisions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(revisions)
    }

    async fn read_file_at_revision(
        &self,
        path: &str,
        revision: &str,
    ) -> Result<String, AppError> {
        let token = self.token()?;
        if revision.trim().is_empty() {
            return Err(AppError::Validation("Revision must not be empty".to_string()));
        }

        match self.fetch_contents(&token, path, revision).await? {
            Some(body) => decode_content(&body),
            None => Err(AppError::NotFound(format!(
                "{} does not exist at revision {}",
                path, revision
            ))),
        }
    }

    async fn find_or_create_thread(
        &self,
        document_title: &str,
        document_path: Option<&str>,
    ) -> Result<DiscussionThread, AppError> {
        let token = self.token()?;
        if document_title.trim().is_empty() {
            return Err(AppError::Validation(
                "Document title must not be empty".to_string(),
            ));
        }

        let title = thread_title(document_title);
        let url = self.repo_endpoint(["issues"]);

        let issues: Vec<IssueItem> = self
            .get_paginated(
                &token,
                url.clone(),
                &[("labels", self.discussion_label.as_str()), ("state", "all")],
                &title,
            )
            .await?;

        // Oldest matching issue wins if a race ever produced duplicates.
        if let Some(existing) = issues
            .into_iter()
            .filter(|issue| issue.pull_request.is_none() && issue.title == title)
            .min_by_key(|issue| issue.number)
        {
            return Ok(existing.into_thread());
        }

        let body = match document_path {
            Some(path) => format!(
                "Discussion for **{}** (`{}`).",
                document_title.trim(),
                path
            ),
            None => format!("Discussion for **{}**.", document_title.trim()),
        };

        let response = self
            .http
            .post(url)
            .bearer_auth(&token)
            .json(&CreateIssueRequest {
                title: &title,
                body,
                labels: [self.discussion_label.as_str()],
            })
            .send()
            .await?;

        let response = ensure_success(response, &title).await?;
        let created: IssueItem = response.json().await?;
        tracing::info!("Opened discussion #{} for {}", created.number, document_title);
        Ok(created.into_thread())
    }

    async fn list_messages(&self, thread_id: u64) -> Result<Vec<Message>, AppError> {
        let token = self.token()?;
        let number = thread_id.to_string();
        let url = self.repo_endpoint(["issues", number.as_str(), "comments"]);

        let comments: Vec<CommentItem> = self
            .get_paginated(&token, url, &[], &format!("thread #{}", thread_id))
            .await?;

        let mut messages: Vec<Message> =
            comments.into_iter().map(CommentItem::into_message).collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn post_message(&self, thread_id: u64, body: &str) -> Result<(), AppError> {
        let token = self.token()?;
        if body.trim().is_empty() {
            return Err(AppError::Validation("Message must not be empty".to_string()));
        }

        let number = thread_id.to_string();
        let url = self.repo_endpoint(["issues", number.as_str(), "comments"]);

        let response = self
            .http
            .post(url)
            .bearer_auth(&token)
            .json(&CreateCommentRequest { body })
            .send()
            .await?;

        ensure_success(response, &format!("thread #{}", thread_id)).await?;
        Ok(())
    }
}

fn decode_content(body: &ContentResponse) -> Result<String, AppError> {
    match (body.encoding.as_deref(), body.content.as_deref()) {
        (Some("base64"), Some(content)) => decode_from_transport(content),
        (encoding, _) => Err(AppError::Decode(format!(
            "{} is not served inline (encoding: {})",
            body.path,
            encoding.unwrap_or("none")
        ))),
    }
}

/// Pass 2xx responses through; turn anything else into the matching error kind.
async fn ensure_success(response: Response, context: &str) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = remote_message(response).await;
    Err(classify(status, message, context))
}

/// Like [`ensure_success`], but a 422 about the content hash is a conflict:
/// that is how the remote rejects a create on an existing path.
async fn ensure_write_success(response: Response, path: &str) -> Result<Response, AppError> {
    let status = response.status();
    if status != StatusCode::UNPROCESSABLE_ENTITY {
        return ensure_success(response, path).await;
    }

    let message = remote_message(response).await;
    if message.contains("sha") {
        return Err(AppError::Conflict {
            message: format!("{} has changed or already exists: {}", path, message),
            path: path.to_string(),
        });
    }
    Err(classify(status, message, path))
}

fn classify(status: StatusCode, message: String, context: &str) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED => AppError::Unauthenticated(message),
        StatusCode::NOT_FOUND => AppError::NotFound(format!("{}: {}", context, message)),
        StatusCode::CONFLICT => AppError::Conflict {
            message: format!("{} has changed: {}", context, message),
            path: context.to_string(),
        },
        _ => AppError::RemoteFailure {
            status: status.as_u16(),
            message,
        },
    }
}

async fn remote_message(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if text.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                text
            }
        })
}
