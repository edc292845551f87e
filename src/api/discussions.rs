//! Discussion API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{error, success, ApiResult};
use crate::models::{DiscussionView, Message, PostMessageRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DiscussionQuery {
    pub title: String,
    pub path: Option<String>,
}

/// GET /api/discussions?title=&path= - Find or open a document's thread, with messages.
pub async fn get_discussion(
    State(state): State<AppState>,
    Query(params): Query<DiscussionQuery>,
) -> ApiResult<DiscussionView> {
    let generation = state.search.generation();

    match state
        .documents
        .discussion(&params.title, params.path.as_deref())
        .await
    {
        Ok(view) => success(view, generation),
        Err(e) => error(e, generation),
    }
}

/// POST /api/discussions/{number}/messages - Post and return the thread's messages.
pub async fn post_message(
    State(state): State<AppState>,
    Path(number): Path<u64>,
    Json(request): Json<PostMessageRequest>,
) -> ApiResult<Vec<Message>> {
    let generation = state.search.generation();

    match state.documents.post_message(number, &request.body).await {
        Ok(messages) => success(messages, generation),
        Err(e) => error(e, generation),
    }
}
