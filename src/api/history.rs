//! Version history API endpoints.

use axum::extract::{Query, State};
use serde::Deserialize;

use super::{error, success, ApiResult};
use crate::models::{Revision, RevisionSnapshot};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct RevisionQuery {
    pub path: String,
    pub revision: String,
}

/// GET /api/history?path= - Revisions of a document, newest first.
pub async fn get_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> ApiResult<Vec<Revision>> {
    let generation = state.search.generation();

    match state.documents.history(&params.path).await {
        Ok(revisions) => success(revisions, generation),
        Err(e) => error(e, generation),
    }
}

/// GET /api/history/revision?path=&revision= - A document as of one revision.
pub async fn get_revision(
    State(state): State<AppState>,
    Query(params): Query<RevisionQuery>,
) -> ApiResult<RevisionSnapshot> {
    let generation = state.search.generation();

    match state.documents.snapshot(&params.path, &params.revision).await {
        Ok(snapshot) => success(snapshot, generation),
        Err(e) => error(e, generation),
    }
}
