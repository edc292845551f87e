//! Document API endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{error, resync, success, ApiResult};
use crate::codec::merge_metadata_and_body;
use crate::models::{
    CreateDocumentRequest, DeleteDocumentRequest, DocumentDraft, UpdateDocumentRequest,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    pub path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedDocument {
    pub path: String,
}

/// Mirror a written draft locally and rebuild; the remote write already succeeded.
async fn resync_draft(state: &AppState, draft: &DocumentDraft) -> u64 {
    let raw = match merge_metadata_and_body(&draft.body, &draft.metadata) {
        Ok(raw) => Some(raw),
        Err(e) => {
            tracing::warn!("Failed to render {} for the local mirror: {}", draft.path, e);
            None
        }
    };
    let change = raw.map(|raw| (draft.path.clone(), Some(raw)));
    resync_or_current(state, change).await
}

async fn resync_or_current(state: &AppState, change: Option<(String, Option<String>)>) -> u64 {
    match resync(state, change).await {
        Ok(generation) => generation,
        Err(e) => {
            tracing::warn!("Catalog resync failed: {}", e);
            state.search.generation()
        }
    }
}

/// GET /api/documents?path= - Open a document for editing.
pub async fn get_document(
    State(state): State<AppState>,
    Query(params): Query<DocumentQuery>,
) -> ApiResult<DocumentDraft> {
    let generation = state.search.generation();

    match state.documents.open(&params.path).await {
        Ok(draft) => success(draft, generation),
        Err(e) => error(e, generation),
    }
}

/// POST /api/documents - Create a document.
pub async fn create_document(
    State(state): State<AppState>,
    Json(request): Json<CreateDocumentRequest>,
) -> ApiResult<DocumentDraft> {
    let generation = state.search.generation();

    match state.documents.create(request).await {
        Ok(draft) => {
            let generation = resync_draft(&state, &draft).await;
            success(draft, generation)
        }
        Err(e) => error(e, generation),
    }
}

/// PUT /api/documents - Save a document against the hash it was opened with.
pub async fn update_document(
    State(state): State<AppState>,
    Json(request): Json<UpdateDocumentRequest>,
) -> ApiResult<DocumentDraft> {
    let generation = state.search.generation();

    match state.documents.save(request).await {
        Ok(draft) => {
            let generation = resync_draft(&state, &draft).await;
            success(draft, generation)
        }
        Err(e) => error(e, generation),
    }
}

/// DELETE /api/documents - Delete a document.
pub async fn delete_document(
    State(state): State<AppState>,
    Json(request): Json<DeleteDocumentRequest>,
) -> ApiResult<DeletedDocument> {
    let generation = state.search.generation();
    let path = request.path.trim().to_string();

    match state.documents.delete(request).await {
        Ok(()) => {
            let generation = resync_or_current(&state, Some((path.clone(), None))).await;
            success(DeletedDocument { path }, generation)
        }
        Err(e) => error(e, generation),
    }
}
