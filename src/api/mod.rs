//! REST API module.
//!
//! Handlers for the local HTTP surface the presentation layer talks to.

mod catalog;
mod discussions;
mod documents;
mod habits;
mod history;
mod search;
mod session;

pub use catalog::*;
pub use discussions::*;
pub use documents::*;
pub use habits::*;
pub use history::*;
pub use search::*;
pub use session::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::catalog::{load_collection, store_entry, Catalog};
use crate::errors::{ApiError, AppError};
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub generation: u64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, generation: u64) -> Self {
        Self {
            success: true,
            data,
            generation,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, generation: u64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, generation))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: AppError, generation: u64) -> ApiResult<T> {
    Err(ApiError {
        error: err,
        generation,
    })
}

/// Reload the local collection and rebuild the search index from it.
///
/// `change` is mirrored into the collection first: `(id, Some(raw))` writes
/// a document, `(id, None)` removes it. Resyncs run one at a time, so each
/// rebuild sees every change mirrored before it.
pub async fn resync(
    state: &AppState,
    change: Option<(String, Option<String>)>,
) -> Result<u64, AppError> {
    let _resyncing = state.resync_lock.lock().await;
    let dir = state.config.docs_dir.clone();
    let search = state.search.clone();

    tokio::task::spawn_blocking(move || {
        if let Some((id, raw)) = change {
            if let Err(e) = store_entry(&dir, &id, raw.as_deref()) {
                tracing::warn!("Failed to mirror {} locally: {}", id, e);
            }
        }
        let entries = load_collection(&dir)?;
        search.rebuild(Catalog::build(&entries))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Catalog rebuild task failed: {}", e)))?
}
