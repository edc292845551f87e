//! Search API endpoints.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::{error, success, ApiResult};
use crate::search::SearchHit;
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query string.
    #[serde(default)]
    pub q: String,
    /// Maximum number of results (default: 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

/// Ranked results for one query.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub total: usize,
    pub limit: usize,
}

/// Maximum number of search results allowed.
const MAX_SEARCH_LIMIT: usize = 100;

/// GET /api/search - Fuzzy search over the catalog.
pub async fn search_documents(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let generation = state.search.generation();
    let limit = params.limit.min(MAX_SEARCH_LIMIT);

    match state.search.search(&params.q, limit) {
        Ok(results) => {
            let total = results.len();
            success(
                SearchResponse {
                    query: params.q,
                    results,
                    total,
                    limit,
                },
                generation,
            )
        }
        Err(e) => error(e, generation),
    }
}
