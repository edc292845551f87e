//! Catalog API endpoints.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::{error, resync, success, ApiResult};
use crate::catalog::CategorySummary;
use crate::errors::AppError;
use crate::models::{Category, DocumentItem};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub documents: usize,
}

/// GET /api/categories - Categories with document counts.
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<CategorySummary>> {
    let generation = state.search.generation();
    success(state.search.catalog().summaries(), generation)
}

/// GET /api/catalog - The ordered catalog, optionally for one category.
pub async fn list_catalog(
    State(state): State<AppState>,
    Query(params): Query<CatalogQuery>,
) -> ApiResult<Vec<DocumentItem>> {
    let generation = state.search.generation();
    let catalog = state.search.catalog();

    match params.category.as_deref() {
        None => success(catalog.documents().to_vec(), generation),
        Some(slug) => match Category::from_slug(slug) {
            Some(category) => success(catalog.in_category(category).cloned().collect(), generation),
            None => error(
                AppError::Validation(format!("Unknown category: {}", slug)),
                generation,
            ),
        },
    }
}

/// POST /api/catalog/refresh - Reload the collection and rebuild the index.
pub async fn refresh_catalog(State(state): State<AppState>) -> ApiResult<RefreshResponse> {
    match resync(&state, None).await {
        Ok(generation) => success(
            RefreshResponse {
                documents: state.search.catalog().len(),
            },
            generation,
        ),
        Err(e) => error(e, state.search.generation()),
    }
}
