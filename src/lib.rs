//! DocHub
//!
//! A documentation hub whose documents, history and discussions live in a
//! Git hosting provider, served to a local presentation layer over REST.

pub mod api;
pub mod auth;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod documents;
pub mod errors;
pub mod github;
pub mod habits;
pub mod models;
pub mod search;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::Session;
use config::Config;
use documents::DocumentService;
use github::DocumentStore;
use habits::HabitTracker;
use search::SearchIndex;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub session: Arc<Session>,
    pub documents: Arc<DocumentService>,
    pub habits: Arc<HabitTracker>,
    pub search: Arc<SearchIndex>,
    pub config: Arc<Config>,
    /// Serializes mirror + reload + rebuild of the local collection.
    pub resync_lock: Arc<tokio::sync::Mutex<()>>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn DocumentStore>,
        session: Arc<Session>,
        search: Arc<SearchIndex>,
    ) -> Self {
        Self {
            documents: Arc::new(DocumentService::new(store.clone(), config.docs_prefix.clone())),
            habits: Arc::new(HabitTracker::new(store.clone(), config.docs_prefix.clone())),
            store,
            session,
            search,
            config,
            resync_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // API routes
    let api_routes = Router::new()
        // Catalog
        .route("/categories", get(api::list_categories))
        .route("/catalog", get(api::list_catalog))
        .route("/catalog/refresh", post(api::refresh_catalog))
        // Search
        .route("/search", get(api::search_documents))
        // Documents
        .route(
            "/documents",
            get(api::get_document)
                .post(api::create_document)
                .put(api::update_document)
                .delete(api::delete_document),
        )
        // History
        .route("/history", get(api::get_history))
        .route("/history/revision", get(api::get_revision))
        // Discussions
        .route("/discussions", get(api::get_discussion))
        .route("/discussions/{number}/messages", post(api::post_message))
        // Session
        .route(
            "/session",
            get(api::get_session).post(api::login).delete(api::logout),
        )
        // Habits
        .route(
            "/habits/{year}/{month}",
            get(api::get_habits).put(api::save_habits),
        )
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod test_support;
