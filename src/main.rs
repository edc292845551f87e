//! DocHub backend
//!
//! Serves a Git-backed documentation hub: catalog, fuzzy search, editing,
//! history, discussions and the habit tracker.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dochub::auth::{FileCredentialStore, Session};
use dochub::catalog::{load_collection, Catalog};
use dochub::config::Config;
use dochub::github::GitHubClient;
use dochub::search::SearchIndex;
use dochub::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting DocHub");
    tracing::info!(
        "Repository: {}/{} @ {}",
        config.repo_owner,
        config.repo_name,
        config.branch
    );
    tracing::info!("Document collection: {:?}", config.docs_dir);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (DOCHUB_API_PSK). Authentication is disabled!");
    }

    // Resolve the remote credential
    let credential_store = Arc::new(FileCredentialStore::new(&config.credential_path));
    let session = Arc::new(Session::resolve(config.github_token.clone(), credential_store).await?);

    let client = Arc::new(GitHubClient::new(&config, session.clone())?);

    // Build the catalog and search index
    tracing::info!("Building search index...");
    let search = Arc::new(SearchIndex::new(config.search_threshold)?);
    let entries = load_collection(&config.docs_dir)?;
    search.rebuild(Catalog::build(&entries))?;

    let bind_addr = config.bind_addr;
    let state = AppState::new(Arc::new(config), client, session, search);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
