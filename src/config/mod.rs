//! Configuration module for the documentation hub.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::AppError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for the local API (optional in development)
    pub api_psk: Option<String>,
    /// Credential injected at deploy time; wins over the persisted one
    pub github_token: Option<String>,
    /// Base URL of the remote content API
    pub api_base: String,
    /// Owner of the repository that stores the documents
    pub repo_owner: String,
    /// Name of the repository that stores the documents
    pub repo_name: String,
    /// Branch all reads and writes resolve against
    pub branch: String,
    /// Local directory holding the materialised document collection
    pub docs_dir: PathBuf,
    /// Remote path prefix of the document collection
    pub docs_prefix: String,
    /// File backing the persisted credential slot
    pub credential_path: PathBuf,
    /// Label attached to discussion threads
    pub discussion_label: String,
    /// Per-request timeout for remote calls
    pub http_timeout: Duration,
    /// Fuzzy search sensitivity in [0, 1]
    pub search_threshold: f32,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_psk = non_empty_var("DOCHUB_API_PSK");
        let github_token = non_empty_var("DOCHUB_GITHUB_TOKEN");

        let api_base = var_or("DOCHUB_API_BASE", "https://api.github.com")
            .trim_end_matches('/')
            .to_string();
        let repo_owner = var_or("DOCHUB_REPO_OWNER", "CherupallyPremkumar");
        let repo_name = var_or("DOCHUB_REPO_NAME", "homebase-documentation");
        let branch = var_or("DOCHUB_BRANCH", "main");

        let docs_dir = var_or("DOCHUB_DOCS_DIR", "./docs").into();
        let docs_prefix = var_or("DOCHUB_DOCS_PREFIX", "src/docs")
            .trim_matches('/')
            .to_string();
        let credential_path = var_or("DOCHUB_CREDENTIAL_PATH", "./data/credential").into();
        let discussion_label = var_or("DOCHUB_DISCUSSION_LABEL", "documentation-discussion");

        let timeout_secs: u64 = var_or("DOCHUB_HTTP_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|_| AppError::Config("Invalid DOCHUB_HTTP_TIMEOUT_SECS".to_string()))?;
        if timeout_secs == 0 {
            return Err(AppError::Config(
                "DOCHUB_HTTP_TIMEOUT_SECS must be positive".to_string(),
            ));
        }

        let search_threshold: f32 = var_or("DOCHUB_SEARCH_THRESHOLD", "0.3")
            .parse()
            .map_err(|_| AppError::Config("Invalid DOCHUB_SEARCH_THRESHOLD".to_string()))?;
        if !(0.0..=1.0).contains(&search_threshold) {
            return Err(AppError::Config(
                "DOCHUB_SEARCH_THRESHOLD must be within [0, 1]".to_string(),
            ));
        }

        let bind_addr = var_or("DOCHUB_BIND_ADDR", "127.0.0.1:8080")
            .parse()
            .map_err(|_| AppError::Config("Invalid DOCHUB_BIND_ADDR format".to_string()))?;

        let log_level = var_or("DOCHUB_LOG_LEVEL", "info");

        Ok(Self {
            api_psk,
            github_token,
            api_base,
            repo_owner,
            repo_name,
            branch,
            docs_dir,
            docs_prefix,
            credential_path,
            discussion_label,
            http_timeout: Duration::from_secs(timeout_secs),
            search_threshold,
            bind_addr,
            log_level,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
