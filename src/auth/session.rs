//! Session state: the credential currently held by the process.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use tokio::sync::Mutex;

use super::store::CredentialStore;
use crate::errors::AppError;
use crate::github::DocumentStore;

/// Where the held credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    /// Supplied by the deployment environment
    Injected,
    /// Read from, or written to, the persisted slot
    Persisted,
}

/// An opaque bearer token.
#[derive(Clone)]
pub struct Credential {
    token: String,
    source: CredentialSource,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Snapshot of the session exposed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<CredentialSource>,
}

/// The held credential and the persisted slot at one point in time.
pub struct SessionCheckpoint {
    credential: Option<Credential>,
    persisted: Option<String>,
}

impl fmt::Debug for SessionCheckpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCheckpoint")
            .field("credential", &self.credential)
            .field("persisted", &self.persisted.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Holds the current credential and its persisted copy.
pub struct Session {
    credential: RwLock<Option<Credential>>,
    store: Arc<dyn CredentialStore>,
    // Serializes set/clear so memory and the slot never disagree.
    update_lock: Mutex<()>,
}

impl Session {
    /// Resolve the startup credential: injected value, else persisted value, else none.
    pub async fn resolve(
        injected: Option<String>,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, AppError> {
        let injected = injected
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let credential = match injected {
            Some(token) => Some(Credential {
                token,
                source: CredentialSource::Injected,
            }),
            None => store.load().await?.map(|token| Credential {
                token,
                source: CredentialSource::Persisted,
            }),
        };

        match &credential {
            Some(c) => tracing::info!("Credential resolved from {:?} source", c.source),
            None => tracing::info!("No credential available; read-only until login"),
        }

        Ok(Self {
            credential: RwLock::new(credential),
            store,
            update_lock: Mutex::new(()),
        })
    }

    /// True iff a credential is held, whether or not it has been validated.
    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// Token of the held credential.
    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|c| c.token.clone())
    }

    pub fn status(&self) -> SessionStatus {
        let guard = self.read();
        SessionStatus {
            authenticated: guard.is_some(),
            source: guard.as_ref().map(|c| c.source),
        }
    }

    /// Replace the held credential and its persisted copy.
    pub async fn set_credential(&self, token: &str) -> Result<(), AppError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::Validation("Token must not be empty".to_string()));
        }

        let _guard = self.update_lock.lock().await;
        self.store.save(token).await?;
        *self.write() = Some(Credential {
            token: token.to_string(),
            source: CredentialSource::Persisted,
        });
        Ok(())
    }

    /// Drop the held credential and its persisted copy.
    pub async fn clear_credential(&self) -> Result<(), AppError> {
        let _guard = self.update_lock.lock().await;
        self.store.clear().await?;
        *self.write() = None;
        Ok(())
    }

    /// Capture the held credential and the persisted slot.
    pub async fn checkpoint(&self) -> Result<SessionCheckpoint, AppError> {
        let _guard = self.update_lock.lock().await;
        let credential = self.read().clone();
        let persisted = self.store.load().await?;
        Ok(SessionCheckpoint {
            credential,
            persisted,
        })
    }

    /// Put memory and the persisted slot back to a checkpoint.
    pub async fn restore(&self, checkpoint: SessionCheckpoint) -> Result<(), AppError> {
        let _guard = self.update_lock.lock().await;
        match checkpoint.persisted.as_deref() {
            Some(token) => self.store.save(token).await?,
            None => self.store.clear().await?,
        }
        *self.write() = checkpoint.credential;
        Ok(())
    }

    /// One round trip to the remote identity endpoint.
    ///
    /// `Ok(false)` for a missing or rejected credential; `Err` only when no
    /// response was received.
    pub async fn validate(&self, remote: &dyn DocumentStore) -> Result<bool, AppError> {
        if !self.is_authenticated() {
            return Ok(false);
        }
        remote.validate_credential().await
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Credential>> {
        self.credential.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Credential>> {
        self.credential.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::FileCredentialStore;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> Arc<dyn CredentialStore> {
        Arc::new(FileCredentialStore::new(dir.path().join("credential")))
    }

    #[tokio::test]
    async fn test_injected_credential_wins() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.save("persisted-token").await.unwrap();

        let session = Session::resolve(Some("injected-token".into()), store)
            .await
            .unwrap();

        assert_eq!(session.token().as_deref(), Some("injected-token"));
        assert_eq!(session.status().source, Some(CredentialSource::Injected));
    }

    #[tokio::test]
    async fn test_falls_back_to_persisted_then_absent() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        let session = Session::resolve(Some("  ".into()), store.clone()).await.unwrap();
        assert!(!session.is_authenticated());

        store.save("persisted-token").await.unwrap();
        let session = Session::resolve(None, store).await.unwrap();
        assert_eq!(session.token().as_deref(), Some("persisted-token"));
        assert_eq!(session.status().source, Some(CredentialSource::Persisted));
    }

    #[tokio::test]
    async fn test_set_and_clear_update_memory_and_slot() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let session = Session::resolve(None, store.clone()).await.unwrap();

        session.set_credential(" new-token ").await.unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.token().as_deref(), Some("new-token"));
        assert_eq!(store.load().await.unwrap().as_deref(), Some("new-token"));

        session.clear_credential().await.unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blank_token_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let session = Session::resolve(None, store_in(&temp_dir)).await.unwrap();

        let err = session.set_credential("   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_restore_brings_back_injected_credential() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.save("older-persisted").await.unwrap();
        let session = Session::resolve(Some("injected-token".into()), store.clone())
            .await
            .unwrap();

        let checkpoint = session.checkpoint().await.unwrap();
        session.set_credential("replacement").await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("replacement"));

        session.restore(checkpoint).await.unwrap();
        assert_eq!(session.token().as_deref(), Some("injected-token"));
        assert_eq!(session.status().source, Some(CredentialSource::Injected));
        assert_eq!(store.load().await.unwrap().as_deref(), Some("older-persisted"));
    }

    #[tokio::test]
    async fn test_restore_to_empty_clears_slot() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let session = Session::resolve(None, store.clone()).await.unwrap();

        let checkpoint = session.checkpoint().await.unwrap();
        session.set_credential("replacement").await.unwrap();
        session.restore(checkpoint).await.unwrap();

        assert!(!session.is_authenticated());
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[test]
    fn test_debug_redacts_token() {
        let credential = Credential {
            token: "ghp_supersecret".to_string(),
            source: CredentialSource::Persisted,
        };
        let printed = format!("{:?}", credential);
        assert!(!printed.contains("supersecret"));
        assert!(printed.contains("redacted"));
    }
}
