//! In-memory credential store
//!
//! Holds the one access token a client uses. The lock is only held to copy or
//! replace the value, never across network I/O.

use super::types::Credential;
use tokio::sync::RwLock;

/// Exclusive-access cache for the current credential
#[derive(Debug, Default)]
pub struct CredentialStore {
    current: RwLock<Credential>,
}

impl CredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the cached credential (possibly empty)
    pub async fn read(&self) -> Credential {
        self.current.read().await.clone()
    }

    /// Replace the cached credential
    pub async fn write(&self, credential: Credential) {
        *self.current.write().await = credential;
    }

    /// Clear the cached credential
    pub async fn invalidate(&self) {
        *self.current.write().await = Credential::default();
    }

    /// Clear the cached credential only if it still holds `token`.
    ///
    /// Returns whether the credential was cleared.
    pub async fn invalidate_if(&self, token: &str) -> bool {
        let mut current = self.current.write().await;
        if current.token == token {
            *current = Credential::default();
            true
        } else {
            false
        }
    }
}
