//! Authenticator implementation
//!
//! Hands out the cached access token, acquiring one when the cache is empty.
//! Concurrent callers that find the cache empty share a single exchange.

use super::acquirer::CredentialAcquirer;
use super::store::CredentialStore;
use super::types::Credential;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Single-flight access token provider
#[derive(Debug)]
pub struct Authenticator {
    store: Arc<CredentialStore>,
    acquirer: CredentialAcquirer,
    /// Serializes token exchanges; separate from the store lock
    refresh_gate: Mutex<()>,
    /// Treat tokens expiring within this window as absent
    refresh_ahead: Option<Duration>,
}

impl Authenticator {
    /// Create an authenticator over `store`, which `acquirer` also writes to
    pub fn new(
        store: Arc<CredentialStore>,
        acquirer: CredentialAcquirer,
        refresh_ahead: Option<Duration>,
    ) -> Self {
        Self {
            store,
            acquirer,
            refresh_gate: Mutex::new(()),
            refresh_ahead,
        }
    }

    /// Get a usable token, acquiring one if none is cached
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let _gate = self.refresh_gate.lock().await;

        // Double-check after acquiring the gate (another task might have refreshed)
        if let Some(token) = self.cached_token().await {
            debug!("Access token refreshed by a concurrent request");
            return Ok(token);
        }

        let credential = self.acquirer.acquire().await?;
        Ok(credential.token)
    }

    /// Unconditionally exchange the secrets for a new token
    pub async fn refresh(&self) -> Result<Credential> {
        let _gate = self.refresh_gate.lock().await;
        self.acquirer.acquire().await
    }

    /// Drop `token` from the cache if it is still the current one
    pub async fn invalidate(&self, token: &str) {
        if self.store.invalidate_if(token).await {
            debug!("Cached access token invalidated");
        }
    }

    /// Cache a credential obtained elsewhere
    pub async fn set_credential(&self, credential: Credential) {
        self.store.write(credential).await;
    }

    /// Drop whatever token is cached
    pub async fn clear_cache(&self) {
        self.store.invalidate().await;
    }

    /// Snapshot of the cached credential
    pub async fn credential(&self) -> Credential {
        self.store.read().await
    }

    /// The acquirer backing this authenticator
    pub fn acquirer(&self) -> &CredentialAcquirer {
        &self.acquirer
    }

    async fn cached_token(&self) -> Option<String> {
        let credential = self.store.read().await;
        if credential.is_empty() {
            return None;
        }
        if let Some(window) = self.refresh_ahead {
            if credential.expires_within(window) {
                return None;
            }
        }
        Some(credential.token)
    }
}
