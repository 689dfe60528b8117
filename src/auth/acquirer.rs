//! Token exchange
//!
//! Trades the enterprise id and application secret for an access token.
//! Each call issues exactly one request; retrying is the dispatcher's job.

use super::store::CredentialStore;
use super::types::{ClientIdentity, Credential};
use crate::error::{Error, Result};
use crate::http::{Operation, RequestBuilder, Transport, PATH_GET_TOKEN};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Performs the `gettoken` exchange and populates the credential store
pub struct CredentialAcquirer {
    identity: ClientIdentity,
    requests: RequestBuilder,
    transport: Arc<dyn Transport>,
    store: Arc<CredentialStore>,
}

impl CredentialAcquirer {
    /// Create an acquirer writing into `store`
    pub fn new(
        identity: ClientIdentity,
        requests: RequestBuilder,
        transport: Arc<dyn Transport>,
        store: Arc<CredentialStore>,
    ) -> Self {
        Self {
            identity,
            requests,
            transport,
            store,
        }
    }

    /// Fetch a fresh access token and cache it
    pub async fn acquire(&self) -> Result<Credential> {
        let operation = Operation::get(PATH_GET_TOKEN)
            .query("corpid", &self.identity.enterprise_id)
            .query("corpsecret", &self.identity.agent_secret);
        let request = self.requests.build(&operation)?;

        debug!(
            enterprise_id = %self.identity.enterprise_id,
            "Requesting access token"
        );

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| Error::acquisition(format!("token request failed: {e}")))?;

        let token_response: TokenResponse = serde_json::from_slice(&response.body)
            .map_err(|e| Error::acquisition(format!("invalid token response: {e}")))?;

        let credential = token_response.into_credential()?;
        self.store.write(credential.clone()).await;

        info!(
            expires_at = ?credential.expires_at,
            "Access token acquired"
        );
        Ok(credential)
    }

    /// The identity this acquirer exchanges
    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }
}

impl std::fmt::Debug for CredentialAcquirer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialAcquirer")
            .field("identity", &self.identity)
            .field("requests", &self.requests)
            .finish_non_exhaustive()
    }
}

/// `gettoken` response body
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_credential(self) -> Result<Credential> {
        if self.errcode != 0 {
            return Err(Error::AcquisitionFailed {
                message: format!("token endpoint returned {}: {}", self.errcode, self.errmsg),
                errcode: Some(self.errcode),
            });
        }
        if self.access_token.is_empty() {
            return Err(Error::acquisition("token endpoint returned no access_token"));
        }

        Ok(match self.expires_in {
            Some(secs) => Credential::expires_in(self.access_token, secs),
            None => Credential::new(self.access_token, None),
        })
    }
}
