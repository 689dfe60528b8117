//! Authenticated dispatcher
//!
//! `HttpClient` sends operations with the cached access token attached and
//! hides token expiry from callers:
//! - the token is fetched on first use and cached
//! - a response whose envelope says the token was rejected invalidates the
//!   cache, and the call is re-sent with a fresh token
//! - after `max_attempts` rejected sends the call fails with
//!   `CredentialRefreshExhausted`
//! - transport and decode failures are returned immediately

use super::envelope::{decode_payload, Envelope};
use super::operation::Operation;
use super::rate_limit::RateLimiter;
use super::request::RequestBuilder;
use super::transport::{HttpRequest, ReqwestTransport, Transport};
use crate::auth::{Authenticator, Credential, CredentialAcquirer, CredentialStore};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Query parameter carrying the access token
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// WeCom API client with transparent access token refresh
pub struct HttpClient {
    config: ClientConfig,
    requests: RequestBuilder,
    transport: Arc<dyn Transport>,
    authenticator: Authenticator,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a client using the default reqwest transport
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout(), &config.user_agent)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client sending through `transport`
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let requests = RequestBuilder::new(config.parsed_base_url()?);
        let store = Arc::new(CredentialStore::new());
        let acquirer = CredentialAcquirer::new(
            config.identity(),
            requests.clone(),
            Arc::clone(&transport),
            Arc::clone(&store),
        );
        let authenticator = Authenticator::new(store, acquirer, config.refresh_ahead());
        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            config,
            requests,
            transport,
            authenticator,
            rate_limiter,
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Execute an operation and decode its payload
    pub async fn execute<T: DeserializeOwned>(&self, operation: Operation) -> Result<T> {
        let body = self.dispatch(&operation).await?;
        decode_payload(&body)
    }

    /// Execute an operation, giving up with `Error::Cancelled` once `cancel` fires
    pub async fn execute_with_cancel<T: DeserializeOwned>(
        &self,
        operation: Operation,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let body = self.execute_raw_with_cancel(operation, cancel).await?;
        decode_payload(&body)
    }

    /// Execute an operation and return the accepted response body
    pub async fn execute_raw(&self, operation: Operation) -> Result<Bytes> {
        self.dispatch(&operation).await
    }

    /// Cancellable variant of `execute_raw`
    pub async fn execute_raw_with_cancel(
        &self,
        operation: Operation,
        cancel: &CancellationToken,
    ) -> Result<Bytes> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(path = %operation.path, "Request cancelled");
                Err(Error::Cancelled)
            }
            result = self.dispatch(&operation) => result,
        }
    }

    /// Force a token exchange and cache the result
    pub async fn refresh_access_token(&self) -> Result<Credential> {
        self.authenticator.refresh().await
    }

    /// Snapshot of the cached credential (empty before the first exchange)
    pub async fn credential(&self) -> Credential {
        self.authenticator.credential().await
    }

    /// Seed the cache with a previously obtained credential
    pub async fn set_credential(&self, credential: Credential) {
        self.authenticator.set_credential(credential).await;
    }

    /// Drop the cached credential so the next call re-acquires
    pub async fn clear_credential(&self) {
        self.authenticator.clear_cache().await;
    }

    /// Send `operation`, refreshing the token while the server rejects it
    async fn dispatch(&self, operation: &Operation) -> Result<Bytes> {
        let authenticated = !operation.is_token_exchange();
        let max_attempts = self.config.max_attempts.max(1);
        let mut rejected: Option<Envelope> = None;

        for attempt in 1..=max_attempts {
            let mut request = self.requests.build(operation)?;

            let token = if authenticated {
                match self.authenticator.access_token().await {
                    Ok(token) => {
                        request.set_query_param(ACCESS_TOKEN_PARAM, &token);
                        Some(token)
                    }
                    // Nothing was sent yet, so the caller sees the acquisition failure
                    Err(e) if rejected.is_none() => return Err(e),
                    Err(e) => {
                        warn!(
                            attempt,
                            max_attempts,
                            error = %e,
                            "Access token refresh failed"
                        );
                        continue;
                    }
                }
            } else {
                None
            };

            let body = self.send(request, attempt).await?;
            let envelope = Envelope::decode(&body)?;

            if !authenticated || !envelope.is_credential_expired() {
                return Ok(body);
            }

            warn!(
                attempt,
                max_attempts,
                errcode = envelope.errcode,
                errmsg = %envelope.errmsg,
                path = %operation.path,
                "Access token rejected"
            );

            if let Some(token) = &token {
                self.authenticator.invalidate(token).await;
            }
            rejected = Some(envelope);

            if attempt < max_attempts {
                let delay = self.calculate_backoff(attempt - 1);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        let last = rejected.unwrap_or_default();
        Err(Error::CredentialRefreshExhausted {
            attempts: max_attempts,
            errcode: last.errcode,
            errmsg: last.errmsg,
        })
    }

    async fn send(&self, request: HttpRequest, attempt: u32) -> Result<Bytes> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        debug!(
            method = %request.method,
            path = request.url.path(),
            attempt,
            "Sending request"
        );
        if self.config.print_payload {
            if let Some(body) = &request.body {
                debug!(payload = %String::from_utf8_lossy(body), "Request payload");
            }
        }

        let response = self.transport.send(request).await?;

        if !response.is_success() {
            warn!(status = response.status, "Unexpected HTTP status");
        }
        if self.config.print_payload {
            debug!(payload = %String::from_utf8_lossy(&response.body), "Response payload");
        }

        Ok(response.body)
    }

    /// Calculate backoff delay before retry number `attempt` (zero-based)
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        self.config.backoff.delay(attempt)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "enterprise: {}", self.config.enterprise_id)?;
        writeln!(f, "api host: {}", self.requests.base_url())
    }
}
