//! Request builder
//!
//! Turns an `Operation` into an `HttpRequest` against the base URL. Knows
//! nothing about access tokens.

use super::operation::Operation;
use super::transport::HttpRequest;
use crate::error::Result;
use bytes::Bytes;
use url::Url;

/// Resolves operations against a fixed base URL
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: Url,
}

impl RequestBuilder {
    /// Create a builder for `base_url`
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    /// The base URL all paths are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the outbound request for `operation`
    pub fn build(&self, operation: &Operation) -> Result<HttpRequest> {
        let url = self.build_url(operation);

        let mut headers = Vec::new();
        let body = match &operation.body {
            Some(value) => {
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
                Some(Bytes::from(serde_json::to_vec(value)?))
            }
            None => None,
        };

        Ok(HttpRequest {
            method: operation.method,
            url,
            headers,
            body,
        })
    }

    /// Join the base path and the operation path, then append the query
    fn build_url(&self, operation: &Operation) -> Url {
        let mut url = self.base_url.clone();

        let base = self.base_url.path().trim_end_matches('/');
        let path = operation.path.trim_start_matches('/');
        url.set_path(&format!("{base}/{path}"));
        url.set_query(None);

        if !operation.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&operation.query);
        }

        url
    }
}
