//! Logical request descriptors

use crate::error::{Error, Result};
use crate::types::Method;
use serde_json::Value;

/// Path of the access token exchange endpoint
pub const PATH_GET_TOKEN: &str = "/cgi-bin/gettoken";

/// One API call: method, path, query, and optional JSON body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Operation {
    /// HTTP method
    pub method: Method,
    /// Path relative to the base URL (e.g. `/cgi-bin/user/get`)
    pub path: String,
    /// Query parameters in order
    pub query: Vec<(String, String)>,
    /// Request body (JSON)
    pub body: Option<Value>,
}

impl Operation {
    /// Create an operation
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Create a GET operation
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Create a POST operation
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add parameters from a raw query string such as `"userid=zhangsan&a=b"`.
    ///
    /// Values are percent-decoded.
    pub fn raw_query(mut self, query: &str) -> Result<Self> {
        let query = query.trim_start_matches('?');
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if key.is_empty() {
                return Err(Error::config(format!("invalid query string: {query:?}")));
            }
            self.query.push((key.into_owned(), value.into_owned()));
        }
        Ok(self)
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` as the JSON body
    pub fn json_from<T: serde::Serialize>(self, body: &T) -> Result<Self> {
        Ok(self.json(serde_json::to_value(body)?))
    }

    /// Path with a single leading slash
    pub fn normalized_path(&self) -> String {
        format!("/{}", self.path.trim_start_matches('/'))
    }

    /// Whether this is the token exchange itself (never carries a token)
    pub fn is_token_exchange(&self) -> bool {
        self.normalized_path() == PATH_GET_TOKEN
    }
}
