//! Error types for the WeCom client
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for the WeCom client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {message}")]
    Transport { message: String },

    // ============================================================================
    // Response Errors
    // ============================================================================
    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("API error {errcode}: {errmsg}")]
    Api { errcode: i64, errmsg: String },

    // ============================================================================
    // Credential Errors
    // ============================================================================
    #[error("Access token acquisition failed: {message}")]
    AcquisitionFailed {
        message: String,
        errcode: Option<i64>,
    },

    #[error("Access token still rejected after {attempts} attempts (errcode {errcode}: {errmsg})")]
    CredentialRefreshExhausted {
        attempts: u32,
        errcode: i64,
        errmsg: String,
    },

    // ============================================================================
    // Control Flow
    // ============================================================================
    #[error("Operation cancelled")]
    Cancelled,

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create a transport error from a message
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an acquisition error without an upstream error code
    pub fn acquisition(message: impl Into<String>) -> Self {
        Self::AcquisitionFailed {
            message: message.into(),
            errcode: None,
        }
    }

    /// Create an API error from an envelope's code and message
    pub fn api(errcode: i64, errmsg: impl Into<String>) -> Self {
        Self::Api {
            errcode,
            errmsg: errmsg.into(),
        }
    }

    /// Whether this error came from the network rather than the API.
    ///
    /// Failed token exchanges count as transport failures for callers.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::Transport { .. } | Error::AcquisitionFailed { .. }
        )
    }

    /// The upstream error code carried by this error, if any
    pub fn errcode(&self) -> Option<i64> {
        match self {
            Error::Api { errcode, .. } | Error::CredentialRefreshExhausted { errcode, .. } => {
                Some(*errcode)
            }
            Error::AcquisitionFailed { errcode, .. } => *errcode,
            _ => None,
        }
    }
}

/// Result type alias for the WeCom client
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }
}
