// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # WeCom Client
//!
//! An async client for the WeCom (企业微信) server API with transparent
//! access token management.
//!
//! ## Features
//!
//! - **Token caching**: the enterprise id and agent secret are exchanged for
//!   an access token once, then reused by every call
//! - **Expiry recovery**: a call rejected with an expired or invalid token is
//!   re-sent with a fresh token, up to a configurable attempt limit
//! - **Single-flight refresh**: concurrent callers share one token exchange
//! - **Address book**: members, invitations and departments
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wecom::{ClientConfig, HttpClient, Operation, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClientConfig::from_file("wecom.yaml")?.with_env();
//!     let client = HttpClient::new(config)?;
//!
//!     // Typed endpoint
//!     let member = client.address_book().get_member("zhangsan").await?;
//!
//!     // Any endpoint
//!     let raw: serde_json::Value = client
//!         .execute(Operation::get("/cgi-bin/department/list").query("id", "1"))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                AddressBook / CLI / callers               │
//! └──────────────────────────────┬───────────────────────────┘
//!                                │ Operation
//! ┌──────────────────────────────┴───────────────────────────┐
//! │  HttpClient: attach token → send → inspect envelope      │
//! │              expired? invalidate → refresh → resend      │
//! └──────┬───────────────────┬────────────────────┬──────────┘
//!        │                   │                    │
//! ┌──────┴──────┐  ┌─────────┴────────┐  ┌────────┴────────┐
//! │RequestBuilder│ │  Authenticator   │  │    Transport    │
//! │ base + path │  │ store + acquirer │  │ reqwest / test  │
//! └─────────────┘  └──────────────────┘  └─────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Common types and type aliases
pub mod types;

/// Access token storage and acquisition
pub mod auth;

/// Request building, dispatch and response envelopes
pub mod http;

/// Client configuration
pub mod config;

/// Address book endpoints
pub mod address_book;

/// Command-line interface
pub mod cli;

#[cfg(test)]
mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use address_book::AddressBook;
pub use auth::{ClientIdentity, Credential};
pub use config::ClientConfig;
pub use http::{Envelope, HttpClient, Operation};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
