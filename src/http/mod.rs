//! HTTP module
//!
//! Request building, transport, and the authenticated dispatcher.
//!
//! # Features
//!
//! - **Operations**: method, path, query, and JSON body for one API call
//! - **Transport**: pluggable; reqwest by default
//! - **Token refresh**: expired tokens are replaced and the call re-sent
//! - **Cancellation**: any call can be abandoned via a `CancellationToken`
//! - **Rate Limiting**: optional token bucket using governor

mod client;
mod envelope;
mod operation;
mod rate_limit;
mod request;
mod transport;

pub use client::{HttpClient, ACCESS_TOKEN_PARAM};
pub use envelope::{decode_payload, Envelope, ERRCODE_INVALID_TOKEN, ERRCODE_TOKEN_EXPIRED};
pub use operation::{Operation, PATH_GET_TOKEN};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use request::RequestBuilder;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
