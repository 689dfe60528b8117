//! Authentication module
//!
//! WeCom authenticates every business call with a short-lived `access_token`
//! obtained by exchanging the enterprise id and application secret.
//!
//! - `CredentialStore` caches the current token
//! - `CredentialAcquirer` performs the exchange
//! - `Authenticator` hands out tokens and de-duplicates concurrent exchanges

mod acquirer;
mod authenticator;
mod store;
mod types;

pub use acquirer::CredentialAcquirer;
pub use authenticator::Authenticator;
pub use store::CredentialStore;
pub use types::{ClientIdentity, Credential};
