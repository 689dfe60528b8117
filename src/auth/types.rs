//! Credential and identity types

use chrono::{DateTime, TimeDelta, Utc};

/// Cached access token with its server-declared expiry.
///
/// An empty `token` means no credential has been acquired yet (or it was
/// invalidated). `expires_at` is advisory: the authoritative expiry signal is
/// the error code in each API response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential {
    /// The access token
    pub token: String,
    /// When the server said the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Create a new credential
    pub fn new(token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Create a credential that expires in N seconds from now.
    ///
    /// An out-of-range `seconds` leaves the expiry unset.
    pub fn expires_in(token: impl Into<String>, seconds: i64) -> Self {
        let expires_at =
            TimeDelta::try_seconds(seconds).and_then(|delta| Utc::now().checked_add_signed(delta));
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Whether no token is cached
    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }

    /// Check if the token expires within `window` from now.
    ///
    /// A credential without a declared expiry never expires locally.
    pub fn expires_within(&self, window: std::time::Duration) -> bool {
        let Some(expires_at) = self.expires_at else {
            return false;
        };
        // A window too large to represent reaches past any expiry
        TimeDelta::from_std(window)
            .ok()
            .and_then(|window| Utc::now().checked_add_signed(window))
            .map_or(true, |horizon| horizon >= expires_at)
    }
}

/// The two static secrets exchanged for an access token
#[derive(Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// Enterprise identifier (`corpid`)
    pub enterprise_id: String,
    /// Application secret (`corpsecret`)
    pub agent_secret: String,
}

impl ClientIdentity {
    /// Create a new identity
    pub fn new(enterprise_id: impl Into<String>, agent_secret: impl Into<String>) -> Self {
        Self {
            enterprise_id: enterprise_id.into(),
            agent_secret: agent_secret.into(),
        }
    }
}

impl std::fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("enterprise_id", &self.enterprise_id)
            .field("agent_secret", &"<redacted>")
            .finish()
    }
}
