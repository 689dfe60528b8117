//! Response envelope
//!
//! Every WeCom response body carries `errcode` and `errmsg`. The dispatcher
//! decodes just these two fields to detect a rejected access token; the
//! business payload is decoded separately from the same bytes.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// `access_token` has expired
pub const ERRCODE_TOKEN_EXPIRED: i64 = 42001;

/// `access_token` is not valid
pub const ERRCODE_INVALID_TOKEN: i64 = 40014;

/// The `{errcode, errmsg}` pair present in every response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Zero on success
    #[serde(default)]
    pub errcode: i64,
    /// Human-readable status
    #[serde(default)]
    pub errmsg: String,
}

impl Envelope {
    /// Create an envelope
    pub fn new(errcode: i64, errmsg: impl Into<String>) -> Self {
        Self {
            errcode,
            errmsg: errmsg.into(),
        }
    }

    /// Decode the envelope from a response body
    pub fn decode(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body)
            .map_err(|e| Error::decode(format!("invalid response envelope: {e}")))
    }

    /// Whether the call succeeded
    pub fn is_ok(&self) -> bool {
        self.errcode == 0
    }

    /// Whether the server rejected the access token.
    ///
    /// Besides the two well-known codes, the server sometimes reports a bad
    /// token under unrelated codes, so a message mentioning both "invalid"
    /// and "token" counts too.
    pub fn is_credential_expired(&self) -> bool {
        if matches!(self.errcode, ERRCODE_TOKEN_EXPIRED | ERRCODE_INVALID_TOKEN) {
            return true;
        }
        self.errmsg.contains("invalid") && self.errmsg.contains("token")
    }

    /// Convert a non-zero errcode into `Error::Api`
    pub fn into_result(self) -> Result<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(Error::Api {
                errcode: self.errcode,
                errmsg: self.errmsg,
            })
        }
    }
}

/// Decode a business payload from a response body
pub fn decode_payload<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| Error::decode(format!("invalid response body: {e}")))
}
