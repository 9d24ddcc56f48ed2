use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Bearer session token obtained from the vendor login exchange.
///
/// The vendor auth protocol is treated as an opaque collaborator: credentials
/// go in, a short-lived bearer token comes out. The token is persisted to
/// disk by `SessionStore` and reloaded on later runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionToken {
    pub token_type: String,
    pub access_token: String,
    #[serde(default)]
    pub expires_at: i64,
    /// Opaque display identifier resolved at login time, when the vendor
    /// returns one alongside the token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl SessionToken {
    /// Check if the access token has expired
    pub fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp();
        self.expires_at < now
    }

    /// Returns the Authorization header value
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}
