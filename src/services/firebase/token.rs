use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Decoded Firebase ID token.
///
/// Only `sub` matters to the middleware; the rest is carried through to
/// handlers as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedToken {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default)]
    pub auth_time: i64,
    #[serde(default)]
    pub firebase: FirebaseInfo,

    // Custom claims and anything else the provider adds (email, name, ...).
    #[serde(flatten)]
    pub claims: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirebaseInfo {
    #[serde(default)]
    pub sign_in_provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(default)]
    pub identities: HashMap<String, serde_json::Value>,
}

impl VerifiedToken {
    pub fn uid(&self) -> &str {
        &self.sub
    }

    /// First e-mail address linked to the account, if any.
    pub fn email(&self) -> Option<&str> {
        self.firebase
            .identities
            .get("email")?
            .as_array()?
            .first()?
            .as_str()
    }
}
