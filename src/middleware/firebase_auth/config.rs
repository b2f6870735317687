//! Configuration of the Firebase auth middleware.
//!
//! Defaults are plain constants; `FirebaseAuthConfig::default()` builds a fresh
//! value from them, so one instance can never alter another's defaults.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, header},
};

use crate::api::v1::extractors::auth_ctx::ContextKeys;

pub const DEFAULT_CONTEXT_ID_KEY: &str = "id-key";
pub const DEFAULT_CONTEXT_USER_KEY: &str = "user";
pub const DEFAULT_CONTEXT_USER_ID_KEY: &str = "userID";
pub const DEFAULT_TOKEN_LOOKUP: &str = "header:Authorization";
pub const DEFAULT_AUTH_SCHEME: &str = "Bearer";

/// Decides per request whether authentication is bypassed.
pub type Skipper = Arc<dyn Fn(&Request<Body>) -> bool + Send + Sync>;

/// Resolves roles for a user id (e-mail). An empty result rejects the request.
pub type RolesResolver = Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>;

/// Skips CORS preflight requests.
pub fn skip_preflight() -> Skipper {
    Arc::new(|req: &Request<Body>| req.method() == Method::OPTIONS)
}

/// Where to look for the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenLookup {
    Header(String),
    Query(String),
    Cookie(String),
}

impl TokenLookup {
    /// Parses `"<source>:<name>"`.
    ///
    /// Unknown sources fall back to a header of the given name; a string with
    /// no `:` falls back to the `Authorization` header.
    pub fn parse(raw: &str) -> Self {
        let Some((source, name)) = raw.split_once(':') else {
            return Self::Header(header::AUTHORIZATION.as_str().to_string());
        };

        let name = name.to_string();
        match source {
            "query" => Self::Query(name),
            "cookie" => Self::Cookie(name),
            _ => Self::Header(name),
        }
    }
}

#[derive(Clone)]
pub struct FirebaseAuthConfig {
    pub skipper: Option<Skipper>,

    // Context key names used when the auth context is published.
    pub context_id_key: String,
    pub context_user_key: String,
    pub context_user_id_key: String,

    /// `"<source>:<name>"`, one of `header:<name>`, `query:<name>`, `cookie:<name>`.
    pub token_lookup: String,
    pub auth_scheme: String,

    /// Service-account JSON. Consumed once at construction.
    pub credentials_json: Vec<u8>,

    pub roles: Option<RolesResolver>,
}

impl Default for FirebaseAuthConfig {
    fn default() -> Self {
        Self {
            skipper: None,
            context_id_key: DEFAULT_CONTEXT_ID_KEY.to_string(),
            context_user_key: DEFAULT_CONTEXT_USER_KEY.to_string(),
            context_user_id_key: DEFAULT_CONTEXT_USER_ID_KEY.to_string(),
            token_lookup: DEFAULT_TOKEN_LOOKUP.to_string(),
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            credentials_json: Vec::new(),
            roles: None,
        }
    }
}

impl std::fmt::Debug for FirebaseAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print credentials
        f.debug_struct("FirebaseAuthConfig")
            .field("skipper", &self.skipper.is_some())
            .field("context_id_key", &self.context_id_key)
            .field("context_user_key", &self.context_user_key)
            .field("context_user_id_key", &self.context_user_id_key)
            .field("token_lookup", &self.token_lookup)
            .field("auth_scheme", &self.auth_scheme)
            .field("roles", &self.roles.is_some())
            .finish()
    }
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

impl FirebaseAuthConfig {
    pub fn new(credentials_json: impl Into<Vec<u8>>) -> Self {
        Self {
            credentials_json: credentials_json.into(),
            ..Self::default()
        }
    }

    /// Replaces empty string fields with their defaults.
    pub fn with_defaults(self) -> Self {
        Self {
            context_id_key: or_default(self.context_id_key, DEFAULT_CONTEXT_ID_KEY),
            context_user_key: or_default(self.context_user_key, DEFAULT_CONTEXT_USER_KEY),
            context_user_id_key: or_default(
                self.context_user_id_key,
                DEFAULT_CONTEXT_USER_ID_KEY,
            ),
            token_lookup: or_default(self.token_lookup, DEFAULT_TOKEN_LOOKUP),
            auth_scheme: or_default(self.auth_scheme, DEFAULT_AUTH_SCHEME),
            ..self
        }
    }

    pub fn context_keys(&self) -> ContextKeys {
        ContextKeys {
            id_key: self.context_id_key.clone(),
            user_key: self.context_user_key.clone(),
            user_id_key: self.context_user_id_key.clone(),
        }
    }
}
