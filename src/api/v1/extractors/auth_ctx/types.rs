/*
 * Responsibility
 * - The authenticated context a handler sees
 * - The middleware verifies the token and stores this in request extensions;
 *   handlers only ever receive this type
 *
 * Notes
 * - Values stay structured; `to_context_map` is the only place they are
 *   serialized, under the configured key names
 */
use serde::Serialize;
use serde_json::{Map, Value};

use crate::services::firebase::{UserRecord, VerifiedToken};

/// Key under which the provider tag is published. Not configurable.
pub const AUTH_PROVIDER_KEY: &str = "auth-provider";
/// Key under which resolved roles are published. Not configurable.
pub const ROLES_KEY: &str = "roles";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Firebase,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Firebase => "firebase",
        }
    }
}

/// Names used when the context is published outside the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextKeys {
    pub id_key: String,
    pub user_key: String,
    pub user_id_key: String,
}

/// Context attached to an authenticated request.
///
/// - `claims` is the verified ID token
/// - `user_id` is the first e-mail identity of the token (when present)
/// - `roles` is only filled when a roles resolver is configured
/// - `user` is only filled when the client sent `X-GetUser: true`
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub claims: VerifiedToken,
    pub provider: AuthProvider,
    pub user_id: Option<String>,
    pub roles: Vec<String>,
    pub user: Option<UserRecord>,
    keys: ContextKeys,
}

impl AuthCtx {
    pub fn new(claims: VerifiedToken, keys: ContextKeys) -> Self {
        let user_id = claims.email().map(str::to_owned);
        Self {
            claims,
            provider: AuthProvider::Firebase,
            user_id,
            roles: Vec::new(),
            user: None,
            keys,
        }
    }

    pub fn uid(&self) -> &str {
        self.claims.uid()
    }

    /// Flat JSON view keyed by the configured names, e.g.
    /// `{"id-key": {...}, "auth-provider": "firebase", "userID": "...", "user": {...}}`.
    pub fn to_context_map(&self) -> Result<Map<String, Value>, serde_json::Error> {
        let mut map = Map::new();
        map.insert(self.keys.id_key.clone(), serde_json::to_value(&self.claims)?);
        map.insert(
            AUTH_PROVIDER_KEY.to_string(),
            Value::from(self.provider.as_str()),
        );
        if let Some(user_id) = &self.user_id {
            map.insert(self.keys.user_id_key.clone(), Value::from(user_id.as_str()));
        }
        if !self.roles.is_empty() {
            map.insert(ROLES_KEY.to_string(), serde_json::to_value(&self.roles)?);
        }
        if let Some(user) = &self.user {
            map.insert(self.keys.user_key.clone(), serde_json::to_value(user)?);
        }
        Ok(map)
    }
}
