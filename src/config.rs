/*
 * Responsibility
 * - Load settings from the environment (.env supported)
 * - Validate them (missing credentials → start-up fails)
 * - Turn them into a FirebaseAuthConfig for the middleware
 */
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::middleware::firebase_auth::{FirebaseAuthConfig, skip_preflight};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("cannot read {key}: {source}")]
    Read {
        key: &'static str,
        #[source]
        source: std::io::Error,
    },
}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub request_timeout: Duration,

    pub credentials_json: Vec<u8>,
    pub token_lookup: Option<String>,
    pub auth_scheme: Option<String>,
    pub context_id_key: Option<String>,
    pub context_user_key: Option<String>,
    pub context_user_id_key: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print credentials
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("request_timeout", &self.request_timeout)
            .field("token_lookup", &self.token_lookup)
            .field("auth_scheme", &self.auth_scheme)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = match var("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let app_env = AppEnv::parse(var("APP_ENV"));

        let request_timeout = var("REQUEST_TIMEOUT_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        // Inline JSON wins over a file path.
        let credentials_json = match (
            var("FIREBASE_CREDENTIALS_JSON"),
            var("FIREBASE_CREDENTIALS_FILE"),
        ) {
            (Some(json), _) if !json.trim().is_empty() => json.into_bytes(),
            (_, Some(path)) if !path.trim().is_empty() => {
                std::fs::read(path.trim()).map_err(|source| ConfigError::Read {
                    key: "FIREBASE_CREDENTIALS_FILE",
                    source,
                })?
            }
            _ => return Err(ConfigError::Missing("FIREBASE_CREDENTIALS_JSON")),
        };

        Ok(Self {
            addr,
            app_env,
            request_timeout,
            credentials_json,
            token_lookup: var("AUTH_TOKEN_LOOKUP"),
            auth_scheme: var("AUTH_SCHEME"),
            context_id_key: var("AUTH_CONTEXT_ID_KEY"),
            context_user_key: var("AUTH_CONTEXT_USER_KEY"),
            context_user_id_key: var("AUTH_CONTEXT_USER_ID_KEY"),
        })
    }

    /// Middleware config; unset values fall back to the middleware defaults.
    pub fn firebase_auth(&self) -> FirebaseAuthConfig {
        let defaults = FirebaseAuthConfig::default();
        FirebaseAuthConfig {
            skipper: Some(skip_preflight()),
            context_id_key: self.context_id_key.clone().unwrap_or(defaults.context_id_key),
            context_user_key: self
                .context_user_key
                .clone()
                .unwrap_or(defaults.context_user_key),
            context_user_id_key: self
                .context_user_id_key
                .clone()
                .unwrap_or(defaults.context_user_id_key),
            token_lookup: self.token_lookup.clone().unwrap_or(defaults.token_lookup),
            auth_scheme: self.auth_scheme.clone().unwrap_or(defaults.auth_scheme),
            credentials_json: self.credentials_json.clone(),
            roles: None,
        }
    }
}
