use std::sync::Arc;

use axum::{body::Body, http::Request};
use thiserror::Error;

use super::{
    config::{FirebaseAuthConfig, RolesResolver, Skipper, TokenLookup},
    extractor::TokenExtractor,
};
use crate::api::v1::extractors::auth_ctx::{AuthCtx, ContextKeys};
use crate::error::AppError;
use crate::services::firebase::{FirebaseClient, FirebaseError, IdentityProvider};

/// Construction failures. These are configuration problems; the host decides
/// whether to abort or retry.
#[derive(Debug, Error)]
pub enum AuthInitError {
    #[error("firebase auth middleware requires service account credentials")]
    MissingCredentials,
    #[error("failed to initialize firebase client: {0}")]
    Client(#[from] FirebaseError),
}

/// A configured middleware instance. Immutable and shared by all requests.
pub struct FirebaseAuth {
    skipper: Option<Skipper>,
    extractor: TokenExtractor,
    keys: ContextKeys,
    roles: Option<RolesResolver>,
    provider: Arc<dyn IdentityProvider>,
}

impl std::fmt::Debug for FirebaseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseAuth")
            .field("extractor", &self.extractor)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

impl FirebaseAuth {
    /// Builds the middleware and a `FirebaseClient` from `config.credentials_json`.
    pub fn new(config: FirebaseAuthConfig) -> Result<Self, AuthInitError> {
        if config.credentials_json.is_empty() {
            return Err(AuthInitError::MissingCredentials);
        }
        let client = FirebaseClient::from_service_account_json(&config.credentials_json)?;
        tracing::info!(project_id = client.project_id(), "firebase auth client ready");

        Ok(Self::with_provider(config, Arc::new(client)))
    }

    /// Builds the middleware around an existing provider (emulator, tests).
    /// `config.credentials_json` is ignored.
    pub fn with_provider(config: FirebaseAuthConfig, provider: Arc<dyn IdentityProvider>) -> Self {
        let config = config.with_defaults();
        let lookup = TokenLookup::parse(&config.token_lookup);

        Self {
            extractor: TokenExtractor::new(lookup, &config.auth_scheme),
            keys: config.context_keys(),
            skipper: config.skipper,
            roles: config.roles,
            provider,
        }
    }

    pub fn extractor(&self) -> &TokenExtractor {
        &self.extractor
    }

    pub fn should_skip(&self, req: &Request<Body>) -> bool {
        self.skipper.as_ref().is_some_and(|skip| skip(req))
    }

    /// Verifies `token` and builds the request context.
    ///
    /// At most two remote calls, each attempted once: token verification and,
    /// when `want_user` is set, the profile lookup.
    pub async fn authenticate(&self, token: &str, want_user: bool) -> Result<AuthCtx, AppError> {
        let claims = self
            .provider
            .verify_id_token(token)
            .await
            .map_err(AppError::unauthorized)?;

        let mut ctx = AuthCtx::new(claims, self.keys.clone());

        if let Some(resolve) = &self.roles {
            let roles = resolve(ctx.user_id.as_deref().unwrap_or_default());
            if roles.is_empty() {
                return Err(AppError::unauthorized("no roles found"));
            }
            ctx.roles = roles;
        }

        if want_user {
            let user = self
                .provider
                .get_user(ctx.uid())
                .await
                .map_err(AppError::unauthorized)?;
            ctx.user = Some(user);
        }

        tracing::debug!(uid = ctx.uid(), with_user = want_user, "firebase token verified");
        Ok(ctx)
    }
}
