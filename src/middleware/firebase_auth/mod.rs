//! Firebase ID token verification → AuthCtx in request extensions
//!
//! Per request:
//! 1. skip predicate true → next handler, untouched
//! 2. extract the token (header / query / cookie) → 400 when absent or malformed
//! 3. verify it with the identity provider → 401 on any failure
//! 4. `X-GetUser: true` → also fetch the user profile → 401 on failure
//! 5. insert `AuthCtx` and run the next handler

mod authenticator;
pub mod config;
pub mod extractor;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::{self, Next},
    response::Response,
};

pub use authenticator::{AuthInitError, FirebaseAuth};
pub use config::{FirebaseAuthConfig, RolesResolver, Skipper, TokenLookup, skip_preflight};
pub use extractor::TokenExtractor;

use crate::error::AppError;

/// Header asking for the user profile to be attached as well.
pub const GET_USER_HEADER: &str = "x-getuser";

/// Apply the Firebase auth middleware to every route of `router`.
///
/// ```ignore
/// let auth = Arc::new(FirebaseAuth::new(FirebaseAuthConfig::new(credentials))?);
/// let v1 = middleware::firebase_auth::apply(api::v1::routes(), auth);
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply<S>(router: Router<S>, auth: Arc<FirebaseAuth>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(auth, firebase_auth_middleware))
}

fn wants_user(headers: &HeaderMap) -> bool {
    headers
        .get(GET_USER_HEADER)
        .is_some_and(|v| v.as_bytes() == b"true")
}

async fn firebase_auth_middleware(
    State(auth): State<Arc<FirebaseAuth>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if auth.should_skip(&req) {
        return Ok(next.run(req).await);
    }

    let token = auth.extractor().extract(&req)?;

    let ctx = match auth.authenticate(&token, wants_user(req.headers())).await {
        Ok(ctx) => ctx,
        Err(err) => {
            tracing::debug!(path = %req.uri().path(), "firebase authentication failed");
            return Err(err);
        }
    };

    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::{Json, http::StatusCode, routing::get};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::api::v1::extractors::AuthCtx;
    use crate::error::{TOKEN_INVALID_MESSAGE, TOKEN_MISSING_MESSAGE};
    use crate::services::firebase::{
        FirebaseError, FirebaseInfo, IdentityProvider, UserMetadata, UserRecord, VerifiedToken,
    };

    const GOOD_TOKEN: &str = "good-token";

    /// Accepts `GOOD_TOKEN` only and counts remote calls.
    #[derive(Default)]
    struct FakeProvider {
        verify_calls: AtomicUsize,
        user_calls: AtomicUsize,
        user_lookup_fails: bool,
    }

    fn claims() -> VerifiedToken {
        VerifiedToken {
            iss: "https://securetoken.google.com/demo".into(),
            aud: "demo".into(),
            sub: "uid-1".into(),
            exp: 2_000_000_000,
            iat: 1_700_000_000,
            auth_time: 1_700_000_000,
            firebase: FirebaseInfo {
                sign_in_provider: "password".into(),
                tenant: None,
                identities: HashMap::from([("email".to_string(), json!(["a@example.com"]))]),
            },
            claims: HashMap::new(),
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        async fn verify_id_token(&self, token: &str) -> Result<VerifiedToken, FirebaseError> {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            if token == GOOD_TOKEN {
                Ok(claims())
            } else {
                Err(FirebaseError::InvalidClaim("sub"))
            }
        }

        async fn get_user(&self, uid: &str) -> Result<UserRecord, FirebaseError> {
            self.user_calls.fetch_add(1, Ordering::SeqCst);
            if self.user_lookup_fails {
                return Err(FirebaseError::UserNotFound(uid.to_string()));
            }
            Ok(UserRecord {
                uid: uid.to_string(),
                email: Some("a@example.com".into()),
                email_verified: true,
                display_name: Some("Alice".into()),
                photo_url: None,
                phone_number: None,
                disabled: false,
                provider_user_info: Vec::new(),
                custom_claims: HashMap::new(),
                tenant_id: None,
                tokens_valid_after: None,
                metadata: UserMetadata::default(),
            })
        }
    }

    struct Harness {
        router: Router,
        provider: Arc<FakeProvider>,
        hits: Arc<AtomicUsize>,
    }

    fn harness(config: FirebaseAuthConfig, provider: FakeProvider) -> Harness {
        let provider = Arc::new(provider);
        let hits = Arc::new(AtomicUsize::new(0));
        let auth = Arc::new(FirebaseAuth::with_provider(config, provider.clone()));

        let counter = hits.clone();
        let handler = move |req: Request<Body>| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                let ctx = req
                    .extensions()
                    .get::<AuthCtx>()
                    .map(|ctx| Value::Object(ctx.to_context_map().unwrap()));
                Json(ctx.unwrap_or(Value::Null))
            }
        };

        let router = apply(Router::new().route("/me", get(handler)), auth);
        Harness {
            router,
            provider,
            hits,
        }
    }

    async fn call(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get_me(auth: Option<&str>, get_user: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/me");
        if let Some(auth) = auth {
            builder = builder.header("authorization", auth);
        }
        if let Some(flag) = get_user {
            builder = builder.header("x-getuser", flag);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn skipped_requests_reach_handler_untouched() {
        let config = FirebaseAuthConfig {
            skipper: Some(Arc::new(|_: &Request<Body>| true)),
            ..FirebaseAuthConfig::default()
        };
        let h = harness(config, FakeProvider::default());

        let (status, body) = call(&h.router, get_me(None, Some("true"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
        assert_eq!(h.hits.load(Ordering::SeqCst), 1);
        assert_eq!(h.provider.verify_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.provider.user_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_token_is_bad_request() {
        let h = harness(FirebaseAuthConfig::default(), FakeProvider::default());

        for auth in [None, Some("Bearerabc123"), Some("Basic abc123")] {
            let (status, body) = call(&h.router, get_me(auth, None)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"]["message"], TOKEN_MISSING_MESSAGE);
        }
        assert_eq!(h.hits.load(Ordering::SeqCst), 0);
        assert_eq!(h.provider.verify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejected_token_is_unauthorized_and_stops_the_chain() {
        let h = harness(FirebaseAuthConfig::default(), FakeProvider::default());

        let (status, body) = call(&h.router, get_me(Some("Bearer forged"), None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "TOKEN_INVALID");
        assert_eq!(body["error"]["message"], TOKEN_INVALID_MESSAGE);
        assert_eq!(h.hits.load(Ordering::SeqCst), 0);
        assert_eq!(h.provider.verify_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn verified_token_sets_claims_and_provider_only() {
        let h = harness(FirebaseAuthConfig::default(), FakeProvider::default());

        let (status, body) = call(&h.router, get_me(Some("Bearer good-token"), None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id-key"]["sub"], "uid-1");
        assert_eq!(body["auth-provider"], "firebase");
        assert_eq!(body["userID"], "a@example.com");
        assert!(body.get("user").is_none());
        assert!(body.get("roles").is_none());
        assert_eq!(h.hits.load(Ordering::SeqCst), 1);
        assert_eq!(h.provider.user_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn get_user_header_attaches_profile() {
        let h = harness(FirebaseAuthConfig::default(), FakeProvider::default());

        let (status, body) =
            call(&h.router, get_me(Some("Bearer good-token"), Some("true"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id-key"]["sub"], "uid-1");
        assert_eq!(body["auth-provider"], "firebase");
        assert_eq!(body["user"]["uid"], "uid-1");
        assert_eq!(body["user"]["display_name"], "Alice");
        assert_eq!(h.provider.user_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn get_user_header_must_be_exactly_true() {
        let h = harness(FirebaseAuthConfig::default(), FakeProvider::default());

        for flag in ["TRUE", "1", "yes", "true "] {
            let (status, body) =
                call(&h.router, get_me(Some("Bearer good-token"), Some(flag))).await;

            assert_eq!(status, StatusCode::OK);
            assert!(body.get("user").is_none(), "{flag:?} should not fetch the user");
        }
        assert_eq!(h.provider.user_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_profile_lookup_is_unauthorized() {
        let provider = FakeProvider {
            user_lookup_fails: true,
            ..FakeProvider::default()
        };
        let h = harness(FirebaseAuthConfig::default(), provider);

        let (status, body) =
            call(&h.router, get_me(Some("Bearer good-token"), Some("true"))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["message"], TOKEN_INVALID_MESSAGE);
        assert_eq!(h.hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn custom_key_names_are_used() {
        let config = FirebaseAuthConfig {
            context_id_key: "claims".into(),
            context_user_key: "profile".into(),
            ..FirebaseAuthConfig::default()
        };
        let h = harness(config, FakeProvider::default());

        let (_, body) = call(&h.router, get_me(Some("Bearer good-token"), Some("true"))).await;

        assert_eq!(body["claims"]["sub"], "uid-1");
        assert_eq!(body["profile"]["uid"], "uid-1");
        assert!(body.get("id-key").is_none());
    }

    #[tokio::test]
    async fn query_lookup() {
        let config = FirebaseAuthConfig {
            token_lookup: "query:token".into(),
            ..FirebaseAuthConfig::default()
        };
        let h = harness(config, FakeProvider::default());

        let req = Request::builder()
            .uri("/me?token=good-token")
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(&h.router, req).await;
        assert_eq!(status, StatusCode::OK);

        let req = Request::builder()
            .uri("/me?token=")
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(&h.router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cookie_lookup() {
        let config = FirebaseAuthConfig {
            token_lookup: "cookie:session".into(),
            ..FirebaseAuthConfig::default()
        };
        let h = harness(config, FakeProvider::default());

        let req = Request::builder()
            .uri("/me")
            .header("cookie", "session=good-token")
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(&h.router, req).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&h.router, get_me(None, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Present but empty: the verifier decides, and rejects it.
        let req = Request::builder()
            .uri("/me")
            .header("cookie", "session=")
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(&h.router, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(h.provider.verify_calls.load(Ordering::SeqCst), 2);
        assert_eq!(h.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn roles_are_resolved_from_email() {
        let config = FirebaseAuthConfig {
            roles: Some(Arc::new(|email: &str| {
                if email == "a@example.com" {
                    vec!["admin".to_string()]
                } else {
                    Vec::new()
                }
            })),
            ..FirebaseAuthConfig::default()
        };
        let h = harness(config, FakeProvider::default());

        let (status, body) = call(&h.router, get_me(Some("Bearer good-token"), None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["roles"], json!(["admin"]));
    }

    #[tokio::test]
    async fn no_roles_is_unauthorized() {
        let config = FirebaseAuthConfig {
            roles: Some(Arc::new(|_: &str| Vec::new())),
            ..FirebaseAuthConfig::default()
        };
        let h = harness(config, FakeProvider::default());

        let (status, _) = call(&h.router, get_me(Some("Bearer good-token"), None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(h.hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_credentials_fail_construction() {
        let err = FirebaseAuth::new(FirebaseAuthConfig::default()).unwrap_err();

        assert!(matches!(err, AuthInitError::MissingCredentials));
    }

    #[test]
    fn invalid_credentials_fail_construction() {
        let err = FirebaseAuth::new(FirebaseAuthConfig::new("{\"project_id\": 1}")).unwrap_err();

        assert!(matches!(err, AuthInitError::Client(FirebaseError::Credentials(_))));
    }
}
