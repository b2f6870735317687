//! reqwest-backed Firebase Auth client.
//!
//! - ID tokens are verified locally against Google's published `securetoken` JWKS
//!   (RS256, aud = project id, iss = `https://securetoken.google.com/<project id>`).
//! - User profiles are fetched from the Identity Toolkit `accounts:lookup` endpoint,
//!   authorized with an OAuth2 access token minted from the service-account key.
//!
//! Both the JWKS and the access token are cached until they expire. Nothing
//! else is cached and no call is retried.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, jwk::JwkSet};
use reqwest::{Client, header::CACHE_CONTROL};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{
    FirebaseError, IdentityProvider, ServiceAccountKey, VerifiedToken,
    user::{LookupResponse, UserRecord},
};

const SECURETOKEN_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const ISSUER_PREFIX: &str = "https://securetoken.google.com/";

const OAUTH_SCOPES: &str = "https://www.googleapis.com/auth/cloud-platform \
     https://www.googleapis.com/auth/firebase \
     https://www.googleapis.com/auth/identitytoolkit \
     https://www.googleapis.com/auth/userinfo.email";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

const CLOCK_SKEW_SECONDS: u64 = 300;
const MAX_UID_LENGTH: usize = 128;
const ASSERTION_TTL_SECONDS: i64 = 3600;
// Refresh the access token a bit before Google considers it expired.
const ACCESS_TOKEN_MARGIN: Duration = Duration::from_secs(60);
// Used when the JWKS response carries no usable max-age.
const DEFAULT_KEYS_TTL: Duration = Duration::from_secs(3600);

/// Remote endpoints. Overridable for the Firebase emulator or a proxy.
#[derive(Debug, Clone)]
pub struct FirebaseEndpoints {
    pub jwks_url: String,
    pub identity_toolkit_url: String,
}

impl Default for FirebaseEndpoints {
    fn default() -> Self {
        Self {
            jwks_url: SECURETOKEN_JWKS_URL.to_string(),
            identity_toolkit_url: IDENTITY_TOOLKIT_URL.to_string(),
        }
    }
}

struct Cached<T> {
    value: T,
    expires_at: Instant,
}

impl<T> Cached<T> {
    fn fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    local_id: [&'a str; 1],
}

/// Production `IdentityProvider`.
///
/// Safe to share across requests; the only mutable state is the two caches.
pub struct FirebaseClient {
    http: Client,
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    endpoints: FirebaseEndpoints,
    validation: Validation,
    keys: RwLock<Option<Cached<JwkSet>>>,
    access_token: RwLock<Option<Cached<String>>>,
}

impl std::fmt::Debug for FirebaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("FirebaseClient")
            .field("project_id", &self.key.project_id)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl FirebaseClient {
    pub fn from_service_account_json(raw: &[u8]) -> Result<Self, FirebaseError> {
        Self::with_endpoints(ServiceAccountKey::from_json(raw)?, FirebaseEndpoints::default())
    }

    pub fn with_endpoints(
        key: ServiceAccountKey,
        endpoints: FirebaseEndpoints,
    ) -> Result<Self, FirebaseError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| FirebaseError::Credentials(format!("invalid private key: {e}")))?;

        let http = Client::builder().build()?;

        Ok(Self {
            http,
            validation: id_token_validation(&key.project_id),
            key,
            signing_key,
            endpoints,
            keys: RwLock::new(None),
            access_token: RwLock::new(None),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.key.project_id
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, FirebaseError> {
        if let Some(cached) = self.keys.read().await.as_ref()
            && cached.fresh()
        {
            return lookup_key(&cached.value, kid);
        }

        let mut guard = self.keys.write().await;
        // Another request may have refreshed the set while we waited. A fresh
        // set without `kid` means the token is bogus, not that keys rotated.
        if let Some(cached) = guard.as_ref()
            && cached.fresh()
        {
            return lookup_key(&cached.value, kid);
        }

        let res = self.http.get(&self.endpoints.jwks_url).send().await?;
        if !res.status().is_success() {
            return Err(FirebaseError::Status {
                endpoint: "jwks",
                status: res.status(),
            });
        }

        let ttl = res
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(max_age)
            .unwrap_or(DEFAULT_KEYS_TTL);
        let jwks: JwkSet = res.json().await?;

        let key = lookup_key(&jwks, kid);

        *guard = Some(Cached {
            value: jwks,
            expires_at: Instant::now() + ttl,
        });

        key
    }

    async fn bearer(&self) -> Result<String, FirebaseError> {
        if let Some(cached) = self.access_token.read().await.as_ref()
            && cached.fresh()
        {
            return Ok(cached.value.clone());
        }

        let mut guard = self.access_token.write().await;
        if let Some(cached) = guard.as_ref()
            && cached.fresh()
        {
            return Ok(cached.value.clone());
        }

        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: OAUTH_SCOPES,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_TTL_SECONDS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        let assertion = jsonwebtoken::encode(&header, &claims, &self.signing_key)?;

        let res = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(FirebaseError::Status {
                endpoint: "oauth2 token",
                status: res.status(),
            });
        }
        let token: AccessTokenResponse = res.json().await?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(ACCESS_TOKEN_MARGIN);
        *guard = Some(Cached {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseClient {
    async fn verify_id_token(&self, token: &str) -> Result<VerifiedToken, FirebaseError> {
        let header = jsonwebtoken::decode_header(token)?;
        let kid = header.kid.ok_or(FirebaseError::MissingKeyId)?;
        let key = self.decoding_key(&kid).await?;

        let data = jsonwebtoken::decode::<VerifiedToken>(token, &key, &self.validation)?;
        check_subject(&data.claims)?;

        Ok(data.claims)
    }

    async fn get_user(&self, uid: &str) -> Result<UserRecord, FirebaseError> {
        let bearer = self.bearer().await?;
        let url = format!(
            "{}/projects/{}/accounts:lookup",
            self.endpoints.identity_toolkit_url, self.key.project_id
        );

        let res = self
            .http
            .post(url)
            .bearer_auth(bearer)
            .json(&LookupRequest { local_id: [uid] })
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(FirebaseError::Status {
                endpoint: "accounts:lookup",
                status: res.status(),
            });
        }

        let body: LookupResponse = res.json().await?;
        body.users
            .into_iter()
            .next()
            .map(UserRecord::from)
            .ok_or_else(|| FirebaseError::UserNotFound(uid.to_string()))
    }
}

// Keys are only refetched once the cached set expires, never on an unknown kid.
fn lookup_key(jwks: &JwkSet, kid: &str) -> Result<DecodingKey, FirebaseError> {
    let jwk = jwks
        .find(kid)
        .ok_or_else(|| FirebaseError::UnknownKeyId(kid.to_string()))?;
    Ok(DecodingKey::from_jwk(jwk)?)
}

fn id_token_validation(project_id: &str) -> Validation {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[project_id]);
    validation.set_issuer(&[format!("{ISSUER_PREFIX}{project_id}")]);
    validation.set_required_spec_claims(&["exp", "iat", "sub", "aud", "iss"]);
    validation.leeway = CLOCK_SKEW_SECONDS;
    validation
}

fn check_subject(token: &VerifiedToken) -> Result<(), FirebaseError> {
    if token.sub.is_empty() || token.sub.len() > MAX_UID_LENGTH {
        return Err(FirebaseError::InvalidClaim("sub"));
    }

    let now = Utc::now().timestamp() + CLOCK_SKEW_SECONDS as i64;
    if token.iat > now {
        return Err(FirebaseError::InvalidClaim("iat"));
    }
    if token.auth_time > now {
        return Err(FirebaseError::InvalidClaim("auth_time"));
    }

    Ok(())
}

// `Cache-Control: public, max-age=19845, must-revalidate, no-transform`
fn max_age(header: &str) -> Option<Duration> {
    header
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.parse::<u64>().ok())
        .map(Duration::from_secs)
}
