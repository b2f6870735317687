use thiserror::Error;

/// Errors returned by the identity provider client.
///
/// The middleware never distinguishes between these; every variant ends up as
/// the same 401 response. They exist for logs.
#[derive(Debug, Error)]
pub enum FirebaseError {
    #[error("invalid service account credentials: {0}")]
    Credentials(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response from {endpoint}: {status}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("id token verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("id token has no 'kid' header")]
    MissingKeyId,

    #[error("no public key matches kid {0}")]
    UnknownKeyId(String),

    #[error("invalid '{0}' claim")]
    InvalidClaim(&'static str),

    #[error("no user record for uid {0}")]
    UserNotFound(String),
}
