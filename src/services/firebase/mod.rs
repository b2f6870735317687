//! Firebase identity provider: the remote side of authentication.
//!
//! The middleware only talks to `IdentityProvider`; `FirebaseClient` is the
//! production implementation.
use async_trait::async_trait;

pub mod client;
pub mod credentials;
pub mod error;
pub mod token;
pub mod user;

pub use client::{FirebaseClient, FirebaseEndpoints};
pub use credentials::ServiceAccountKey;
pub use error::FirebaseError;
pub use token::{FirebaseInfo, VerifiedToken};
pub use user::{ProviderUserInfo, UserMetadata, UserRecord};

/// Remote identity operations.
///
/// Implementations must be safe to share across concurrent requests
/// (typically behind an `Arc`).
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    // Verify an ID token and return its claims.
    async fn verify_id_token(&self, token: &str) -> Result<VerifiedToken, FirebaseError>;

    // Fetch the account profile for a verified subject.
    async fn get_user(&self, uid: &str) -> Result<UserRecord, FirebaseError>;
}
