//! Firebase ID token authentication middleware for axum.
//!
//! ```ignore
//! let auth = FirebaseAuth::new(FirebaseAuthConfig::new(service_account_json))?;
//! let router = firebase_auth::middleware::firebase_auth::apply(router, Arc::new(auth));
//! ```
//!
//! Handlers read the verified identity with [`api::v1::extractors::AuthCtxExtractor`].

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

pub use api::v1::extractors::{AuthCtx, AuthCtxExtractor};
pub use error::AppError;
pub use middleware::firebase_auth::{AuthInitError, FirebaseAuth, FirebaseAuthConfig};
pub use services::firebase::{FirebaseClient, IdentityProvider};
