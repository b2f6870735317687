/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - Hand the authenticated request context (AuthCtx) to handlers
 * - axum glue lives in core, the type itself in types
 *
 * Public API:
 * - AuthCtx, AuthProvider, ContextKeys
 * - AuthCtxExtractor
 */

mod core;
mod types;

pub use core::AuthCtxExtractor;
pub use types::{AUTH_PROVIDER_KEY, AuthCtx, AuthProvider, ContextKeys, ROLES_KEY};
