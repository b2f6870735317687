/*
 * Responsibility
 * - URL layout of v1
 * - /health is public, everything else sits behind the firebase auth middleware
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{health::health, me::me};
use crate::middleware::firebase_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected: Router<AppState> = Router::new().route("/me", get(me));
    let protected = firebase_auth::apply(protected, state.auth);

    Router::new().route("/health", get(health)).merge(protected)
}
