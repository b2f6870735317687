/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 * - Cloned per request, so everything inside is behind Arc
 */
use std::sync::Arc;

use crate::middleware::firebase_auth::FirebaseAuth;

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: Arc<FirebaseAuth>,
}

impl AppState {
    pub fn new(auth: Arc<FirebaseAuth>) -> Self {
        Self { auth }
    }
}
