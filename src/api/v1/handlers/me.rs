/*
 * Responsibility
 * - GET /me: echo the authenticated context back to the caller
 * - The shape is the published context map (id-key / auth-provider / userID / roles / user)
 */
use axum::Json;
use serde_json::{Map, Value};

use crate::api::v1::extractors::AuthCtxExtractor;
use crate::error::AppError;

pub async fn me(
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<Json<Map<String, Value>>, AppError> {
    let map = ctx.to_context_map().map_err(|e| {
        tracing::error!(error = %e, uid = ctx.uid(), "failed to serialize auth context");
        AppError::Internal
    })?;

    Ok(Json(map))
}
