/*
 * Responsibility
 * - Request-time errors of the authentication middleware
 * - IntoResponse (HTTP status / JSON error body with a fixed public message)
 * - The underlying cause stays internal: it is logged, never sent to the client
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const TOKEN_MISSING_MESSAGE: &str = "Missing or malformed Firebase AuthID TOKEN";
pub const TOKEN_INVALID_MESSAGE: &str = "Invalid or expired Firebase AuthID TOKEN";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{}", TOKEN_MISSING_MESSAGE)]
    TokenMissing,
    #[error("{}", TOKEN_INVALID_MESSAGE)]
    TokenInvalid {
        #[source]
        source: BoxError,
    },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    /// 401 with the fixed public message; `cause` is kept for logs only.
    pub fn unauthorized(cause: impl Into<BoxError>) -> Self {
        Self::TokenInvalid {
            source: cause.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::TokenMissing => StatusCode::BAD_REQUEST,
            AppError::TokenInvalid { .. } => StatusCode::UNAUTHORIZED,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Diagnostic detail behind the public message, if any.
    pub fn internal(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            AppError::TokenInvalid { source } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = match &self {
            AppError::TokenMissing => "TOKEN_MISSING",
            AppError::TokenInvalid { source } => {
                tracing::warn!(error = %source, "firebase authentication rejected");
                "TOKEN_INVALID"
            }
            AppError::Internal => "INTERNAL_SERVER_ERROR",
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}
