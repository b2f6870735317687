use axum::http::Request;
use axum_extra::extract::cookie::CookieJar;

use super::config::TokenLookup;
use crate::error::AppError;

/// Pulls the raw token out of a request. Selected once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenExtractor {
    Header { name: String, scheme: String },
    Query { name: String },
    Cookie { name: String },
}

impl TokenExtractor {
    pub fn new(lookup: TokenLookup, scheme: &str) -> Self {
        match lookup {
            TokenLookup::Header(name) => Self::Header {
                name,
                scheme: scheme.to_string(),
            },
            TokenLookup::Query(name) => Self::Query { name },
            TokenLookup::Cookie(name) => Self::Cookie { name },
        }
    }

    pub fn extract<B>(&self, req: &Request<B>) -> Result<String, AppError> {
        match self {
            Self::Header { name, scheme } => from_header(req, name, scheme),
            Self::Query { name } => from_query(req, name),
            Self::Cookie { name } => from_cookie(req, name),
        }
    }
}

// `<scheme> <token>`: one separator, then a non-empty token.
fn from_header<B>(req: &Request<B>, name: &str, scheme: &str) -> Result<String, AppError> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix(scheme))
        .and_then(|rest| rest.strip_prefix(' '))
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .ok_or(AppError::TokenMissing)
}

fn from_query<B>(req: &Request<B>, name: &str) -> Result<String, AppError> {
    let query = req.uri().query().unwrap_or_default();

    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty())
        .ok_or(AppError::TokenMissing)
}

fn from_cookie<B>(req: &Request<B>, name: &str) -> Result<String, AppError> {
    CookieJar::from_headers(req.headers())
        .get(name)
        .map(|cookie| cookie.value().to_owned())
        .ok_or(AppError::TokenMissing)
}
