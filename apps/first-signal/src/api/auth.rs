//! # Authentication Module
//!
//! A decision log is private to its owner. When `FIRST_SIGNAL_API_KEY` is
//! set, every route except `/health` needs that key:
//!
//! ```text
//! Authorization: Bearer <key>
//! Authorization: <key>
//! ```
//!
//! Rejections carry the same JSON `ErrorResponse` body as other API errors.

use super::types::ErrorResponse;
use axum::{
    Json,
    body::Body,
    http::{HeaderMap, HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

/// Environment variable holding the owner's key.
pub const API_KEY_ENV: &str = "FIRST_SIGNAL_API_KEY";

/// Routes reachable without a key.
const PUBLIC_PATHS: &[&str] = &["/health"];

const CHALLENGE: &str = "Bearer realm=\"first-signal\"";

/// Returns `Some(key)` if `FIRST_SIGNAL_API_KEY` is set and non-empty.
pub fn get_api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty())
}

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Denial {
    MissingKey,
    WrongKey,
}

impl Denial {
    fn reason(self) -> &'static str {
        match self {
            Denial::MissingKey => "missing_api_key",
            Denial::WrongKey => "invalid_api_key",
        }
    }

    fn response(self) -> Response {
        let message = match self {
            Denial::MissingKey => "this decision log requires an API key",
            Denial::WrongKey => "API key rejected",
        };
        let mut response =
            (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(message))).into_response();
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(CHALLENGE));
        response
    }
}

/// The key a client presented, with an optional `Bearer` scheme stripped.
fn presented_key(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let key = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => value,
    };
    (!key.is_empty()).then_some(key)
}

/// Constant-time key comparison over equal-length padded buffers.
fn keys_match(presented: &str, expected: &str) -> bool {
    let width = presented.len().max(expected.len());
    let padded = |key: &str| {
        let mut bytes = key.as_bytes().to_vec();
        bytes.resize(width, 0);
        bytes
    };
    let same_bytes: bool = padded(presented).ct_eq(&padded(expected)).into();
    same_bytes & (presented.len() == expected.len())
}

fn check(headers: &HeaderMap, expected: &str) -> Result<(), Denial> {
    match presented_key(headers) {
        None => Err(Denial::MissingKey),
        Some(key) if keys_match(key, expected) => Ok(()),
        Some(_) => Err(Denial::WrongKey),
    }
}

/// Require the owner's key on every non-public route.
pub async fn api_key_auth_middleware(request: Request<Body>, next: Next) -> Response {
    let Some(expected) = get_api_key_from_env() else {
        return next.run(request).await;
    };
    if PUBLIC_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    match check(request.headers(), &expected) {
        Ok(()) => next.run(request).await,
        Err(denial) => {
            tracing::warn!(
                event = "auth_failure",
                reason = denial.reason(),
                method = %request.method(),
                path = %request.uri().path(),
                "request to decision log denied"
            );
            denial.response()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
