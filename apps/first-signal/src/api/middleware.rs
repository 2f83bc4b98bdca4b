//! # Middleware Module
//!
//! One request quota shared by every route of the decision log, so a noisy
//! client cannot starve the single writer behind the session lock.
//!
//! ## Configuration
//!
//! - `FIRST_SIGNAL_RATE_LIMIT`: requests per second (default: 100, 0 disables)
//!
//! `/health` is never throttled. Throttled requests get `429` with a
//! `Retry-After` header and a JSON `ErrorResponse` body.

use super::types::ErrorResponse;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable holding the per-second request quota.
pub const RATE_LIMIT_ENV: &str = "FIRST_SIGNAL_RATE_LIMIT";

const DEFAULT_RPS: NonZeroU32 = NonZeroU32::new(100).unwrap();

/// Routes that bypass the quota.
const UNTHROTTLED_PATHS: &[&str] = &["/health"];

/// Quota shared by all clients of one server.
pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Limiter allowing `requests_per_second`; zero means the default quota.
pub fn create_rate_limiter(requests_per_second: u32) -> GlobalRateLimiter {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(DEFAULT_RPS);
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

/// `FIRST_SIGNAL_RATE_LIMIT`, or 100 when unset or not a number.
pub fn get_rate_limit_from_env() -> u32 {
    std::env::var(RATE_LIMIT_ENV)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_RPS.get())
}

/// Whole seconds to announce in `Retry-After`, never less than one.
fn retry_after_secs(wait: Duration) -> u64 {
    let rounded_up = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    rounded_up.max(1)
}

fn throttled(wait: Duration) -> Response {
    let secs = retry_after_secs(wait);
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(ErrorResponse::new(format!(
            "request quota exhausted, retry in {secs}s"
        ))),
    )
        .into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(secs));
    response
}

/// Spend one unit of the shared quota, or answer 429.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if UNTHROTTLED_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }
    match limiter.check() {
        Ok(()) => next.run(request).await,
        Err(not_until) => {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            tracing::warn!(
                method = %request.method(),
                path = %request.uri().path(),
                wait_ms = wait.as_millis() as u64,
                "request quota exhausted"
            );
            throttled(wait)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
