//! # First Signal HTTP API Module
//!
//! HTTP REST API over a shared [`Session`].
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Counters and rolling metrics
//! - `POST /nodes` - Log a decision
//! - `GET /nodes` - List nodes (`?kind=failure&limit=20`)
//! - `GET /nodes/{id}` - One node with its world-model entry
//! - `GET /patterns` - Emergent patterns
//! - `GET /state` - Full cognitive state
//! - `GET /snapshot` - State plus summary metrics and checksum
//! - `POST /export` - Binary state, base64 encoded
//! - `GET /hash` - BLAKE3 digest of the binary state
//! - `GET /metrics` - Prometheus metrics
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `FIRST_SIGNAL_CORS_ORIGINS`: comma-separated allowed origins, or "*" (default: localhost only)
//! - `FIRST_SIGNAL_RATE_LIMIT`: requests per second (default: 100, 0 to disable)
//! - `FIRST_SIGNAL_API_KEY`: if set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{API_KEY_ENV, get_api_key_from_env};
pub use handlers::{
    export_handler, hash_handler, health_handler, list_nodes_handler, log_handler,
    metrics_handler, node_handler, patterns_handler, render_metrics, snapshot_handler,
    state_handler, status_handler,
};
pub use middleware::{RATE_LIMIT_ENV, create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    ErrorResponse, ExportResponse, HashResponse, HealthResponse, LogRequest, LogResponse,
    NodeResponse, NodesQuery, NodesResponse, PatternsResponse, StatusResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use signal_core::{Session, SignalError};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Environment variable holding the allowed CORS origins.
pub const CORS_ORIGINS_ENV: &str = "FIRST_SIGNAL_CORS_ORIGINS";

/// Request body limit (2 MiB).
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<RwLock<Session>>,
}

impl AppState {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from `FIRST_SIGNAL_CORS_ORIGINS`.
///
/// - `*`: any origin
/// - unset, or no valid entry: localhost only
/// - otherwise: the listed origins
fn build_cors_layer() -> CorsLayer {
    match std::env::var(CORS_ORIGINS_ENV).ok().as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins ({}=*). This is insecure for production!",
                CORS_ORIGINS_ENV
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in {}, defaulting to localhost only",
                    CORS_ORIGINS_ENV
                );
                build_localhost_cors()
            } else {
                restricted_cors(allowed_origins)
            }
        }
        None => {
            tracing::info!(
                "CORS: No {} set, defaulting to localhost only",
                CORS_ORIGINS_ENV
            );
            build_localhost_cors()
        }
    }
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Localhost dev origins (UI dev server and the API itself).
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();
    restricted_cors(origins)
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the router with all endpoints and middleware.
///
/// Middleware stack (outer to inner): tracing, CORS, body limit,
/// rate limiting (if enabled), authentication (if configured).
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible! \
             Set {} to enable authentication.",
            API_KEY_ENV
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route(
            "/nodes",
            post(handlers::log_handler).get(handlers::list_nodes_handler),
        )
        .route("/nodes/{id}", get(handlers::node_handler))
        .route("/patterns", get(handlers::patterns_handler))
        .route("/state", get(handlers::state_handler))
        .route("/snapshot", get(handlers::snapshot_handler))
        .route("/export", post(handlers::export_handler))
        .route("/hash", get(handlers::hash_handler))
        .route("/metrics", get(handlers::metrics_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve `state` on `addr` until Ctrl+C.
///
/// Callers that keep a clone of `state` can save a file-backed session
/// once this returns.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), SignalError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| SignalError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("First Signal HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SignalError::IoError(format!("Server error: {}", e)))?;

    tracing::info!("First Signal HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

// =============================================================================
// TESTS
// =============================================================================
