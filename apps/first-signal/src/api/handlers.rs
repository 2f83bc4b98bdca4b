//! # API Endpoint Handlers
//!
//! Reads take the shared lock for reading; `POST /nodes` takes it for
//! writing, so insertions are serialized.

use super::{
    AppState,
    types::{
        ErrorResponse, ExportResponse, HashResponse, HealthResponse, LogRequest, LogResponse,
        NodeResponse, NodesQuery, NodesResponse, PatternsResponse, StatusResponse,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use signal_core::{
    CognitiveState, NodeId, SignalError, snapshot_checksum, state_crypto_hash, state_to_bytes,
};
use std::fmt::Write as _;

/// Map an engine error to its HTTP status.
fn error_status(error: &SignalError) -> StatusCode {
    match error {
        SignalError::InvalidInput(_) | SignalError::InvalidKind(_) => StatusCode::BAD_REQUEST,
        SignalError::NodeNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &SignalError) -> Response {
    (error_status(error), Json(ErrorResponse::new(error.to_string()))).into_response()
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Aggregate counters and rolling metrics.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    let engine = session.engine();
    let response = StatusResponse::from_state(
        engine.state(),
        engine.emergent_patterns().len(),
        session.is_persistent(),
    );
    (StatusCode::OK, Json(response))
}

// =============================================================================
// NODE HANDLERS
// =============================================================================

/// Log a decision.
pub async fn log_handler(
    State(state): State<AppState>,
    Json(request): Json<LogRequest>,
) -> impl IntoResponse {
    let kind = match request.validate() {
        Ok(kind) => kind,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(LogResponse::error(format!("Invalid decision: {}", e))),
            );
        }
    };

    let mut session = state.session.write().await;
    match session.log_decision(&request.decision, &request.outcome, kind) {
        Ok(node) => {
            tracing::info!(
                node = %node.id,
                kind = %node.kind,
                predecessors = node.caused_by.len(),
                "decision logged"
            );
            (StatusCode::CREATED, Json(LogResponse::success(node)))
        }
        Err(e) => (
            error_status(&e),
            Json(LogResponse::error(format!("Log failed: {}", e))),
        ),
    }
}

/// List nodes, optionally filtered by kind and limited to the latest N.
pub async fn list_nodes_handler(
    State(state): State<AppState>,
    Query(query): Query<NodesQuery>,
) -> Response {
    let session = state.session.read().await;
    match NodesResponse::select(session.engine().nodes(), &query) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// One node with its world-model entry, bias-adjusted score and decay.
pub async fn node_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match id.parse::<NodeId>() {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };
    let session = state.session.read().await;
    match NodeResponse::build(session.engine(), id) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// AGGREGATE HANDLERS
// =============================================================================

/// Emergent patterns, mined on each call.
pub async fn patterns_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    let patterns = session.engine().emergent_patterns().into_vec();
    (StatusCode::OK, Json(PatternsResponse { patterns }))
}

/// Deep copy of the whole state.
pub async fn state_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    (StatusCode::OK, Json(session.cognitive_state()))
}

/// State plus summary metrics and checksum.
pub async fn snapshot_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    (StatusCode::OK, Json(session.snapshot()))
}

// =============================================================================
// EXPORT HANDLER
// =============================================================================

/// Export the binary state (base64) with its checksum.
pub async fn export_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    let cognitive = session.engine().state();

    match state_to_bytes(cognitive) {
        Ok(data) => (
            StatusCode::OK,
            Json(ExportResponse::success(data, snapshot_checksum(cognitive))),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ExportResponse::error(format!("Export failed: {}", e))),
        ),
    }
}

// =============================================================================
// HASH HANDLER
// =============================================================================

/// BLAKE3 digest of the binary state.
pub async fn hash_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    let cognitive = session.engine().state();

    match state_crypto_hash(cognitive) {
        Ok(hash) => (
            StatusCode::OK,
            Json(HashResponse::success(hash, cognitive.nodes.len())),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HashResponse::error(format!("Hash failed: {}", e))),
        ),
    }
}

// =============================================================================
// METRICS HANDLER
// =============================================================================

/// Prometheus text exposition.
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    let engine = session.engine();
    let body = render_metrics(engine.state(), engine.emergent_patterns().len());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

/// Render gauges and counters for one state.
pub fn render_metrics(state: &CognitiveState, pattern_count: usize) -> String {
    let gauges: [(&str, &str, f64); 5] = [
        (
            "first_signal_nodes",
            "Decisions in the causal log.",
            state.nodes.len() as f64,
        ),
        (
            "first_signal_edges",
            "Predecessor links in the causal log.",
            state.edge_count() as f64,
        ),
        (
            "first_signal_patterns",
            "Distinct emergent patterns.",
            pattern_count as f64,
        ),
        (
            "first_signal_synaptic_efficiency",
            "Blended historical and recent synaptic score.",
            state.synaptic_efficiency,
        ),
        (
            "first_signal_temporal_alignment",
            "Recent success and learning rate.",
            state.temporal_alignment,
        ),
    ];

    let mut out = String::new();
    for (name, help, value) in gauges {
        let _ = writeln!(out, "# HELP {name} {help}");
        let _ = writeln!(out, "# TYPE {name} gauge");
        let _ = writeln!(out, "{name} {value}");
    }
    let _ = writeln!(
        out,
        "# HELP first_signal_processing_micros_total Time spent inserting nodes."
    );
    let _ = writeln!(out, "# TYPE first_signal_processing_micros_total counter");
    let _ = writeln!(
        out,
        "first_signal_processing_micros_total {}",
        state.total_processing_micros
    );
    out
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use uuid::Uuid;

    #[test]
    fn metrics_text_has_every_family() {
        let state = CognitiveState::new(
            Uuid::nil(),
            "alice",
            DateTime::from_timestamp_millis(0).expect("ts"),
        );
        let text = render_metrics(&state, 0);
        for family in [
            "first_signal_nodes 0",
            "first_signal_edges 0",
            "first_signal_patterns 0",
            "first_signal_synaptic_efficiency 0.5",
            "first_signal_temporal_alignment 0.65",
            "first_signal_processing_micros_total 0",
        ] {
            assert!(text.contains(family), "missing {family}");
        }
    }

    #[test]
    fn errors_map_to_statuses() {
        assert_eq!(
            error_status(&SignalError::InvalidKind("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&SignalError::NodeNotFound(NodeId(Uuid::nil()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_status(&SignalError::IoError("disk".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
