//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use chrono::DateTime;
use first_signal::api::{
    ExportResponse, HashResponse, HealthResponse, LogRequest, LogResponse, NodeResponse,
    NodesQuery, NodesResponse, StatusResponse,
};
use signal_core::{
    CognitiveEngine, CognitiveState, FixedRandom, ManualClock, NodeKind, SequentialIds,
    SignalError,
};

fn engine_with(entries: &[(&str, &str, NodeKind)]) -> CognitiveEngine {
    let clock = ManualClock::starting_at(DateTime::from_timestamp_millis(0).unwrap());
    let mut engine = CognitiveEngine::builder("types")
        .clock(clock)
        .ids(SequentialIds::new())
        .random(FixedRandom(0.5))
        .build()
        .unwrap();
    for (decision, outcome, kind) in entries {
        engine.add_node(decision, outcome, *kind);
    }
    engine
}

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_deserialization() {
    let json = r#"{"status":"healthy","version":"1.0.0"}"#;
    let health: HealthResponse = serde_json::from_str(json).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, "1.0.0");
}

// =============================================================================
// STATUS RESPONSE TESTS
// =============================================================================

#[test]
fn test_status_from_fresh_state() {
    let state = CognitiveState::new(
        uuid::Uuid::nil(),
        "alice",
        DateTime::from_timestamp_millis(0).unwrap(),
    );
    let status = StatusResponse::from_state(&state, 0, true);
    assert_eq!(status.user_id, "alice");
    assert_eq!(status.node_count, 0);
    assert_eq!(status.synaptic_efficiency, 0.5);
    assert_eq!(status.temporal_alignment, 0.65);
    assert_eq!(status.last_updated, "1970-01-01T00:00:00+00:00");
    assert!(status.persistent);
}

#[test]
fn test_status_field_names() {
    let state = CognitiveState::new(
        uuid::Uuid::nil(),
        "alice",
        DateTime::from_timestamp_millis(0).unwrap(),
    );
    let json = serde_json::to_value(StatusResponse::from_state(&state, 2, false)).unwrap();
    for field in [
        "user_id",
        "node_count",
        "edge_count",
        "pattern_count",
        "synaptic_efficiency",
        "temporal_alignment",
        "last_updated",
        "persistent",
    ] {
        assert!(json.get(field).is_some(), "missing {field}");
    }
}

// =============================================================================
// LOG REQUEST TESTS
// =============================================================================

#[test]
fn test_log_request_validate() {
    let request: LogRequest = serde_json::from_str(
        r#"{"decision":"Ship beta","outcome":"done","kind":"DELUSION"}"#,
    )
    .unwrap();
    assert_eq!(request.validate().unwrap(), NodeKind::Delusion);
}

#[test]
fn test_log_request_type_alias() {
    let request: LogRequest =
        serde_json::from_str(r#"{"decision":"a","outcome":"b","type":"failure"}"#).unwrap();
    assert_eq!(request.kind, "failure");
}

#[test]
fn test_log_request_rejects_blank_and_oversized() {
    let blank = LogRequest {
        decision: "ok".to_string(),
        outcome: " \t".to_string(),
        kind: "success".to_string(),
    };
    assert!(matches!(blank.validate(), Err(SignalError::InvalidInput(_))));

    let oversized = LogRequest {
        decision: "x".repeat(65537),
        outcome: "ok".to_string(),
        kind: "success".to_string(),
    };
    assert!(matches!(
        oversized.validate(),
        Err(SignalError::InvalidInput(_))
    ));

    let exact = LogRequest {
        decision: "x".repeat(65536),
        outcome: "ok".to_string(),
        kind: "success".to_string(),
    };
    assert!(exact.validate().is_ok());
}

#[test]
fn test_log_request_unknown_kind() {
    let request = LogRequest {
        decision: "a".to_string(),
        outcome: "b".to_string(),
        kind: "guess".to_string(),
    };
    assert!(matches!(request.validate(), Err(SignalError::InvalidKind(_))));
}

// =============================================================================
// LOG RESPONSE TESTS
// =============================================================================

#[test]
fn test_log_response_error() {
    let response = LogResponse::error("nope");
    assert!(!response.success);
    assert!(response.node.is_none());

    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains(r#""node":null"#));
    assert!(json.contains(r#""error":"nope""#));
}

#[test]
fn test_log_response_success_serializes_node() {
    let mut engine = engine_with(&[]);
    let node = engine.add_node("Launch beta", "signups increased", NodeKind::Success);
    let json = serde_json::to_value(LogResponse::success(node.clone())).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["node"]["kind"], "success");
    assert_eq!(json["node"]["id"], node.id.to_string());
    assert!(json["node"]["caused_by"].as_array().unwrap().is_empty());
}

// =============================================================================
// NODE SELECTION TESTS
// =============================================================================

#[test]
fn test_nodes_select_without_filters() {
    let engine = engine_with(&[
        ("Fix login", "failed", NodeKind::Failure),
        ("Launch blog", "ok", NodeKind::Success),
    ]);
    let listing = NodesResponse::select(engine.nodes(), &NodesQuery::default()).unwrap();
    assert_eq!(listing.total, 2);
    assert_eq!(listing.nodes.len(), 2);
}

#[test]
fn test_nodes_select_limit_keeps_latest() {
    let engine = engine_with(&[
        ("One", "ok", NodeKind::Insight),
        ("Two", "ok", NodeKind::Insight),
        ("Three", "ok", NodeKind::Insight),
    ]);
    let query = NodesQuery {
        limit: Some(2),
        kind: None,
    };
    let listing = NodesResponse::select(engine.nodes(), &query).unwrap();
    let decisions: Vec<&str> = listing.nodes.iter().map(|n| n.decision.as_str()).collect();
    assert_eq!(decisions, ["Two", "Three"]);
    assert_eq!(listing.total, 3);

    let zero = NodesQuery {
        limit: Some(0),
        kind: None,
    };
    assert!(NodesResponse::select(engine.nodes(), &zero).unwrap().nodes.is_empty());
}

#[test]
fn test_nodes_query_from_json() {
    let query: NodesQuery = serde_json::from_str(r#"{"kind":"failure"}"#).unwrap();
    assert_eq!(query.kind.as_deref(), Some("failure"));
    assert!(query.limit.is_none());
}

#[test]
fn test_node_response_unknown_id() {
    let engine = engine_with(&[("One", "ok", NodeKind::Insight)]);
    let missing = "ffffffff-ffff-4fff-bfff-ffffffffffff".parse().unwrap();
    assert!(matches!(
        NodeResponse::build(&engine, missing),
        Err(SignalError::NodeNotFound(_))
    ));
}

// =============================================================================
// EXPORT & HASH RESPONSE TESTS
// =============================================================================

#[test]
fn test_export_response_success_is_base64() {
    let response = ExportResponse::success(vec![0x46, 0x53, 0x49, 0x47, 0x01], 42);
    assert!(response.success);
    assert_eq!(response.data.as_deref(), Some("RlNJRwE="));
    assert_eq!(response.checksum, Some(42));
    assert!(response.error.is_none());
}

#[test]
fn test_export_response_error() {
    let response = ExportResponse::error("Export failed");
    assert!(!response.success);
    assert!(response.data.is_none());
    assert!(response.checksum.is_none());
}

#[test]
fn test_hash_response_shapes() {
    let ok = HashResponse::success("ab".repeat(32), 7);
    assert_eq!(ok.algorithm, "blake3");
    assert_eq!(ok.node_count, 7);

    let err: HashResponse =
        serde_json::from_str(&serde_json::to_string(&HashResponse::error("boom")).unwrap())
            .unwrap();
    assert!(!err.success);
    assert_eq!(err.error.as_deref(), Some("boom"));
}
