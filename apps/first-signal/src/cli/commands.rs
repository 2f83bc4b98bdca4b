//! # CLI Command Implementations

use super::Backend;
use crate::api::{self, AppState, NodeResponse, NodesQuery, NodesResponse, StatusResponse};
use serde::Serialize;
use signal_core::{
    CognitiveEngine, CognitiveState, EngineConfig, NodeKind, Session, SignalError,
    formats::MAX_PERSISTENCE_PAYLOAD_SIZE, snapshot_checksum, state_crypto_hash, state_from_bytes,
    state_to_bytes,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a state file or import.
const MAX_STATE_FILE_SIZE: u64 = MAX_PERSISTENCE_PAYLOAD_SIZE as u64;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), SignalError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| SignalError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(SignalError::InvalidInput(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, SignalError> {
    let canonical = path.canonicalize().map_err(|e| {
        SignalError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(SignalError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Canonicalize the parent directory of an output path.
fn validate_output_path(path: &Path) -> Result<PathBuf, SignalError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        SignalError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(SignalError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| SignalError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// STORE
// =============================================================================

/// Where the log lives and how a fresh engine is configured.
#[derive(Debug, Clone)]
pub struct Store {
    pub path: PathBuf,
    pub backend: Backend,
    /// Owner recorded when a new log is created.
    pub user: String,
    pub engine: EngineConfig,
}

/// Decode an export or file database: binary first, then JSON.
pub fn decode_state(data: &[u8]) -> Result<CognitiveState, SignalError> {
    match state_from_bytes(data) {
        Ok(state) => Ok(state),
        Err(binary_err) => serde_json::from_slice::<CognitiveState>(data).map_err(|json_err| {
            SignalError::DeserializationError(format!(
                "not a binary state ({}) nor a JSON state ({})",
                binary_err, json_err
            ))
        }),
    }
}

/// Load the session at `store.path`, creating an empty one if needed.
pub fn load_or_create_session(store: &Store) -> Result<Session, SignalError> {
    match store.backend {
        Backend::Redb => Session::with_redb(&store.path, &store.user, store.engine.clone()),
        Backend::File => {
            if store.path.exists() {
                validate_file_size(&store.path, MAX_STATE_FILE_SIZE)?;
                let data = std::fs::read(&store.path)
                    .map_err(|e| SignalError::IoError(format!("Read db: {}", e)))?;
                let state = decode_state(&data)?;
                if state.user_id != store.user {
                    tracing::debug!(
                        stored = %state.user_id,
                        requested = %store.user,
                        "keeping stored user"
                    );
                }
                let engine = CognitiveEngine::from_state(state, store.engine.clone())?;
                Ok(Session::new(engine))
            } else {
                let engine = CognitiveEngine::builder(store.user.as_str())
                    .config(store.engine.clone())
                    .build()?;
                Ok(Session::new(engine))
            }
        }
    }
}

/// Write a file-backed session; redb sessions are already durable.
pub fn save_session(store: &Store, session: &Session) -> Result<(), SignalError> {
    if session.is_persistent() {
        return Ok(());
    }
    let data = state_to_bytes(session.engine().state())?;
    std::fs::write(&store.path, &data)
        .map_err(|e| SignalError::IoError(format!("Write db: {}", e)))
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(store: &Store, host: &str, port: u16) -> Result<(), SignalError> {
    let session = load_or_create_session(store)?;

    println!("First Signal Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Backend:  {}", store.backend.as_str());
    println!("  Database: {:?}", store.path);
    println!();
    println!("Endpoints:");
    println!("  POST /nodes      - Log a decision");
    println!("  GET  /nodes      - List nodes");
    println!("  GET  /nodes/{{id}} - Node detail");
    println!("  GET  /patterns   - Emergent patterns");
    println!("  GET  /state      - Cognitive state");
    println!("  GET  /snapshot   - State + metrics");
    println!("  GET  /status     - Counters");
    println!("  GET  /health     - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state = AppState::new(session);
    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, state.clone()).await?;

    let session = state.session.read().await;
    save_session(store, &session)?;
    if !session.is_persistent() {
        tracing::info!(path = ?store.path, "saved state file");
    }
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show counters and rolling metrics.
pub fn cmd_status(store: &Store, json_mode: bool) -> Result<(), SignalError> {
    let session = load_or_create_session(store)?;
    let engine = session.engine();
    let status = StatusResponse::from_state(
        engine.state(),
        engine.emergent_patterns().len(),
        session.is_persistent(),
    );

    if json_mode {
        print_json(&status);
        return Ok(());
    }

    println!("First Signal Status");
    println!("===================");
    println!("Database: {:?}", store.path);
    println!("Backend:  {}", store.backend.as_str());
    println!("User:     {}", status.user_id);
    println!();
    println!("Nodes:               {}", status.node_count);
    println!("Edges:               {}", status.edge_count);
    println!("Patterns:            {}", status.pattern_count);
    println!("Synaptic efficiency: {:.3}", status.synaptic_efficiency);
    println!("Temporal alignment:  {:.3}", status.temporal_alignment);
    println!("Last updated:        {}", status.last_updated);

    Ok(())
}

// =============================================================================
// LOG COMMAND
// =============================================================================

/// Record one decision.
pub fn cmd_log(
    store: &Store,
    json_mode: bool,
    decision: &str,
    outcome: &str,
    kind: NodeKind,
) -> Result<(), SignalError> {
    let mut session = load_or_create_session(store)?;
    let node = session.log_decision(decision, outcome, kind)?;
    save_session(store, &session)?;

    if json_mode {
        print_json(&node);
        return Ok(());
    }

    println!("Logged {} ({})", node.id, node.kind);
    println!("  Synaptic score: {:.3}", node.synaptic_score);
    println!("  Complexity:     {:.3}", node.complexity);
    println!("  Impact:         {:.3}", node.impact_score);
    println!("  Confidence:     {:.3}", node.confidence);
    if node.caused_by.is_empty() {
        println!("  No predecessors");
    } else {
        println!("  Caused by:");
        for id in &node.caused_by {
            println!("    {}", id);
        }
    }

    let state = session.engine().state();
    println!();
    println!(
        "Synaptic efficiency {:.3}, temporal alignment {:.3}",
        state.synaptic_efficiency, state.temporal_alignment
    );

    Ok(())
}

// =============================================================================
// NODES COMMANDS
// =============================================================================

/// List nodes, oldest first.
pub fn cmd_nodes(
    store: &Store,
    json_mode: bool,
    verbose: bool,
    kind: Option<String>,
    limit: Option<usize>,
) -> Result<(), SignalError> {
    let session = load_or_create_session(store)?;
    let listing = NodesResponse::select(session.engine().nodes(), &NodesQuery { limit, kind })?;

    if json_mode {
        print_json(&listing);
        return Ok(());
    }

    if listing.nodes.is_empty() {
        println!("No nodes");
        return Ok(());
    }

    println!(
        "Showing {} of {} node(s):",
        listing.nodes.len(),
        listing.total
    );
    for node in &listing.nodes {
        println!(
            "  {}  {:<8}  score {:.3}  impact {:.2}  conf {:.2}  links {}/{}  {}",
            node.id,
            node.kind.as_str(),
            node.synaptic_score,
            node.impact_score,
            node.confidence,
            node.caused_by.len(),
            node.caused_nodes.len(),
            node.decision
        );
        if verbose {
            println!("      outcome: {}", node.outcome);
            println!("      at:      {}", node.timestamp.to_rfc3339());
        }
    }

    Ok(())
}

/// Show one node with its world-model entry.
pub fn cmd_node(store: &Store, json_mode: bool, verbose: bool, id: &str) -> Result<(), SignalError> {
    let session = load_or_create_session(store)?;
    let view = NodeResponse::build(session.engine(), id.parse()?)?;

    if json_mode {
        print_json(&view);
        return Ok(());
    }

    let node = &view.node;
    println!("Node {}", node.id);
    println!("  Kind:       {}", node.kind);
    println!("  Decision:   {}", node.decision);
    println!("  Outcome:    {}", node.outcome);
    println!("  At:         {}", node.timestamp.to_rfc3339());
    println!("  Score:      {:.3} (bias-adjusted {:.3})", node.synaptic_score, view.bias_adjusted_score);
    println!("  Decay:      {:.3}", view.temporal_decay);
    println!("  Caused by:  {}", node.caused_by.len());
    println!("  Caused:     {}", node.caused_nodes.len());

    if let Some(entry) = &view.world_model {
        let sections: [(&str, &[String]); 4] = [
            ("Learnings", &entry.learnings),
            ("Patterns", &entry.patterns),
            ("Risks", &entry.risk_factors),
            ("Opportunities", &entry.opportunities),
        ];
        for (label, items) in sections {
            if !items.is_empty() {
                println!("  {}: {}", label, items.join(", "));
            }
        }
        if verbose && !entry.connections.is_empty() {
            println!("  Connections:");
            for id in &entry.connections {
                println!("    {}", id);
            }
        }
    }

    Ok(())
}

// =============================================================================
// PATTERNS COMMAND
// =============================================================================

/// Show emergent patterns.
pub fn cmd_patterns(store: &Store, json_mode: bool, top: Option<usize>) -> Result<(), SignalError> {
    let session = load_or_create_session(store)?;
    let mut patterns = session.engine().emergent_patterns().into_vec();
    if let Some(top) = top {
        patterns.truncate(top);
    }

    if json_mode {
        print_json(&patterns);
        return Ok(());
    }

    if patterns.is_empty() {
        println!("No patterns yet");
        return Ok(());
    }

    println!("Emergent patterns:");
    for p in &patterns {
        println!(
            "  {:<40}  x{:<4}  impact {:.2}  confidence {:.2}",
            p.pattern, p.frequency, p.impact, p.confidence
        );
    }

    Ok(())
}

// =============================================================================
// SNAPSHOT COMMAND
// =============================================================================

/// Print the JSON snapshot, or write it to `output`.
pub fn cmd_snapshot(store: &Store, output: Option<&Path>) -> Result<(), SignalError> {
    let session = load_or_create_session(store)?;
    let snapshot = session.snapshot();
    let data = serde_json::to_vec_pretty(&snapshot)
        .map_err(|e| SignalError::SerializationError(e.to_string()))?;

    match output {
        Some(path) => {
            let validated = validate_output_path(path)?;
            std::fs::write(&validated, &data)
                .map_err(|e| SignalError::IoError(format!("Write file: {}", e)))?;
            println!("Wrote snapshot ({} bytes) to {:?}", data.len(), validated);
            println!("Checksum: {}", snapshot.checksum);
        }
        None => println!("{}", String::from_utf8_lossy(&data)),
    }

    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Export the state as binary or JSON.
pub fn cmd_export(store: &Store, output: &Path, format: &str) -> Result<(), SignalError> {
    let validated_output = validate_output_path(output)?;
    let session = load_or_create_session(store)?;
    let state = session.engine().state();

    let data = match format {
        "binary" => {
            let data = state_to_bytes(state)?;
            println!("Checksum: {}", snapshot_checksum(state));
            data
        }
        "json" => serde_json::to_vec_pretty(state)
            .map_err(|e| SignalError::SerializationError(e.to_string()))?,
        _ => {
            return Err(SignalError::InvalidInput(format!(
                "Unknown format: {}. Use: binary, json",
                format
            )));
        }
    };

    std::fs::write(&validated_output, &data)
        .map_err(|e| SignalError::IoError(format!("Write file: {}", e)))?;

    println!("Exported {} bytes to {:?}", data.len(), validated_output);

    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Replace the stored state with an export.
pub fn cmd_import(store: &Store, input: &Path) -> Result<(), SignalError> {
    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_STATE_FILE_SIZE)?;

    let data = std::fs::read(&validated_path)
        .map_err(|e| SignalError::IoError(format!("Read file: {}", e)))?;
    let state = decode_state(&data)?;

    let mut session = load_or_create_session(store)?;
    session.replace_state(state)?;
    save_session(store, &session)?;

    let state = session.engine().state();
    println!(
        "Imported state for {}: {} nodes, {} edges",
        state.user_id,
        state.nodes.len(),
        state.edge_count()
    );

    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new database.
pub fn cmd_init(store: &Store, force: bool) -> Result<(), SignalError> {
    if store.path.exists() {
        if !force {
            return Err(SignalError::InvalidInput(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(&store.path)
            .map_err(|e| SignalError::IoError(format!("Remove db: {}", e)))?;
    }

    let session = load_or_create_session(store)?;
    save_session(store, &session)?;
    println!(
        "Initialized new {} database at {:?} for {}",
        store.backend.as_str(),
        store.path,
        session.engine().state().user_id
    );

    Ok(())
}

// =============================================================================
// HASH COMMAND
// =============================================================================

/// BLAKE3 digest of the binary state.
pub fn cmd_hash(store: &Store, json_mode: bool) -> Result<(), SignalError> {
    let session = load_or_create_session(store)?;
    let state = session.engine().state();
    let hash = state_crypto_hash(state)?;
    let checksum = snapshot_checksum(state);

    if json_mode {
        print_json(&serde_json::json!({
            "hash": hash,
            "algorithm": "blake3",
            "checksum": checksum,
            "node_count": state.nodes.len(),
        }));
        return Ok(());
    }

    println!("BLAKE3:   {}", hash);
    println!("Checksum: {}", checksum);
    println!("Nodes:    {}", state.nodes.len());

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir, backend: Backend, name: &str) -> Store {
        Store {
            path: dir.path().join(name),
            backend,
            user: "cli-test".to_string(),
            engine: EngineConfig::default(),
        }
    }

    #[test]
    fn file_backend_persists_between_loads() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir, Backend::File, "state.fsig");

        cmd_log(&store, true, "Launch beta", "signups increased", NodeKind::Success)
            .expect("log");
        cmd_log(&store, true, "Beta onboarding fixes", "done", NodeKind::Insight).expect("log");

        let session = load_or_create_session(&store).expect("load");
        assert_eq!(session.engine().nodes().len(), 2);
        assert_eq!(session.engine().state().user_id, "cli-test");
        assert!(!session.is_persistent());
    }

    #[test]
    fn redb_backend_persists_between_loads() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir, Backend::Redb, "state.redb");

        cmd_log(&store, true, "Fix checkout bug", "failed again", NodeKind::Failure)
            .expect("log");

        let session = load_or_create_session(&store).expect("load");
        assert!(session.is_persistent());
        assert_eq!(session.engine().nodes().len(), 1);
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir, Backend::File, "state.fsig");

        cmd_init(&store, false).expect("init");
        assert!(matches!(
            cmd_init(&store, false),
            Err(SignalError::InvalidInput(_))
        ));
        cmd_init(&store, true).expect("forced init");
    }

    #[test]
    fn export_then_import_across_backends() {
        let dir = TempDir::new().expect("tempdir");
        let source = store(&dir, Backend::File, "source.fsig");
        cmd_log(&source, true, "Refactor billing service", "done", NodeKind::Success)
            .expect("log");
        cmd_log(&source, true, "Billing service alerts", "done", NodeKind::Insight)
            .expect("log");
        let expected = load_or_create_session(&source).expect("load").cognitive_state();

        let binary = dir.path().join("export.fsig");
        cmd_export(&source, &binary, "binary").expect("export");
        let target = store(&dir, Backend::Redb, "from-binary.redb");
        cmd_import(&target, &binary).expect("import");
        let imported = load_or_create_session(&target).expect("load").cognitive_state();
        assert_eq!(imported, expected);

        // JSON keeps structure; floats go through decimal text.
        let json = dir.path().join("export.json");
        cmd_export(&source, &json, "json").expect("export");
        let target = store(&dir, Backend::File, "from-json.fsig");
        cmd_import(&target, &json).expect("import");
        let imported = load_or_create_session(&target).expect("load").cognitive_state();
        let ids = |s: &CognitiveState| s.nodes.iter().map(|n| n.id).collect::<Vec<_>>();
        assert_eq!(ids(&imported), ids(&expected));
        assert_eq!(imported.nodes[1].caused_by, expected.nodes[1].caused_by);
        assert_eq!(imported.user_id, expected.user_id);
    }

    #[test]
    fn import_of_corrupted_state_is_refused() {
        let dir = TempDir::new().expect("tempdir");
        let target = store(&dir, Backend::Redb, "target.redb");
        cmd_log(&target, true, "Fix checkout bug", "failed again", NodeKind::Failure)
            .expect("log");
        let before = load_or_create_session(&target).expect("load").cognitive_state();

        let mut corrupted = before.clone();
        let id = corrupted.nodes[0].id;
        corrupted.nodes[0].caused_by.push(id);
        corrupted.nodes[0].caused_nodes.push(id);
        let path = dir.path().join("corrupted.json");
        std::fs::write(&path, serde_json::to_vec(&corrupted).expect("json")).expect("write");

        assert!(matches!(
            cmd_import(&target, &path),
            Err(SignalError::InvalidInput(_))
        ));
        let after = load_or_create_session(&target).expect("load").cognitive_state();
        assert_eq!(after, before);
    }

    #[test]
    fn unknown_export_format_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir, Backend::File, "state.fsig");
        let result = cmd_export(&store, &dir.path().join("out"), "yaml");
        assert!(matches!(result, Err(SignalError::InvalidInput(_))));
    }

    #[test]
    fn garbage_is_not_a_state() {
        assert!(matches!(
            decode_state(b"definitely not a state"),
            Err(SignalError::DeserializationError(_))
        ));
    }

    #[test]
    fn output_path_without_directory_uses_cwd() {
        let validated = validate_output_path(Path::new("snapshot.json")).expect("path");
        assert_eq!(validated.file_name().and_then(|f| f.to_str()), Some("snapshot.json"));
    }
}
