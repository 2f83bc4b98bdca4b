//! # Scenario Tiers (S0-S3)
//!
//! End-to-end behavior of the engine through its public API.
//!
//! ## Tiers
//! - S0: Construction defaults
//! - S1: Single insertion scoring
//! - S2: Causal linking
//! - S3: Aggregates, export, persistence and their failure paths

use chrono::DateTime;
use signal_core::{
    CognitiveEngine, EngineConfig, FixedRandom, ManualClock, NodeKind, RedbJournal,
    SequentialIds, Session, SignalError, snapshot_checksum, state_from_bytes, state_to_bytes,
};

const HOUR_MS: i64 = 3_600_000;
const EPS: f64 = 1e-9;

fn engine() -> (CognitiveEngine, ManualClock) {
    let clock = ManualClock::starting_at(DateTime::from_timestamp_millis(1_700_000_000_000).expect("ts"));
    let engine = CognitiveEngine::builder("scenario-user")
        .clock(clock.clone())
        .ids(SequentialIds::new())
        .random(FixedRandom(0.5))
        .build()
        .expect("build");
    (engine, clock)
}

// =============================================================================
// TIER S0: CONSTRUCTION DEFAULTS
// =============================================================================

mod s0_defaults {
    use super::*;
    use signal_core::CognitiveBias;

    /// S0.1: Fresh engines report the documented metric defaults exactly.
    #[test]
    fn fresh_metrics() {
        let (engine, _) = engine();
        let state = engine.cognitive_state();
        assert_eq!(state.synaptic_efficiency, 0.5);
        assert_eq!(state.temporal_alignment, 0.65);
        assert_eq!(state.user_id, "scenario-user");
    }

    /// S0.2: No patterns without nodes.
    #[test]
    fn no_patterns() {
        let (engine, _) = engine();
        assert_eq!(engine.emergent_patterns().iter().count(), 0);
    }

    /// S0.3: The six named biases are present with their defaults.
    #[test]
    fn bias_defaults() {
        let (engine, _) = engine();
        let profile = &engine.state().bias_profile;
        let expected = [
            (CognitiveBias::ConfirmationBias, 0.3),
            (CognitiveBias::AvailabilityHeuristic, 0.4),
            (CognitiveBias::Anchoring, 0.35),
            (CognitiveBias::OptimismBias, 0.25),
            (CognitiveBias::DunningKruger, 0.2),
            (CognitiveBias::SurvivorshipBias, 0.15),
        ];
        for (bias, strength) in expected {
            assert!((profile.strength(bias) - strength).abs() < EPS);
        }
    }
}

// =============================================================================
// TIER S1: SINGLE INSERTION
// =============================================================================

mod s1_single_insertion {
    use super::*;

    /// S1.1: Launch scenario impact and efficiency.
    #[test]
    fn launch_scenario() {
        let (mut engine, _) = engine();
        let node = engine.add_node("Launched X", "Users increased by 15%", NodeKind::Success);
        assert!((node.impact_score - 0.8).abs() < EPS);
        assert!((engine.state().synaptic_efficiency - node.synaptic_score).abs() < EPS);
    }

    /// S1.2: Hedged delusions land well below the base confidence.
    #[test]
    fn hedged_delusion_confidence() {
        let (mut engine, _) = engine();
        let node = engine.add_node(
            "Maybe the market will come to us",
            "perhaps next quarter",
            NodeKind::Delusion,
        );
        assert!(node.confidence <= 0.7 - 0.05 - 0.2 + EPS);
        assert!(node.confidence >= 0.1);
    }

    /// S1.3: Identical calls create distinct nodes.
    #[test]
    fn insertion_is_not_idempotent() {
        let (mut engine, _) = engine();
        let a = engine.add_node("Ship it", "done", NodeKind::Success);
        let b = engine.add_node("Ship it", "done", NodeKind::Success);
        assert_ne!(a.id, b.id);
        assert_eq!(engine.nodes().len(), 2);
    }

    /// S1.4: The validating entry point rejects blank text.
    #[test]
    fn blank_text_rejected() {
        let (mut engine, _) = engine();
        let result = engine.try_add_node("ok", "\n\t ", NodeKind::Insight);
        assert!(matches!(result, Err(SignalError::InvalidInput(_))));
    }
}

// =============================================================================
// TIER S2: CAUSAL LINKING
// =============================================================================

mod s2_causal_linking {
    use super::*;
    use signal_core::causal::{candidate_window, find_unmirrored_edge};

    /// S2.1: The eleventh insertion never links to the first node.
    #[test]
    fn eleventh_node_ignores_first() {
        let (mut engine, _) = engine();
        let ids: Vec<_> = (0..11)
            .map(|_| {
                engine
                    .add_node("Tune recommendation model weights", "done", NodeKind::Insight)
                    .id
            })
            .collect();

        let eleventh = engine.node(ids[10]).expect("node");
        assert_eq!(eleventh.caused_by.len(), 3);
        assert!(!eleventh.caused_by.contains(&ids[0]));
        assert!(!engine.node(ids[0]).expect("node").caused_nodes.contains(&ids[10]));

        // With 11 nodes already logged, the first is outside the window.
        assert!(!candidate_window(11, 10).contains(&0));
    }

    /// S2.2: Two shared keywords link across hours; one does not.
    #[test]
    fn linking_depends_on_overlap_and_age() {
        let (mut engine, clock) = engine();
        let root = engine.add_node("Migrate billing service", "done", NodeKind::Success);
        clock.advance_millis(5 * HOUR_MS);

        let strong = engine.add_node("Billing service cleanup", "done", NodeKind::Success);
        assert_eq!(strong.caused_by, vec![root.id]);

        clock.advance_millis(5 * HOUR_MS);
        let weak = engine.add_node("Migrate analytics", "done", NodeKind::Failure);
        assert!(weak.caused_by.is_empty());
    }

    /// S2.3: Mirroring holds over a mixed log.
    #[test]
    fn mirroring_holds() {
        let (mut engine, clock) = engine();
        for (i, decision) in [
            "Launch referral program",
            "Referral program tweaks",
            "Optimize referral funnel",
            "Debug referral tracking",
            "Launch partner program",
        ]
        .iter()
        .enumerate()
        {
            clock.advance_millis(i as i64 * 60_000);
            engine.add_node(decision, "done", NodeKind::Success);
        }
        assert_eq!(find_unmirrored_edge(engine.nodes()), None);
        assert!(engine.state().edge_count() > 0);
    }
}

// =============================================================================
// TIER S3: AGGREGATES, EXPORT AND PERSISTENCE
// =============================================================================

mod s3_aggregates {
    use super::*;
    use tempfile::TempDir;

    /// S3.1: Recurring problem-solving failures surface as a pattern.
    #[test]
    fn recurring_failures_form_pattern() {
        let (mut engine, _) = engine();
        engine.add_node("Fix flaky deploys", "failed again", NodeKind::Failure);
        engine.add_node("Debug memory leak", "blocked by tooling", NodeKind::Failure);
        engine.add_node("Launch newsletter", "opens increased", NodeKind::Success);

        let patterns = engine.emergent_patterns();
        let failing = patterns
            .get("failure:problem-solving:simple")
            .expect("pattern");
        assert_eq!(failing.frequency, 2);
        // Patterns are recomputed, never stored.
        assert_eq!(engine.emergent_patterns(), patterns);
    }

    /// S3.2: Metrics keep alignment through a quiet period.
    #[test]
    fn alignment_after_quiet_period() {
        let (mut engine, clock) = engine();
        engine.add_node("Launch beta", "ok", NodeKind::Success);
        engine.add_node("Fix onboarding", "failed", NodeKind::Failure);
        // 0.4 + 0.5 * 0.5 + 0.1
        assert!((engine.state().temporal_alignment - 0.75).abs() < EPS);

        clock.advance_millis(2 * HOUR_MS);
        let metrics = engine.recompute_metrics();
        assert!((metrics.temporal_alignment - 0.75).abs() < EPS);
    }

    /// S3.3: Snapshot carries state, metrics and checksum.
    #[test]
    fn snapshot_contents() {
        let (mut engine, _) = engine();
        engine.add_node("Launch beta", "signups increased", NodeKind::Success);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.metrics.total_nodes, 1);
        assert_eq!(snapshot.checksum, snapshot_checksum(engine.state()));
        assert_eq!(&snapshot.state, engine.state());
    }

    /// S3.4: Binary export restores the exact state.
    #[test]
    fn binary_export_roundtrip() {
        let (mut engine, _) = engine();
        engine.add_node("Refactor billing service", "done", NodeKind::Success);
        engine.add_node("Billing service alerts", "done", NodeKind::Insight);

        let bytes = state_to_bytes(engine.state()).expect("encode");
        let restored = state_from_bytes(&bytes).expect("decode");
        assert_eq!(&restored, engine.state());

        let resumed = CognitiveEngine::from_state(restored, EngineConfig::default()).expect("resume");
        assert_eq!(resumed.nodes().len(), 2);
    }

    /// S3.5: A persistent session survives reopening.
    #[test]
    fn persistent_session_roundtrip() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("signal.redb");

        let before = {
            let mut session =
                Session::with_redb(&path, "alice", EngineConfig::default()).expect("open");
            session
                .log_decision("Launch beta", "signups increased", NodeKind::Success)
                .expect("log");
            session.cognitive_state()
        };

        let session = Session::with_redb(&path, "ignored", EngineConfig::default()).expect("reopen");
        assert_eq!(session.cognitive_state(), before);
        assert_eq!(session.cognitive_state().user_id, "alice");
    }

    /// S3.6: An import that breaks the edge or score rules is refused and
    /// the current log is kept.
    #[test]
    fn corrupted_import_is_refused() {
        let (mut engine, _) = engine();
        engine.add_node("Refactor billing service", "done", NodeKind::Success);
        engine.add_node("Billing service alerts", "done", NodeKind::Insight);

        let mut corrupted = engine.cognitive_state();
        let first = corrupted.nodes[0].id;
        corrupted.nodes[0].caused_by.push(first);
        corrupted.nodes[0].synaptic_score = 7.0;
        let copy = corrupted.nodes[1].clone();
        corrupted.nodes.push(copy);

        // The encoding itself is well formed; adoption is what fails.
        let bytes = state_to_bytes(&corrupted).expect("encode");
        let decoded = state_from_bytes(&bytes).expect("decode");
        assert!(matches!(
            CognitiveEngine::from_state(decoded.clone(), EngineConfig::default()),
            Err(SignalError::InvalidInput(_))
        ));

        let mut session = Session::new(engine);
        let before = session.cognitive_state();
        assert!(session.replace_state(decoded).is_err());
        assert_eq!(session.cognitive_state(), before);
        assert!((0.0..=1.0).contains(&session.cognitive_state().synaptic_efficiency));

        // A header that no longer describes its payload is refused.
        let mut tampered = state_to_bytes(&before).expect("encode");
        tampered[13] ^= 0x01;
        assert!(matches!(
            state_from_bytes(&tampered),
            Err(SignalError::DeserializationError(_))
        ));
    }

    /// S3.7: A journal that missed a write catches up on the next one.
    #[test]
    fn journal_recovers_after_missed_write() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("signal.redb");
        let (mut engine, _) = engine();
        {
            let mut journal = RedbJournal::open(&path).expect("open");
            let first = engine.insert("Refactor billing service", "done", NodeKind::Success);
            journal.record(engine.state(), &first).expect("record");

            engine.insert("Billing service alerts", "done", NodeKind::Insight);
            journal.mark_dirty();

            let third = engine.insert("Billing service costs", "done", NodeKind::Failure);
            assert_eq!(third.node.caused_by.len(), 2);
            journal.record(engine.state(), &third).expect("record");
        }

        let session = Session::with_redb(&path, "ignored", EngineConfig::default()).expect("reopen");
        assert_eq!(&session.cognitive_state(), engine.state());
        assert!(session.cognitive_state().validate().is_ok());
    }

    /// S3.8: A bounded log reopens with exactly the retained nodes.
    #[test]
    fn bounded_session_reopens_after_eviction() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("signal.redb");
        let config = EngineConfig {
            max_nodes: Some(3),
            ..EngineConfig::default()
        };

        let before = {
            let mut session = Session::with_redb(&path, "alice", config.clone()).expect("open");
            for step in ["draft", "review", "launch", "measure", "iterate"] {
                session
                    .log_decision(&format!("pricing page {step}"), "done", NodeKind::Success)
                    .expect("log");
            }
            session.cognitive_state()
        };
        assert_eq!(before.nodes.len(), 3);
        assert_eq!(before.nodes[0].decision, "pricing page launch");

        let mut session = Session::with_redb(&path, "alice", config).expect("reopen");
        assert_eq!(session.cognitive_state(), before);
        assert!(session.cognitive_state().validate().is_ok());

        session
            .log_decision("pricing page rollback", "done", NodeKind::Failure)
            .expect("log");
        let after = session.cognitive_state();
        assert_eq!(after.nodes.len(), 3);
        assert_eq!(after.nodes[0].decision, "pricing page measure");
        assert!(after.validate().is_ok());
    }
}
