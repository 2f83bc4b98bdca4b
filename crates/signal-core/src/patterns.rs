//! # Emergent Patterns
//!
//! Groups nodes by a `kind:theme:complexity` signature and keeps the groups
//! that recur (frequency > 1) or carry high mean impact (> 0.7), ranked by
//! frequency × mean impact.
//!
//! Mining is a pure read over the log. The result is recomputed on every
//! request and never stored.

use crate::lexicon::DecisionTheme;
use crate::primitives::COMPLEX_THRESHOLD;
use crate::{CausalNode, EmergentPattern};
use std::collections::BTreeMap;

/// Mean impact above which a single occurrence is already significant.
pub const SIGNIFICANT_IMPACT: f64 = 0.7;

/// Complexity bucket of a node.
#[must_use]
pub fn complexity_bucket(complexity: f64) -> &'static str {
    if complexity > COMPLEX_THRESHOLD {
        "complex"
    } else {
        "simple"
    }
}

/// Pattern signature of one node, e.g. `success:initiation:simple`.
#[must_use]
pub fn signature(node: &CausalNode) -> String {
    format!(
        "{}:{}:{}",
        node.kind,
        DecisionTheme::classify(&node.decision),
        complexity_bucket(node.complexity)
    )
}

/// Ranked emergent patterns over a node log.
///
/// Finite and restartable: `iter()` may be called any number of times.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmergentPatterns {
    ranked: Vec<EmergentPattern>,
}

#[derive(Default)]
struct Group {
    frequency: usize,
    impact_sum: f64,
    confidence_sum: f64,
}

impl EmergentPatterns {
    /// Mine patterns from a node log.
    #[must_use]
    pub fn mine(nodes: &[CausalNode]) -> Self {
        let mut groups: BTreeMap<String, Group> = BTreeMap::new();
        for node in nodes {
            let group = groups.entry(signature(node)).or_default();
            group.frequency += 1;
            group.impact_sum += node.impact_score;
            group.confidence_sum += node.confidence;
        }

        let mut ranked: Vec<EmergentPattern> = groups
            .into_iter()
            .map(|(pattern, g)| EmergentPattern {
                pattern,
                frequency: g.frequency,
                impact: g.impact_sum / g.frequency as f64,
                confidence: g.confidence_sum / g.frequency as f64,
            })
            .filter(|p| p.frequency > 1 || p.impact > SIGNIFICANT_IMPACT)
            .collect();

        // Stable: equal weights keep signature order.
        ranked.sort_by(|a, b| b.weight().total_cmp(&a.weight()));
        Self { ranked }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EmergentPattern> {
        self.ranked.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Look up a pattern by signature.
    #[must_use]
    pub fn get(&self, pattern: &str) -> Option<&EmergentPattern> {
        self.ranked.iter().find(|p| p.pattern == pattern)
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<EmergentPattern> {
        self.ranked
    }
}

impl IntoIterator for EmergentPatterns {
    type Item = EmergentPattern;
    type IntoIter = std::vec::IntoIter<EmergentPattern>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranked.into_iter()
    }
}

impl<'a> IntoIterator for &'a EmergentPatterns {
    type Item = &'a EmergentPattern;
    type IntoIter = std::slice::Iter<'a, EmergentPattern>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranked.iter()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NodeId, NodeKind};
    use chrono::DateTime;
    use uuid::Uuid;

    const EPS: f64 = 1e-9;

    fn node(n: u128, kind: NodeKind, decision: &str, complexity: f64, impact: f64) -> CausalNode {
        CausalNode {
            id: NodeId(Uuid::from_u128(n)),
            decision: decision.to_string(),
            outcome: "o".to_string(),
            timestamp: DateTime::from_timestamp_millis(n as i64).expect("ts"),
            kind,
            synaptic_score: 0.5,
            complexity,
            impact_score: impact,
            confidence: 0.7,
            caused_by: Vec::new(),
            caused_nodes: Vec::new(),
        }
    }

    #[test]
    fn empty_log_has_no_patterns() {
        assert!(EmergentPatterns::mine(&[]).is_empty());
    }

    #[test]
    fn signature_combines_kind_theme_and_bucket() {
        let n = node(1, NodeKind::Failure, "Fix login bug", 0.65, 0.3);
        assert_eq!(signature(&n), "failure:problem-solving:complex");
        assert_eq!(complexity_bucket(0.6), "simple");
    }

    #[test]
    fn singletons_need_high_impact() {
        let nodes = vec![
            node(1, NodeKind::Success, "Launch beta", 0.1, 0.8),
            node(2, NodeKind::Failure, "Debug cache", 0.1, 0.3),
        ];
        let patterns = EmergentPatterns::mine(&nodes);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns.iter().next().expect("one").pattern, "success:initiation:simple");
    }

    #[test]
    fn groups_ranked_by_frequency_times_impact() {
        let nodes = vec![
            node(1, NodeKind::Failure, "Debug cache", 0.1, 0.3),
            node(2, NodeKind::Failure, "Debug queue", 0.1, 0.5),
            node(3, NodeKind::Failure, "Fix parser", 0.1, 0.4),
            node(4, NodeKind::Success, "Launch beta", 0.1, 0.9),
        ];
        let patterns: Vec<EmergentPattern> = EmergentPatterns::mine(&nodes).into_vec();
        assert_eq!(patterns.len(), 2);
        // 3 × 0.4 = 1.2 beats 1 × 0.9
        assert_eq!(patterns[0].pattern, "failure:problem-solving:simple");
        assert_eq!(patterns[0].frequency, 3);
        assert!((patterns[0].impact - 0.4).abs() < EPS);
        assert!((patterns[0].confidence - 0.7).abs() < EPS);
        assert_eq!(patterns[1].pattern, "success:initiation:simple");
    }

    #[test]
    fn iteration_is_restartable() {
        let nodes = vec![
            node(1, NodeKind::Insight, "Study churn", 0.9, 0.9),
            node(2, NodeKind::Insight, "Research churn", 0.9, 0.9),
        ];
        let patterns = EmergentPatterns::mine(&nodes);
        let first: Vec<_> = patterns.iter().cloned().collect();
        let second: Vec<_> = (&patterns).into_iter().cloned().collect();
        assert_eq!(first, second);
        assert!(patterns.get("insight:analysis:complex").is_some());
    }
}
