// Evaluation engine: every rule against every chord.
//
// For each chord position the engine builds the window (previous chord or
// Boundary, current chord, next chord or Boundary), runs every rule of the
// registry on it, and records a `Violation` for each rule that returns
// false. Nothing is short-circuited: all rules run on all chords.
//
// Violations are kept ordered by (chord index, registry position), which is
// the natural order of the sequential loop. The parallel variant spreads
// chord positions across rayon's pool and sorts by the same key, so both
// produce identical output.

use crate::chord::ChordSequence;
use crate::rules::RuleRegistry;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

/// The message list of an evaluation without violations.
pub const NO_ERRORS: &str = "No errors";

/// One failed rule at one chord.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub rule: &'static str,
    /// Position of the rule in the registry that produced this violation.
    pub rule_position: usize,
    /// 1-based chord index.
    pub chord_index: usize,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed for chord {}", self.rule, self.chord_index)
    }
}

/// Result of running a registry over a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub violations: Vec<Violation>,
    pub chords_checked: usize,
    pub rules_run: usize,
}

impl Evaluation {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Human-readable messages, or the single "No errors" sentinel.
    pub fn messages(&self) -> Vec<String> {
        if self.violations.is_empty() {
            vec![NO_ERRORS.to_string()]
        } else {
            self.violations.iter().map(|v| v.to_string()).collect()
        }
    }

    /// Violations at one 1-based chord index.
    pub fn at_chord(&self, chord_index: usize) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(move |v| v.chord_index == chord_index)
    }
}

fn check_position(seq: &ChordSequence, registry: &RuleRegistry, index: usize) -> Vec<Violation> {
    let Some(window) = seq.window(index) else {
        return Vec::new();
    };
    registry
        .iter()
        .enumerate()
        .filter(|(_, rule)| !rule.evaluate(&window))
        .map(|(position, rule)| {
            debug!(rule = rule.name, chord = index + 1, "rule failed");
            Violation {
                rule: rule.name,
                rule_position: position,
                chord_index: index + 1,
            }
        })
        .collect()
}

/// Run every rule against every chord, in order.
pub fn evaluate(seq: &ChordSequence, registry: &RuleRegistry) -> Evaluation {
    let violations: Vec<Violation> = (0..seq.len())
        .flat_map(|i| check_position(seq, registry, i))
        .collect();
    finish(seq, registry, violations)
}

/// Same result as [`evaluate`], with chord positions checked on the rayon
/// thread pool.
pub fn evaluate_parallel(seq: &ChordSequence, registry: &RuleRegistry) -> Evaluation {
    let mut violations: Vec<Violation> = (0..seq.len())
        .into_par_iter()
        .flat_map_iter(|i| check_position(seq, registry, i))
        .collect();
    violations.sort_by_key(|v| (v.chord_index, v.rule_position));
    finish(seq, registry, violations)
}

fn finish(seq: &ChordSequence, registry: &RuleRegistry, violations: Vec<Violation>) -> Evaluation {
    info!(
        chords = seq.len(),
        rules = registry.len(),
        violations = violations.len(),
        "evaluation complete"
    );
    Evaluation {
        violations,
        chords_checked: seq.len(),
        rules_run: registry.len(),
    }
}
