// Self-test: run every rule on its own embedded examples.
//
// Each `RuleExample` names a key and up to three soprano-first voicings.
// The example is built into real chords (sharing one key, like a sequence
// would), the rule is evaluated on the resulting window, and the outcome is
// compared with the expected result. An example that cannot even be built
// counts as a failure with the build error attached.

use crate::chord::{Chord, Neighbor, Window};
use crate::error::{Error, PreprocessingError, Result};
use crate::rules::{Rule, RuleExample, RuleRegistry};
use chorale_theory::Key;
use chorale_theory::pitch::parse_pitches;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of one example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleOutcome {
    pub rule: &'static str,
    /// 1-based position of the example within its rule.
    pub example: usize,
    pub expected: bool,
    /// `None` when the example could not be built.
    pub actual: Option<bool>,
    pub error: Option<String>,
}

impl ExampleOutcome {
    pub fn passed(&self) -> bool {
        self.actual == Some(self.expected)
    }
}

impl fmt::Display for ExampleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed() { "ok" } else { "FAILED" };
        write!(f, "{} example {}: {status}", self.rule, self.example)?;
        match (&self.actual, &self.error) {
            (_, Some(err)) => write!(f, " ({err})"),
            (Some(actual), None) if !self.passed() => {
                write!(f, " (expected {}, got {actual})", self.expected)
            }
            _ => Ok(()),
        }
    }
}

/// All outcomes of a self-test run.
#[derive(Debug, Clone, Default)]
pub struct SelfTestReport {
    pub outcomes: Vec<ExampleOutcome>,
}

impl SelfTestReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ExampleOutcome> {
        self.outcomes.iter().filter(|o| !o.passed())
    }

    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(ExampleOutcome::passed)
    }
}

/// Run the examples of every rule in the registry.
pub fn run(registry: &RuleRegistry) -> SelfTestReport {
    let mut report = SelfTestReport::default();
    for rule in registry.iter() {
        for (i, example) in rule.examples.iter().enumerate() {
            let outcome = run_example(rule, i + 1, example);
            if outcome.passed() {
                debug!(%outcome, "self-test");
            } else {
                warn!(%outcome, "self-test");
            }
            report.outcomes.push(outcome);
        }
    }
    report
}

fn run_example(rule: &Rule, index: usize, example: &RuleExample) -> ExampleOutcome {
    let (actual, error) = match evaluate_example(rule, example) {
        Ok(result) => (Some(result), None),
        Err(err) => (None, Some(err.to_string())),
    };
    ExampleOutcome {
        rule: rule.name,
        example: index,
        expected: example.expected,
        actual,
        error,
    }
}

fn evaluate_example(rule: &Rule, example: &RuleExample) -> Result<bool> {
    let key: Key = example.key.parse().map_err(PreprocessingError::Key)?;
    let key = Arc::new(key);
    let build = |names: &[&str]| -> Result<Chord> {
        let pitches = parse_pitches(names)
            .map_err(|source| Error::from(PreprocessingError::Pitch { chord: 0, source }))?;
        Chord::new(&pitches, Arc::clone(&key))
    };

    let curr = build(example.curr)?;
    let prev = example.prev.map(build).transpose()?;
    let next = example.next.map(build).transpose()?;

    let window = Window {
        prev: prev.as_ref().map_or(Neighbor::Boundary, Neighbor::Chord),
        curr: &curr,
        next: next.as_ref().map_or(Neighbor::Boundary, Neighbor::Chord),
    };
    Ok(rule.evaluate(&window))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_examples_all_pass() {
        let report = run(&RuleRegistry::standard());
        let failures: Vec<String> = report.failures().map(|o| o.to_string()).collect();
        assert!(failures.is_empty(), "{failures:#?}");
        assert!(report.all_passed());
        assert!(report.passed() >= 14);
    }

    fn always_false(_: &Window<'_>) -> bool {
        false
    }

    #[test]
    fn test_wrong_expectation_is_reported() {
        let rule = Rule {
            name: "Never",
            summary: "fails everything",
            check: always_false,
            examples: &[RuleExample {
                key: "C",
                prev: None,
                curr: &["C5", "G4", "E4", "C3"],
                next: None,
                expected: true,
            }],
        };
        let report = run(&RuleRegistry::from_rules(vec![rule]));
        assert!(!report.all_passed());
        let failure = report.failures().next().unwrap();
        assert_eq!(failure.actual, Some(false));
        assert_eq!(failure.to_string(), "Never example 1: FAILED (expected true, got false)");
    }

    #[test]
    fn test_unbuildable_example_is_a_failure() {
        let rule = Rule {
            name: "Broken",
            summary: "three voices",
            check: always_false,
            examples: &[RuleExample {
                key: "C",
                prev: None,
                curr: &["C5", "G4", "C3"],
                next: None,
                expected: false,
            }],
        };
        let report = run(&RuleRegistry::from_rules(vec![rule]));
        let failure = report.failures().next().unwrap();
        assert_eq!(failure.actual, None);
        assert!(failure.error.as_deref().unwrap().contains("malformed input"));
    }
}
