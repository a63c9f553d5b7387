// Four-part chorale voice-leading checker.
//
// Takes a four-voice (soprano, alto, tenor, bass) harmonization, builds an
// annotated chord sequence in one key, runs a fixed catalogue of classical
// part-writing rules over every chord and reports which rules fail where.
// Music-theory facts (spelling, intervals, keys, chord roots, roman
// numerals) come from the `chorale_theory` crate.
//
// Architecture:
// - `score.rs`: JSON/MIDI input, key selection, sequence building
// - `midi.rs`: MIDI decoding and chordification (midly)
// - `chord.rs`: `Chord`, `ChordSequence`, `Window`/`Neighbor`
// - `rules.rs`: the fourteen rules and `RuleRegistry`
// - `engine.rs`: evaluation loop (sequential and rayon), `Violation`
// - `report.rs`: serializable `Report` with the per-note render list
// - `self_test.rs`: runs every rule's embedded examples
// - `config.rs`: `CheckConfig` loaded from JSON
// - `error.rs`: `Error` and `PreprocessingError`
//
// Data flow: RawScore → build_sequence → ChordSequence → evaluate →
// Evaluation → build_report → Report. Everything after `build_sequence` is
// pure; the same sequence and registry always yield the same report.

pub mod chord;
pub mod config;
pub mod engine;
pub mod error;
pub mod midi;
pub mod report;
pub mod rules;
pub mod score;
pub mod self_test;

pub use chord::{Chord, ChordSequence, Neighbor, Voice, Window};
pub use config::CheckConfig;
pub use engine::{Evaluation, NO_ERRORS, Violation, evaluate, evaluate_parallel};
pub use error::{Error, PreprocessingError, Result};
pub use report::{ChordRender, NoteRender, Report, build_report};
pub use rules::{Rule, RuleExample, RuleRegistry};
pub use score::{ChoraleDocument, RawScore, ScoreFormat, build_sequence};

use std::path::Path;

/// Check an already-built sequence and assemble its report.
pub fn check_sequence(seq: &ChordSequence, registry: &RuleRegistry, parallel: bool) -> Report {
    let evaluation = if parallel {
        evaluate_parallel(seq, registry)
    } else {
        evaluate(seq, registry)
    };
    build_report(seq, &evaluation)
}

/// Build the sequence of a raw score and check it.
///
/// Fails with `MalformedInput` or a `PreprocessingError` before any rule
/// runs; rule violations are part of the returned report, not errors.
pub fn analyze(raw: &RawScore, registry: &RuleRegistry, config: &CheckConfig) -> Result<Report> {
    let key_override = config.key_override()?;
    let seq = build_sequence(raw, key_override.as_ref())?;
    Ok(check_sequence(&seq, registry, config.parallel))
}

/// Read a score file (`.json`, `.mid`, `.midi`) and check it.
pub fn analyze_path(path: &Path, registry: &RuleRegistry, config: &CheckConfig) -> Result<Report> {
    let raw = RawScore::read(path)?;
    analyze(&raw, registry, config)
}
