// Music-theory facts for four-part chorale analysis.
//
// This crate answers the questions a voice-leading checker asks about notes
// and chords without knowing anything about rules or reports. It works on
// spelled pitches throughout, since most part-writing rules (augmented
// seconds, leading tones, doubled roots) depend on spelling rather than on
// MIDI numbers.
//
// Architecture:
// - `pitch.rs`: `Step`, `Accidental`, `PitchName`, `Pitch` and text parsing
// - `interval.rs`: generic (staff-step) and diatonic (qualified) intervals
// - `key.rs`: major/minor keys, diatonic sets, scale degrees, MIDI spelling
// - `chord_facts.rs`: root finding, chord members, quality, inversion
// - `roman.rs`: roman-numeral figures relative to a key
// - `key_detect.rs`: Krumhansl–Kessler global key estimation
//
// Everything here is pure and deterministic; no I/O, no global state.

pub mod chord_facts;
pub mod interval;
pub mod key;
pub mod key_detect;
pub mod pitch;
pub mod roman;

pub use chord_facts::{ChordFacts, ChordQuality};
pub use interval::{DiatonicInterval, GenericInterval, Quality};
pub use key::{Key, KeyMode};
pub use key_detect::{KeyEstimate, PitchClassHistogram, detect_key};
pub use pitch::{Accidental, Pitch, PitchName, Step};
pub use roman::roman_figure;

use thiserror::Error;

/// Errors from parsing textual pitch and key names.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TheoryError {
    /// Text that is not a note name such as `C4`, `f#3`, `Bb2`.
    #[error("invalid pitch: {0:?}")]
    InvalidPitch(String),

    /// Text that is not a key name such as `C`, `Am`, `F# minor`.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),
}
