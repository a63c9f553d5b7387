// Error types for the chorale checker.
//
// Two layers, mirroring where a failure comes from:
// - `PreprocessingError`: the score could not be turned into a chord
//   sequence (unreadable file, bad JSON or MIDI, unknown pitch names, no
//   detectable key). Never recovered from; surfaced to the caller as-is.
// - `Error`: everything `analyze()` can return, including malformed
//   sequences (a chord without exactly four pitches) and configuration
//   problems. Failures writing the finished report also land here.
//
// Rule violations are findings, not errors, and never appear here.

use chorale_theory::TheoryError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while reading a score and building its chord sequence.
#[derive(Error, Debug)]
pub enum PreprocessingError {
    /// The score file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file extension is not one of .json, .mid, .midi.
    #[error("unsupported score format: {0}")]
    UnsupportedFormat(String),

    /// The chorale document is not valid JSON or has the wrong shape.
    #[error("invalid chorale document: {0}")]
    Json(#[from] serde_json::Error),

    /// The MIDI file could not be decoded.
    #[error("invalid MIDI file: {0}")]
    Midi(#[from] midly::Error),

    /// The MIDI file does not hold exactly four voices.
    #[error("unsupported voice layout: {0}")]
    VoiceLayout(String),

    /// A pitch name in the document could not be parsed.
    #[error("chord {chord}: {source}")]
    Pitch {
        chord: usize,
        #[source]
        source: TheoryError,
    },

    /// The key named in the document could not be parsed.
    #[error("{0}")]
    Key(#[source] TheoryError),

    /// The score has no chords to analyze.
    #[error("score contains no chords")]
    EmptyScore,

    /// No key could be inferred from the pitch content.
    #[error("could not determine the key of the score")]
    KeyDetection,
}

/// Errors returned by analysis entry points.
#[derive(Error, Debug)]
pub enum Error {
    /// A chord without exactly four pitches, or chords that do not share
    /// the sequence key.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Failure originating in score reading or preprocessing.
    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),

    /// Configuration file loading or validation errors.
    #[error("configuration error: {0}")]
    Config(String),

    /// A configuration names a rule that is not in the catalogue.
    #[error("unknown rule: {0}")]
    UnknownRule(String),

    /// The finished report could not be serialized.
    #[error("cannot write report: {0}")]
    Output(#[source] serde_json::Error),
}

/// Convenience Result type using the checker's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_output_error_is_not_an_input_error() {
        let cause = serde_json::from_str::<u8>("x").unwrap_err();
        let err = Error::Output(cause);
        let text = err.to_string();
        assert!(text.starts_with("cannot write report: "), "{text}");
        assert!(!text.contains("chorale document"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_preprocessing_is_transparent() {
        let cause = serde_json::from_str::<u8>("x").unwrap_err();
        let err = Error::from(PreprocessingError::from(cause));
        assert!(err.to_string().starts_with("invalid chorale document: "));
    }
}
