// Sequence builder: raw score → key → annotated chord sequence.
//
// Two input formats are accepted:
// - a JSON chorale document, chords written as soprano-first pitch names:
//     { "title": "Old Hundredth", "key": "G",
//       "chords": [["G4", "D4", "B3", "G2"], ...] }
// - a Standard MIDI File with four voices (see `midi.rs`).
//
// The key comes from, in order: an explicit override (CLI or config), the
// document's own `key` field, or Krumhansl–Kessler detection over the
// pitch-class histogram of the whole score (MIDI slices weighted by
// duration, JSON chords one unit per note). MIDI key numbers are spelled
// against that key before chords are built, so the rules always see
// spelled pitches.

use crate::chord::ChordSequence;
use crate::error::{PreprocessingError, Result};
use crate::midi::{self, Slice};
use chorale_theory::{Key, Pitch, PitchClassHistogram, detect_key};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Input file format, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreFormat {
    Json,
    Midi,
}

impl ScoreFormat {
    pub fn from_path(path: &Path) -> std::result::Result<Self, PreprocessingError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(ScoreFormat::Json),
            Some("mid") | Some("midi") => Ok(ScoreFormat::Midi),
            _ => Err(PreprocessingError::UnsupportedFormat(
                path.display().to_string(),
            )),
        }
    }
}

/// A chorale written out as pitch names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoraleDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub chords: Vec<Vec<String>>,
}

/// A parsed but not yet analyzed score.
#[derive(Debug, Clone)]
pub enum RawScore {
    Chorale(ChoraleDocument),
    Midi(Vec<Slice>),
}

impl RawScore {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let doc: ChoraleDocument = serde_json::from_str(text).map_err(PreprocessingError::from)?;
        Ok(RawScore::Chorale(doc))
    }

    pub fn from_midi_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(RawScore::Midi(midi::read_slices(bytes)?))
    }

    /// Read a score file, choosing the format by extension.
    pub fn read(path: &Path) -> Result<Self> {
        let format = ScoreFormat::from_path(path)?;
        let read_err = |source| PreprocessingError::Read {
            path: path.to_path_buf(),
            source,
        };
        info!(path = %path.display(), ?format, "reading score");
        match format {
            ScoreFormat::Json => {
                let text = std::fs::read_to_string(path).map_err(read_err)?;
                Self::from_json_str(&text)
            }
            ScoreFormat::Midi => {
                let bytes = std::fs::read(path).map_err(read_err)?;
                Self::from_midi_bytes(&bytes)
            }
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            RawScore::Chorale(doc) => doc.title.as_deref(),
            RawScore::Midi(_) => None,
        }
    }
}

/// Build the annotated chord sequence of a score.
pub fn build_sequence(raw: &RawScore, key_override: Option<&Key>) -> Result<ChordSequence> {
    match raw {
        RawScore::Chorale(doc) => build_from_document(doc, key_override),
        RawScore::Midi(slices) => build_from_slices(slices, key_override),
    }
}

fn build_from_document(doc: &ChoraleDocument, key_override: Option<&Key>) -> Result<ChordSequence> {
    if doc.chords.is_empty() {
        return Err(PreprocessingError::EmptyScore.into());
    }

    let voicings = doc
        .chords
        .iter()
        .enumerate()
        .map(|(i, names)| {
            names
                .iter()
                .map(|n| n.parse::<Pitch>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|source| PreprocessingError::Pitch { chord: i + 1, source })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let key = match (key_override, &doc.key) {
        (Some(key), _) => key.clone(),
        (None, Some(text)) => text.parse::<Key>().map_err(PreprocessingError::Key)?,
        (None, None) => {
            let mut histogram = PitchClassHistogram::new();
            for pitch in voicings.iter().flatten() {
                histogram.add(pitch.pc(), 1.0);
            }
            detect(&histogram)?
        }
    };

    let seq = ChordSequence::from_voicings(key, &voicings)?;
    debug!(chords = seq.len(), key = %seq.key(), "built sequence from document");
    Ok(seq)
}

fn build_from_slices(slices: &[Slice], key_override: Option<&Key>) -> Result<ChordSequence> {
    if slices.is_empty() {
        return Err(PreprocessingError::EmptyScore.into());
    }

    let key = match key_override {
        Some(key) => key.clone(),
        None => {
            let mut histogram = PitchClassHistogram::new();
            for slice in slices {
                for &k in &slice.keys {
                    histogram.add(k as i32 % 12, slice.duration.max(1) as f64);
                }
            }
            detect(&histogram)?
        }
    };

    let voicings: Vec<Vec<Pitch>> = slices
        .iter()
        .map(|s| s.keys.iter().map(|&k| key.spell_midi(k as i32)).collect())
        .collect();

    let seq = ChordSequence::from_voicings(key, &voicings)?;
    debug!(chords = seq.len(), key = %seq.key(), "built sequence from MIDI");
    Ok(seq)
}

fn detect(histogram: &PitchClassHistogram) -> Result<Key> {
    let estimate = detect_key(histogram).ok_or(PreprocessingError::KeyDetection)?;
    info!(key = %estimate.key, correlation = estimate.correlation, "detected key");
    Ok(estimate.key)
}
