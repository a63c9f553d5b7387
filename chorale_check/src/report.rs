// Report builder.
//
// Turns a chord sequence and its evaluation into the user-facing report:
// the key label, the violation messages (or the "No errors" sentinel) and a
// per-chord render list for a notation front-end. Each rendered note carries
// its letter/octave key ("C/4"), whether an accidental must be printed (the
// pitch is outside the key's diatonic collection) and the accidental glyph.
//
// Building a report is pure and cannot fail. Serializing it reports
// `Error::Output`.

use crate::chord::{Chord, ChordSequence};
use crate::engine::Evaluation;
use crate::error::{Error, Result};
use chorale_theory::{Key, Pitch};
use serde::{Deserialize, Serialize};

/// One note as a staff renderer wants it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRender {
    /// Letter and octave, e.g. "F/4".
    pub key: String,
    pub display_accidental: bool,
    /// Accidental glyph ("#", "b", "##", "bb") or empty.
    pub accidental: String,
}

impl NoteRender {
    pub fn new(pitch: Pitch, key: &Key) -> Self {
        NoteRender {
            key: pitch.render_key(),
            display_accidental: !key.contains(pitch),
            accidental: pitch
                .accidental()
                .map(|a| a.glyph().to_string())
                .unwrap_or_default(),
        }
    }
}

/// One chord of the render list, soprano first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordRender {
    pub notes: Vec<NoteRender>,
    pub roman: String,
}

impl ChordRender {
    pub fn new(chord: &Chord) -> Self {
        ChordRender {
            notes: chord
                .pitches()
                .iter()
                .map(|&p| NoteRender::new(p, chord.key()))
                .collect(),
            roman: chord.roman().to_string(),
        }
    }
}

/// The complete analysis result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Key label such as "C", "Am" or "Fm#".
    pub key: String,
    /// Violation messages, or exactly `["No errors"]`.
    pub errors: Vec<String>,
    pub chords: Vec<ChordRender>,
}

impl Report {
    /// True when the only message is the sentinel.
    pub fn is_clean(&self) -> bool {
        self.errors.len() == 1 && self.errors[0] == crate::engine::NO_ERRORS
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::Output)
    }
}

/// Assemble the report for an evaluated sequence.
pub fn build_report(seq: &ChordSequence, evaluation: &Evaluation) -> Report {
    Report {
        key: seq.key().display_label(),
        errors: evaluation.messages(),
        chords: seq.chords().iter().map(ChordRender::new).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::evaluate;
    use crate::rules::RuleRegistry;
    use chorale_theory::pitch::parse_pitches;

    fn seq(key: &str, chords: &[&[&str]]) -> ChordSequence {
        let voicings: Vec<_> = chords.iter().map(|c| parse_pitches(c).unwrap()).collect();
        ChordSequence::from_voicings(key.parse().unwrap(), &voicings).unwrap()
    }

    #[test]
    fn test_note_render_fields() {
        let key: Key = "C".parse().unwrap();
        let natural = NoteRender::new("F4".parse().unwrap(), &key);
        assert_eq!(natural.key, "F/4");
        assert!(!natural.display_accidental);
        assert_eq!(natural.accidental, "");

        let sharp = NoteRender::new("F#4".parse().unwrap(), &key);
        assert_eq!(sharp.key, "F/4");
        assert!(sharp.display_accidental);
        assert_eq!(sharp.accidental, "#");
    }

    #[test]
    fn test_in_key_accidental_is_not_displayed() {
        let key: Key = "D".parse().unwrap();
        let f_sharp = NoteRender::new("F#4".parse().unwrap(), &key);
        assert!(!f_sharp.display_accidental);
        assert_eq!(f_sharp.accidental, "#");
    }

    #[test]
    fn test_key_labels() {
        for (text, label) in [("C", "C"), ("Am", "Am"), ("f#", "Fm#"), ("Bb", "Bb")] {
            let s = seq(text, &[&["C5", "G4", "E4", "C3"]]);
            let eval = evaluate(&s, &RuleRegistry::from_rules(Vec::new()));
            assert_eq!(build_report(&s, &eval).key, label);
        }
    }

    #[test]
    fn test_report_json_shape() {
        let s = seq("C", &[&["C5", "G4", "E4", "C3"], &["B4", "G4", "D4", "G2"]]);
        let eval = evaluate(&s, &RuleRegistry::standard());
        let report = build_report(&s, &eval);
        let json: serde_json::Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();

        assert_eq!(json["key"], "C");
        assert_eq!(json["chords"].as_array().unwrap().len(), 2);
        assert_eq!(json["chords"][0]["roman"], "I");
        assert_eq!(json["chords"][1]["roman"], "V");
        assert_eq!(json["chords"][0]["notes"][3]["key"], "C/3");
        assert_eq!(json["chords"][0]["notes"][3]["displayAccidental"], false);
        assert!(json["errors"].is_array());
    }

    #[test]
    fn test_clean_report_sentinel() {
        let s = seq("C", &[&["C5", "G4", "E4", "C3"]]);
        let report = build_report(&s, &evaluate(&s, &RuleRegistry::standard()));
        assert!(report.is_clean());
        assert_eq!(report.errors, vec!["No errors".to_string()]);
    }
}
