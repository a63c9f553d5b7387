// Major and minor keys: diatonic spelling, scale degrees, membership.
//
// A `Key` is a spelled tonic plus a mode. From those two facts it derives
// the seven diatonic pitch names (natural minor for minor keys), which feed:
// - scale degrees by letter (a G# in A minor is degree 7, sharpened)
// - the "needs a displayed accidental" test used by reports
// - spelling of MIDI numbers read from files that carry no spelling
//
// The audible range for membership is C1..=C8; anything outside it counts
// as not diatonic, matching the range the report renderer draws.
//
// Keys are immutable and shared by every chord of an analysis run.

use crate::TheoryError;
use crate::pitch::{Pitch, PitchName, Step, parse_name_prefix};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semitone offsets of the major scale from its tonic.
const MAJOR_STEPS: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];
/// Semitone offsets of the natural minor scale from its tonic.
const MINOR_STEPS: [i32; 7] = [0, 2, 3, 5, 7, 8, 10];

/// Lowest and highest MIDI numbers of the audible range (C1..=C8).
pub const AUDIBLE_LOW: i32 = 24;
pub const AUDIBLE_HIGH: i32 = 108;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMode {
    Major,
    Minor,
}

impl KeyMode {
    pub fn scale_steps(self) -> [i32; 7] {
        match self {
            KeyMode::Major => MAJOR_STEPS,
            KeyMode::Minor => MINOR_STEPS,
        }
    }
}

/// A tonic and a mode, with the diatonic collection precomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    tonic: PitchName,
    mode: KeyMode,
    scale: [PitchName; 7],
}

impl Key {
    pub fn new(tonic: PitchName, mode: KeyMode) -> Self {
        let steps = mode.scale_steps();
        let scale = std::array::from_fn(|degree| {
            let step = Step::from_index(tonic.step.index() + degree as i32);
            let target_pc = tonic.pc() + steps[degree];
            // Alteration that turns the natural letter into the target pc,
            // folded into -6..=5 so octave wrap-around does not leak in.
            let alter = (target_pc - step.natural_pc() + 6).rem_euclid(12) - 6;
            PitchName::new(step, alter as i8)
        });
        Key { tonic, mode, scale }
    }

    pub fn major(tonic: PitchName) -> Self {
        Key::new(tonic, KeyMode::Major)
    }

    pub fn minor(tonic: PitchName) -> Self {
        Key::new(tonic, KeyMode::Minor)
    }

    pub fn tonic(&self) -> PitchName {
        self.tonic
    }

    pub fn mode(&self) -> KeyMode {
        self.mode
    }

    pub fn is_minor(&self) -> bool {
        self.mode == KeyMode::Minor
    }

    /// The seven diatonic names, tonic first.
    pub fn scale(&self) -> &[PitchName; 7] {
        &self.scale
    }

    /// Diatonic name of a scale degree (1-7).
    pub fn degree_name(&self, degree: u8) -> PitchName {
        self.scale[(degree as usize + 6) % 7]
    }

    /// Scale degree 1-7 of a pitch, by letter only. Accidentals are ignored,
    /// so F and F# are both degree 7 of G major.
    pub fn scale_degree(&self, pitch: Pitch) -> u8 {
        self.degree_of_step(pitch.step)
    }

    pub fn degree_of_step(&self, step: Step) -> u8 {
        ((step.index() - self.tonic.step.index()).rem_euclid(7) + 1) as u8
    }

    /// Alteration of `name` relative to the diatonic note on the same letter
    /// (0 = diatonic, +1 = raised, -1 = lowered).
    pub fn chromatic_alteration(&self, name: PitchName) -> i8 {
        let diatonic = self.degree_name(self.degree_of_step(name.step));
        name.alter - diatonic.alter
    }

    /// True if the spelled name belongs to the diatonic collection.
    pub fn contains_name(&self, name: PitchName) -> bool {
        self.scale.contains(&name)
    }

    /// True if the pitch is diatonic and inside the audible range C1..=C8.
    pub fn contains(&self, pitch: Pitch) -> bool {
        let midi = pitch.midi();
        (AUDIBLE_LOW..=AUDIBLE_HIGH).contains(&midi) && self.contains_name(pitch.name())
    }

    /// Net alteration of the key signature: positive for sharp keys,
    /// negative for flat keys (e.g. +1 for G major, -3 for C minor).
    pub fn signature(&self) -> i32 {
        self.scale.iter().map(|n| n.alter as i32).sum()
    }

    /// Spell a MIDI number in this key.
    ///
    /// Diatonic pitch classes take their scale spelling. In minor keys the
    /// raised sixth and seventh are spelled on their own letters (F#, G# in
    /// A minor). Other chromatic notes use whichever neighbouring letter
    /// needs the smaller accidental, with ties going to sharps in sharp keys
    /// and flats otherwise.
    pub fn spell_midi(&self, midi: i32) -> Pitch {
        let pc = midi.rem_euclid(12);
        let name = self.spell_pc(pc);
        // Octave of the written letter: B#3 sounds in octave 4, Cb4 in octave 3.
        let octave = (midi - name.step.natural_pc() - name.alter as i32).div_euclid(12) - 1;
        name.at_octave(octave as i8)
    }

    fn spell_pc(&self, pc: i32) -> PitchName {
        if let Some(name) = self.scale.iter().find(|n| n.pc() == pc) {
            return *name;
        }

        if self.is_minor() {
            let offset = (pc - self.tonic.pc()).rem_euclid(12);
            if offset == 9 || offset == 11 {
                let degree = if offset == 9 { 6 } else { 7 };
                let natural = self.degree_name(degree);
                return PitchName::new(natural.step, natural.alter + 1);
            }
        }

        // Raise the diatonic note a semitone below, or lower the one above.
        let below = self
            .scale
            .iter()
            .find(|n| n.pc() == (pc - 1).rem_euclid(12))
            .map(|n| PitchName::new(n.step, n.alter + 1));
        let above = self
            .scale
            .iter()
            .find(|n| n.pc() == (pc + 1).rem_euclid(12))
            .map(|n| PitchName::new(n.step, n.alter - 1));

        match (below, above) {
            (Some(b), Some(a)) => {
                if b.alter.abs() < a.alter.abs() {
                    b
                } else if a.alter.abs() < b.alter.abs() {
                    a
                } else if self.signature() > 0 {
                    b
                } else {
                    a
                }
            }
            (Some(b), None) => b,
            (None, Some(a)) => a,
            // Unreachable for seven-note scales; fall back to a sharp spelling.
            (None, None) => sharp_spelling(pc),
        }
    }

    /// Display label: tonic letter uppercased, then "m" for minor keys, then
    /// any tonic alteration ("C", "Am", "Fm#", "Bb").
    pub fn display_label(&self) -> String {
        let mut label = String::new();
        label.push(self.tonic.step.letter());
        if self.is_minor() {
            label.push('m');
        }
        if let Some(acc) = self.tonic.accidental() {
            label.push_str(acc.glyph());
        }
        label
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            KeyMode::Major => "major",
            KeyMode::Minor => "minor",
        };
        write!(f, "{} {}", self.tonic, mode)
    }
}

/// Sharp-side spelling of a pitch class with no key context.
pub fn sharp_spelling(pc: i32) -> PitchName {
    const NAMES: [(Step, i8); 12] = [
        (Step::C, 0),
        (Step::C, 1),
        (Step::D, 0),
        (Step::D, 1),
        (Step::E, 0),
        (Step::F, 0),
        (Step::F, 1),
        (Step::G, 0),
        (Step::G, 1),
        (Step::A, 0),
        (Step::A, 1),
        (Step::B, 0),
    ];
    let (step, alter) = NAMES[pc.rem_euclid(12) as usize];
    PitchName::new(step, alter)
}

/// Parses `C`, `F#`, `Bb`, `Eb major` (major) and `Am`, `c#`, `Ebm`,
/// `A minor` (minor). A lowercase tonic letter means minor.
impl FromStr for Key {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let first = text
            .chars()
            .next()
            .ok_or_else(|| TheoryError::InvalidKey(s.to_string()))?;
        let (tonic, rest) =
            parse_name_prefix(text).map_err(|_| TheoryError::InvalidKey(s.to_string()))?;

        let mode = match rest.trim().to_ascii_lowercase().as_str() {
            "" if first.is_ascii_lowercase() => KeyMode::Minor,
            "" | "major" | "maj" => KeyMode::Major,
            "m" | "min" | "minor" => KeyMode::Minor,
            _ => return Err(TheoryError::InvalidKey(s.to_string())),
        };
        Ok(Key::new(tonic, mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Key {
        s.parse().unwrap()
    }

    fn p(s: &str) -> Pitch {
        s.parse().unwrap()
    }

    fn names(k: &Key) -> Vec<String> {
        k.scale().iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_scales() {
        assert_eq!(names(&key("C")), ["C", "D", "E", "F", "G", "A", "B"]);
        assert_eq!(names(&key("Am")), ["A", "B", "C", "D", "E", "F", "G"]);
        assert_eq!(names(&key("Eb")), ["Eb", "F", "G", "Ab", "Bb", "C", "D"]);
        assert_eq!(names(&key("f#")), ["F#", "G#", "A", "B", "C#", "D", "E"]);
        assert_eq!(names(&key("Cb")), ["Cb", "Db", "Eb", "Fb", "Gb", "Ab", "Bb"]);
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!(key("a").mode(), KeyMode::Minor);
        assert_eq!(key("A").mode(), KeyMode::Major);
        assert_eq!(key("Ebm").mode(), KeyMode::Minor);
        assert_eq!(key("Bb major").tonic().to_string(), "Bb");
        assert_eq!(key("c# minor").tonic().to_string(), "C#");
        assert!("X".parse::<Key>().is_err());
        assert!("C dorian".parse::<Key>().is_err());
    }

    #[test]
    fn test_scale_degree_by_letter() {
        let a_minor = key("Am");
        assert_eq!(a_minor.scale_degree(p("G#4")), 7);
        assert_eq!(a_minor.scale_degree(p("A3")), 1);
        assert_eq!(key("C").scale_degree(p("B2")), 7);
        assert_eq!(key("G").scale_degree(p("F4")), 7);
    }

    #[test]
    fn test_membership() {
        let f = key("F");
        assert!(f.contains(p("Bb3")));
        assert!(!f.contains(p("B3")));
        assert!(!f.contains(p("Bb0")));
        assert!(key("C").contains(p("C8")));
        assert!(!key("C").contains(p("D8")));
    }

    #[test]
    fn test_signature() {
        assert_eq!(key("C").signature(), 0);
        assert_eq!(key("G").signature(), 1);
        assert_eq!(key("c").signature(), -3);
        assert_eq!(key("E").signature(), 4);
    }

    #[test]
    fn test_spell_midi() {
        assert_eq!(key("Am").spell_midi(68), p("G#4"));
        assert_eq!(key("Am").spell_midi(66), p("F#4"));
        assert_eq!(key("c").spell_midi(71), p("B4"));
        assert_eq!(key("F").spell_midi(70), p("Bb4"));
        assert_eq!(key("F").spell_midi(71), p("B4"));
        assert_eq!(key("C").spell_midi(70), p("Bb4"));
        assert_eq!(key("D").spell_midi(68), p("G#4"));
        assert_eq!(key("Gb").spell_midi(59), p("Cb4"));
        assert_eq!(key("C#").spell_midi(60), p("B#3"));
    }

    #[test]
    fn test_display_label() {
        assert_eq!(key("C").display_label(), "C");
        assert_eq!(key("a").display_label(), "Am");
        assert_eq!(key("f#").display_label(), "Fm#");
        assert_eq!(key("Bb").display_label(), "Bb");
    }

    #[test]
    fn test_chromatic_alteration() {
        let a_minor = key("Am");
        assert_eq!(a_minor.chromatic_alteration(p("G#4").name()), 1);
        assert_eq!(a_minor.chromatic_alteration(p("G4").name()), 0);
        assert_eq!(key("C").chromatic_alteration(p("Bb4").name()), -1);
    }
}
