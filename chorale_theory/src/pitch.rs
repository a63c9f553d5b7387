// Spelled pitches: letter step, alteration and octave.
//
// Unlike the MIDI numbers used for playback, a chorale checker needs the
// spelling of every note: G# and Ab sound the same but sit on different
// staff lines, belong to different scale degrees and form different
// intervals (an augmented second vs. a minor third). `Pitch` therefore keeps
// the letter and the alteration separately and only derives the MIDI number
// when a height comparison is needed.
//
// Equality is by spelling. Height comparisons go through `midi()` /
// `is_higher_than()` so that enharmonic pitches can be "equally high"
// without being equal, which is why `Pitch` does not implement `Ord`.
//
// Text form: `C4`, `f#3`, `Bb2`, `b-2` (flat written as `-`), `E##5`,
// `Dbb3`. A missing octave means octave 4.

use crate::TheoryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Octave used when a pitch string omits one.
pub const DEFAULT_OCTAVE: i8 = 4;

/// The seven letter names, in staff order starting from C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Step {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Step {
    pub const ALL: [Step; 7] = [Step::C, Step::D, Step::E, Step::F, Step::G, Step::A, Step::B];

    /// Position on the staff within an octave (C = 0 … B = 6).
    pub fn index(self) -> i32 {
        self as i32
    }

    /// Step at a (possibly negative or > 6) staff index, wrapped into the octave.
    pub fn from_index(index: i32) -> Step {
        Step::ALL[index.rem_euclid(7) as usize]
    }

    /// Pitch class of the natural (unaltered) note.
    pub fn natural_pc(self) -> i32 {
        match self {
            Step::C => 0,
            Step::D => 2,
            Step::E => 4,
            Step::F => 5,
            Step::G => 7,
            Step::A => 9,
            Step::B => 11,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Step::C => 'C',
            Step::D => 'D',
            Step::E => 'E',
            Step::F => 'F',
            Step::G => 'G',
            Step::A => 'A',
            Step::B => 'B',
        }
    }

    pub fn from_letter(c: char) -> Option<Step> {
        match c.to_ascii_uppercase() {
            'C' => Some(Step::C),
            'D' => Some(Step::D),
            'E' => Some(Step::E),
            'F' => Some(Step::F),
            'G' => Some(Step::G),
            'A' => Some(Step::A),
            'B' => Some(Step::B),
            _ => None,
        }
    }
}

/// A written accidental. Natural notes carry none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Accidental {
    DoubleFlat,
    Flat,
    Sharp,
    DoubleSharp,
}

impl Accidental {
    /// Accidental for an alteration in semitones; `None` for 0 or out of range.
    pub fn from_alter(alter: i8) -> Option<Accidental> {
        match alter {
            -2 => Some(Accidental::DoubleFlat),
            -1 => Some(Accidental::Flat),
            1 => Some(Accidental::Sharp),
            2 => Some(Accidental::DoubleSharp),
            _ => None,
        }
    }

    pub fn alter(self) -> i8 {
        match self {
            Accidental::DoubleFlat => -2,
            Accidental::Flat => -1,
            Accidental::Sharp => 1,
            Accidental::DoubleSharp => 2,
        }
    }

    /// Glyph used in note names and in rendered reports.
    pub fn glyph(self) -> &'static str {
        match self {
            Accidental::DoubleFlat => "bb",
            Accidental::Flat => "b",
            Accidental::Sharp => "#",
            Accidental::DoubleSharp => "##",
        }
    }
}

/// A spelled pitch class: letter plus alteration, no octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PitchName {
    pub step: Step,
    pub alter: i8,
}

impl PitchName {
    pub fn new(step: Step, alter: i8) -> Self {
        PitchName { step, alter }
    }

    /// Pitch class 0-11.
    pub fn pc(self) -> i32 {
        (self.step.natural_pc() + self.alter as i32).rem_euclid(12)
    }

    pub fn accidental(self) -> Option<Accidental> {
        Accidental::from_alter(self.alter)
    }

    /// Place this name in an octave.
    pub fn at_octave(self, octave: i8) -> Pitch {
        Pitch::new(self.step, self.alter, octave)
    }
}

impl fmt::Display for PitchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.step.letter())?;
        if let Some(acc) = self.accidental() {
            write!(f, "{}", acc.glyph())?;
        }
        Ok(())
    }
}

/// A fully spelled pitch. Octave numbers follow scientific pitch notation
/// (C4 = middle C = MIDI 60); the octave changes between B and C, so Cb4
/// sounds a semitone below C4 and B#3 sounds as C4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pitch {
    pub step: Step,
    /// Alteration in semitones, -2..=2.
    pub alter: i8,
    pub octave: i8,
}

impl Pitch {
    pub fn new(step: Step, alter: i8, octave: i8) -> Self {
        Pitch { step, alter, octave }
    }

    pub fn name(self) -> PitchName {
        PitchName::new(self.step, self.alter)
    }

    pub fn accidental(self) -> Option<Accidental> {
        Accidental::from_alter(self.alter)
    }

    pub fn pc(self) -> i32 {
        self.name().pc()
    }

    /// MIDI number (pitch space). Not limited to 0..=127.
    pub fn midi(self) -> i32 {
        (self.octave as i32 + 1) * 12 + self.step.natural_pc() + self.alter as i32
    }

    /// Absolute staff position: seven per octave, C0 = 0.
    pub fn diatonic_index(self) -> i32 {
        self.octave as i32 * 7 + self.step.index()
    }

    /// True if this pitch sounds strictly higher than `other`.
    pub fn is_higher_than(self, other: Pitch) -> bool {
        self.midi() > other.midi()
    }

    /// True if this pitch sounds strictly lower than `other`.
    pub fn is_lower_than(self, other: Pitch) -> bool {
        self.midi() < other.midi()
    }

    /// Letter and octave in the `C/4` form used by staff renderers.
    pub fn render_key(self) -> String {
        format!("{}/{}", self.step.letter(), self.octave)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name(), self.octave)
    }
}

/// Parse the leading letter and accidental of a note name. Returns the name
/// and the unparsed remainder. `b` is only read as a flat after the letter.
pub(crate) fn parse_name_prefix(text: &str) -> Result<(PitchName, &str), TheoryError> {
    let mut chars = text.char_indices();
    let step = chars
        .next()
        .and_then(|(_, c)| Step::from_letter(c))
        .ok_or_else(|| TheoryError::InvalidPitch(text.to_string()))?;

    let mut alter: i8 = 0;
    let mut rest_at = text.len();
    let mut saw_natural = false;
    for (i, c) in chars {
        match c {
            '#' => alter += 1,
            '-' | 'b' => alter -= 1,
            'n' => saw_natural = true,
            _ => {
                rest_at = i;
                break;
            }
        }
    }
    if !(-2..=2).contains(&alter) || (saw_natural && alter != 0) {
        return Err(TheoryError::InvalidPitch(text.to_string()));
    }
    Ok((PitchName::new(step, alter), &text[rest_at..]))
}

impl FromStr for PitchName {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (name, rest) = parse_name_prefix(trimmed)?;
        if !rest.is_empty() {
            return Err(TheoryError::InvalidPitch(s.to_string()));
        }
        Ok(name)
    }
}

impl FromStr for Pitch {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (name, rest) = parse_name_prefix(trimmed)?;
        let octave = if rest.is_empty() {
            DEFAULT_OCTAVE
        } else {
            rest.parse::<i8>()
                .map_err(|_| TheoryError::InvalidPitch(s.to_string()))?
        };
        if !(-1..=9).contains(&octave) {
            return Err(TheoryError::InvalidPitch(s.to_string()));
        }
        Ok(name.at_octave(octave))
    }
}

/// Parse a list of pitch strings. Convenience for tests and rule examples.
pub fn parse_pitches(texts: &[&str]) -> Result<Vec<Pitch>, TheoryError> {
    texts.iter().map(|t| t.parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Pitch {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(p("C4"), Pitch::new(Step::C, 0, 4));
        assert_eq!(p("f#3"), Pitch::new(Step::F, 1, 3));
        assert_eq!(p("Bb2"), Pitch::new(Step::B, -1, 2));
        assert_eq!(p("b-2"), Pitch::new(Step::B, -1, 2));
        assert_eq!(p("bb"), Pitch::new(Step::B, -1, 4));
        assert_eq!(p("E##5"), Pitch::new(Step::E, 2, 5));
        assert_eq!(p("Cn4"), Pitch::new(Step::C, 0, 4));
        assert_eq!(p("Ab3").to_string(), "Ab3");
        assert_eq!(p("g").to_string(), "G4");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("H4".parse::<Pitch>().is_err());
        assert!("C###4".parse::<Pitch>().is_err());
        assert!("C#x".parse::<Pitch>().is_err());
        assert!("".parse::<Pitch>().is_err());
        assert!("Cn#4".parse::<Pitch>().is_err());
    }

    #[test]
    fn test_midi_numbers() {
        assert_eq!(p("C4").midi(), 60);
        assert_eq!(p("A4").midi(), 69);
        assert_eq!(p("Cb4").midi(), 59);
        assert_eq!(p("B#3").midi(), 60);
        assert_eq!(p("D2").midi(), 38);
    }

    #[test]
    fn test_enharmonics_equal_height_not_equal() {
        let gs = p("G#4");
        let ab = p("Ab4");
        assert_ne!(gs, ab);
        assert_eq!(gs.midi(), ab.midi());
        assert!(!gs.is_higher_than(ab));
        assert!(!gs.is_lower_than(ab));
    }

    #[test]
    fn test_diatonic_index() {
        assert_eq!(p("C1").diatonic_index(), 7);
        assert_eq!(p("E2").diatonic_index() - p("C1").diatonic_index(), 9);
    }

    #[test]
    fn test_render_key() {
        assert_eq!(p("F#3").render_key(), "F/3");
    }
}
