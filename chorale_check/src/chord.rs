// The chord model: four spelled voices sharing one key.
//
// A `Chord` is a vertical slice of a four-part texture, voices ordered
// soprano (0) to bass (3). Everything the rules ask about a chord is
// computed once at construction: scale degrees against the key, the tertian
// analysis (root, third, fifth, seventh, quality, inversion) and the
// roman-numeral label. Rules only read.
//
// All chords of a `ChordSequence` point at the same `Key` allocation; the
// sequence constructor checks this by pointer identity, so one analysis run
// can never mix keys.
//
// Rules see a chord through a `Window`: the current chord plus a `Neighbor`
// on each side that is either another chord or the `Boundary` of the piece.
// Boundary is a real state, not a missing value: FirstAndLastChord treats
// it as "this is the first/last chord" while most other rules simply pass.

use crate::error::{Error, Result};
use chorale_theory::{ChordFacts, ChordQuality, Key, Pitch, PitchName, roman_figure};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Number of voices in every chord.
pub const VOICE_COUNT: usize = 4;

/// Voice index in SATB order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Voice {
    Soprano = 0,
    Alto = 1,
    Tenor = 2,
    Bass = 3,
}

impl Voice {
    pub const ALL: [Voice; 4] = [Voice::Soprano, Voice::Alto, Voice::Tenor, Voice::Bass];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Singing range as inclusive MIDI numbers.
    pub fn range(self) -> (i32, i32) {
        match self {
            Voice::Soprano => (60, 79), // C4–G5
            Voice::Alto => (55, 74),    // G3–D5
            Voice::Tenor => (48, 67),   // C3–G4
            Voice::Bass => (38, 60),    // D2–C4
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Voice::Soprano => "soprano",
            Voice::Alto => "alto",
            Voice::Tenor => "tenor",
            Voice::Bass => "bass",
        }
    }
}

/// One annotated four-voice chord.
#[derive(Debug, Clone)]
pub struct Chord {
    pitches: [Pitch; VOICE_COUNT],
    key: Arc<Key>,
    scale_degrees: [u8; VOICE_COUNT],
    facts: ChordFacts,
    roman: String,
}

impl Chord {
    /// Build a chord from soprano-first pitches. Anything other than
    /// exactly four pitches is malformed input.
    pub fn new(pitches: &[Pitch], key: Arc<Key>) -> Result<Chord> {
        let pitches: [Pitch; VOICE_COUNT] = pitches.try_into().map_err(|_| {
            Error::MalformedInput(format!(
                "expected {VOICE_COUNT} pitches per chord, found {}",
                pitches.len()
            ))
        })?;
        let facts = ChordFacts::analyze(&pitches)
            .ok_or_else(|| Error::MalformedInput("chord has no pitches".to_string()))?;
        let scale_degrees = pitches.map(|p| key.scale_degree(p));
        let roman = roman_figure(&facts, &key);

        Ok(Chord {
            pitches,
            key,
            scale_degrees,
            facts,
            roman,
        })
    }

    pub fn pitches(&self) -> &[Pitch; VOICE_COUNT] {
        &self.pitches
    }

    pub fn pitch(&self, voice: Voice) -> Pitch {
        self.pitches[voice.index()]
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    /// The shared key handle (same allocation for every chord of a sequence).
    pub fn key_handle(&self) -> &Arc<Key> {
        &self.key
    }

    /// Scale degree 1-7 of each voice, by letter.
    pub fn scale_degrees(&self) -> &[u8; VOICE_COUNT] {
        &self.scale_degrees
    }

    pub fn degree(&self, voice: Voice) -> u8 {
        self.scale_degrees[voice.index()]
    }

    /// How many voices sit on scale degree `degree`.
    pub fn degree_count(&self, degree: u8) -> usize {
        self.scale_degrees.iter().filter(|&&d| d == degree).count()
    }

    pub fn facts(&self) -> &ChordFacts {
        &self.facts
    }

    pub fn quality(&self) -> ChordQuality {
        self.facts.quality
    }

    pub fn inversion(&self) -> u8 {
        self.facts.inversion
    }

    pub fn has_third(&self) -> bool {
        self.facts.has_third()
    }

    pub fn seventh(&self) -> Option<Pitch> {
        self.facts.seventh
    }

    /// The first voice (soprano first) whose pitch is the chord's seventh.
    pub fn seventh_voice(&self) -> Option<Voice> {
        let seventh = self.facts.seventh?;
        Voice::ALL.into_iter().find(|v| self.pitch(*v) == seventh)
    }

    /// True if any voice has this spelled pitch name, in any octave.
    pub fn contains_name(&self, name: PitchName) -> bool {
        self.pitches.iter().any(|p| p.name() == name)
    }

    pub fn roman(&self) -> &str {
        &self.roman
    }
}

/// An ordered run of chords that share one key.
#[derive(Debug, Clone)]
pub struct ChordSequence {
    key: Arc<Key>,
    chords: Vec<Chord>,
}

impl ChordSequence {
    /// Assemble a sequence. Every chord must hold the same key allocation.
    pub fn new(key: Arc<Key>, chords: Vec<Chord>) -> Result<Self> {
        if let Some(pos) = chords.iter().position(|c| !Arc::ptr_eq(c.key_handle(), &key)) {
            return Err(Error::MalformedInput(format!(
                "chord {} does not share the sequence key",
                pos + 1
            )));
        }
        Ok(ChordSequence { key, chords })
    }

    /// Build chords from soprano-first voicings in `key`.
    pub fn from_voicings(key: Key, voicings: &[Vec<Pitch>]) -> Result<Self> {
        let key = Arc::new(key);
        let chords = voicings
            .iter()
            .enumerate()
            .map(|(i, pitches)| {
                Chord::new(pitches, Arc::clone(&key)).map_err(|e| match e {
                    Error::MalformedInput(msg) => {
                        Error::MalformedInput(format!("chord {}: {msg}", i + 1))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ChordSequence { key, chords })
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    /// The window centred on chord `index` (0-based), or `None` past the end.
    pub fn window(&self, index: usize) -> Option<Window<'_>> {
        let curr = self.chords.get(index)?;
        let prev = match index.checked_sub(1) {
            Some(i) => Neighbor::Chord(&self.chords[i]),
            None => Neighbor::Boundary,
        };
        let next = match self.chords.get(index + 1) {
            Some(c) => Neighbor::Chord(c),
            None => Neighbor::Boundary,
        };
        Some(Window { prev, curr, next })
    }

    /// All windows in order.
    pub fn windows(&self) -> impl Iterator<Item = Window<'_>> + '_ {
        (0..self.chords.len()).filter_map(move |i| self.window(i))
    }
}

/// What lies on one side of a chord.
#[derive(Debug, Clone, Copy)]
pub enum Neighbor<'a> {
    Chord(&'a Chord),
    /// Start or end of the piece.
    Boundary,
}

impl<'a> Neighbor<'a> {
    pub fn chord(self) -> Option<&'a Chord> {
        match self {
            Neighbor::Chord(c) => Some(c),
            Neighbor::Boundary => None,
        }
    }

    pub fn is_boundary(self) -> bool {
        matches!(self, Neighbor::Boundary)
    }
}

/// The three-chord view a rule evaluates.
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    pub prev: Neighbor<'a>,
    pub curr: &'a Chord,
    pub next: Neighbor<'a>,
}

impl<'a> Window<'a> {
    /// A window with no neighbours: the chord is the whole piece.
    pub fn alone(curr: &'a Chord) -> Self {
        Window {
            prev: Neighbor::Boundary,
            curr,
            next: Neighbor::Boundary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorale_theory::pitch::parse_pitches;

    fn c_major() -> Arc<Key> {
        Arc::new("C".parse().unwrap())
    }

    fn chord(texts: &[&str], key: &Arc<Key>) -> Chord {
        Chord::new(&parse_pitches(texts).unwrap(), Arc::clone(key)).unwrap()
    }

    #[test]
    fn test_chord_annotations() {
        let key = c_major();
        let c = chord(&["C5", "G4", "E4", "C3"], &key);
        assert_eq!(c.scale_degrees(), &[1, 5, 3, 1]);
        assert_eq!(c.degree_count(1), 2);
        assert_eq!(c.roman(), "I");
        assert_eq!(c.pitch(Voice::Bass).to_string(), "C3");
        assert!(c.has_third());
    }

    #[test]
    fn test_wrong_voice_count_is_malformed() {
        let key = c_major();
        let three = parse_pitches(&["C5", "G4", "C3"]).unwrap();
        let err = Chord::new(&three, key).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn test_sequence_requires_shared_key() {
        let key = c_major();
        let other = c_major();
        let chords = vec![
            chord(&["C5", "G4", "E4", "C3"], &key),
            chord(&["B4", "G4", "D4", "G2"], &other),
        ];
        let err = ChordSequence::new(key, chords).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(msg) if msg.contains("chord 2")));
    }

    #[test]
    fn test_from_voicings_reports_chord_position() {
        let voicings = vec![
            parse_pitches(&["C5", "G4", "E4", "C3"]).unwrap(),
            parse_pitches(&["B4", "G4", "G2"]).unwrap(),
        ];
        let err = ChordSequence::from_voicings("C".parse().unwrap(), &voicings).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(msg) if msg.starts_with("chord 2")));
    }

    #[test]
    fn test_windows_mark_boundaries() {
        let voicings = vec![
            parse_pitches(&["C5", "G4", "E4", "C3"]).unwrap(),
            parse_pitches(&["B4", "G4", "D4", "G2"]).unwrap(),
            parse_pitches(&["C5", "G4", "E4", "C3"]).unwrap(),
        ];
        let seq = ChordSequence::from_voicings("C".parse().unwrap(), &voicings).unwrap();
        let windows: Vec<_> = seq.windows().collect();
        assert_eq!(windows.len(), 3);
        assert!(windows[0].prev.is_boundary());
        assert!(!windows[0].next.is_boundary());
        assert!(!windows[1].prev.is_boundary() && !windows[1].next.is_boundary());
        assert!(windows[2].next.is_boundary());
        assert!(windows[0].prev.chord().is_none());
        let next = windows[0].next.chord().unwrap();
        assert_eq!(next.roman(), "V");
        assert!(seq.window(3).is_none());
        for c in seq.chords() {
            assert!(Arc::ptr_eq(c.key_handle(), seq.chords()[0].key_handle()));
        }
    }

    #[test]
    fn test_seventh_voice_is_first_match() {
        let key = c_major();
        let c = chord(&["F5", "F4", "B3", "G2"], &key);
        assert_eq!(c.seventh_voice(), Some(Voice::Soprano));
        assert_eq!(c.seventh().map(|p| p.to_string()), Some("F5".to_string()));
        assert_eq!(c.facts().root.to_string(), "G2");
        let triad = chord(&["C5", "G4", "E4", "C3"], &key);
        assert_eq!(triad.seventh_voice(), None);
        assert!(triad.seventh().is_none());
    }
}
