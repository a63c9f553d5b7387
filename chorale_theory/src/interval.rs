// Generic and diatonic intervals between spelled pitches.
//
// A *generic* interval counts staff steps and ignores accidentals: C4→E4 and
// C4→Eb4 are both thirds (staff distance 2). A *diatonic* interval adds the
// quality derived from the semitone size: C4→E4 is a major third ("M3"),
// C4→Eb4 a minor third ("m3"), C4→D#4 an augmented second ("A2").
//
// Names use the usual abbreviations: P (perfect), M (major), m (minor),
// A/AA (augmented), d/dd (diminished), followed by the generic number. The
// full name keeps compound numbers ("P12", "M10"); the semi-simple name
// folds compounds back into the octave but keeps the octave itself
// ("P12" → "P5", "P15" → "P8", "P8" stays "P8").
//
// Both `generic()` and `diatonic()` are direction-aware through the signed
// staff distance; the diatonic name itself is direction-free.

use crate::pitch::Pitch;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Staff distance from `from` to `to`: positive when `to` is written higher.
/// A unison is 0, a second ±1, a third ±2, an octave ±7.
pub fn staff_distance(from: Pitch, to: Pitch) -> i32 {
    to.diatonic_index() - from.diatonic_index()
}

/// Generic (staff-step) interval between two pitches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericInterval {
    /// Signed staff distance (unison = 0).
    pub staff_distance: i32,
}

impl GenericInterval {
    pub fn between(from: Pitch, to: Pitch) -> Self {
        GenericInterval {
            staff_distance: staff_distance(from, to),
        }
    }

    /// Undirected generic number: 1 = unison, 2 = second, 8 = octave, …
    pub fn number(self) -> i32 {
        self.staff_distance.abs() + 1
    }

    /// True for a step up or down (any second).
    pub fn is_step(self) -> bool {
        self.staff_distance.abs() == 1
    }

    /// True for a step down.
    pub fn is_step_down(self) -> bool {
        self.staff_distance == -1
    }

    pub fn is_ascending(self) -> bool {
        self.staff_distance > 0
    }

    pub fn is_descending(self) -> bool {
        self.staff_distance < 0
    }
}

/// Interval quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    DoublyDiminished,
    Diminished,
    Minor,
    Perfect,
    Major,
    Augmented,
    DoublyAugmented,
}

impl Quality {
    pub fn abbreviation(self) -> &'static str {
        match self {
            Quality::DoublyDiminished => "dd",
            Quality::Diminished => "d",
            Quality::Minor => "m",
            Quality::Perfect => "P",
            Quality::Major => "M",
            Quality::Augmented => "A",
            Quality::DoublyAugmented => "AA",
        }
    }
}

/// Semitones of the major/perfect form of each simple generic interval
/// (index 0 = unison … 6 = seventh).
const REFERENCE_SEMITONES: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Unisons, fourths and fifths take perfect qualities; the rest major/minor.
fn is_perfect_class(simple_index: i32) -> bool {
    matches!(simple_index, 0 | 3 | 4)
}

/// A generic interval qualified by its size in semitones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiatonicInterval {
    pub generic: GenericInterval,
    /// Signed semitone distance from the first to the second pitch.
    pub semitones: i32,
    /// `None` when the interval is too far from any standard quality
    /// (e.g. a triply augmented unison).
    pub quality: Option<Quality>,
}

impl DiatonicInterval {
    pub fn between(from: Pitch, to: Pitch) -> Self {
        let generic = GenericInterval::between(from, to);
        let semitones = to.midi() - from.midi();

        // Measure upward from the written-lower pitch. A written unison is
        // measured upward from the lower-sounding note.
        let (steps, size) = if generic.staff_distance > 0
            || (generic.staff_distance == 0 && semitones >= 0)
        {
            (generic.staff_distance, semitones)
        } else {
            (-generic.staff_distance, -semitones)
        };

        DiatonicInterval {
            generic,
            semitones,
            quality: quality_for(steps, size),
        }
    }

    /// Undirected compound name, e.g. "P5", "M10", "A2".
    pub fn name(self) -> String {
        self.named(self.generic.number())
    }

    /// Name with compound intervals folded into the octave ("P12" → "P5"),
    /// keeping octaves and their multiples as "P8".
    pub fn semi_simple_name(self) -> String {
        let steps = self.generic.staff_distance.abs();
        let number = if steps >= 7 && steps % 7 == 0 {
            8
        } else {
            steps % 7 + 1
        };
        self.named(number)
    }

    fn named(self, number: i32) -> String {
        match self.quality {
            Some(q) => format!("{}{}", q.abbreviation(), number),
            None => format!("?{number}"),
        }
    }

    /// True for perfect unisons, fifths and octaves, including their
    /// compounds.
    pub fn is_perfect_consonance(self) -> bool {
        matches!(self.semi_simple_name().as_str(), "P1" | "P5" | "P8")
    }
}

impl fmt::Display for DiatonicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Quality of an ascending interval of `steps` staff steps and `size`
/// semitones.
fn quality_for(steps: i32, size: i32) -> Option<Quality> {
    let octaves = steps / 7;
    let simple_index = steps % 7;
    let deviation = size - octaves * 12 - REFERENCE_SEMITONES[simple_index as usize];

    if is_perfect_class(simple_index) {
        match deviation {
            -2 => Some(Quality::DoublyDiminished),
            -1 => Some(Quality::Diminished),
            0 => Some(Quality::Perfect),
            1 => Some(Quality::Augmented),
            2 => Some(Quality::DoublyAugmented),
            _ => None,
        }
    } else {
        match deviation {
            -3 => Some(Quality::DoublyDiminished),
            -2 => Some(Quality::Diminished),
            -1 => Some(Quality::Minor),
            0 => Some(Quality::Major),
            1 => Some(Quality::Augmented),
            2 => Some(Quality::DoublyAugmented),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(a: &str, b: &str) -> DiatonicInterval {
        DiatonicInterval::between(a.parse().unwrap(), b.parse().unwrap())
    }

    #[test]
    fn test_simple_names() {
        assert_eq!(iv("C4", "E4").name(), "M3");
        assert_eq!(iv("C4", "Eb4").name(), "m3");
        assert_eq!(iv("C4", "G4").name(), "P5");
        assert_eq!(iv("C4", "F#4").name(), "A4");
        assert_eq!(iv("B3", "F4").name(), "d5");
        assert_eq!(iv("C1", "D#1").name(), "A2");
        assert_eq!(iv("C4", "C4").name(), "P1");
        assert_eq!(iv("C4", "C#4").name(), "A1");
        assert_eq!(iv("Bb4", "C5").name(), "M2");
    }

    #[test]
    fn test_direction_does_not_change_name() {
        assert_eq!(iv("D#1", "C1").name(), "A2");
        assert_eq!(iv("G4", "C4").name(), "P5");
        assert_eq!(iv("C#4", "C4").name(), "A1");
        assert!(iv("G4", "C4").generic.is_descending());
    }

    #[test]
    fn test_compound_and_semi_simple() {
        let twelfth = iv("C3", "G4");
        assert_eq!(twelfth.name(), "P12");
        assert_eq!(twelfth.semi_simple_name(), "P5");

        let double_octave = iv("C1", "C3");
        assert_eq!(double_octave.name(), "P15");
        assert_eq!(double_octave.semi_simple_name(), "P8");

        let octave = iv("G1", "G2");
        assert_eq!(octave.name(), "P8");
        assert_eq!(octave.semi_simple_name(), "P8");

        assert_eq!(iv("D2", "C4").name(), "m14");
    }

    #[test]
    fn test_perfect_consonance() {
        assert!(iv("C4", "G4").is_perfect_consonance());
        assert!(iv("C3", "C4").is_perfect_consonance());
        assert!(iv("E4", "E4").is_perfect_consonance());
        assert!(!iv("B3", "F4").is_perfect_consonance());
        assert!(!iv("C4", "F4").is_perfect_consonance());
    }

    #[test]
    fn test_generic_steps() {
        let down = GenericInterval::between("Bb4".parse().unwrap(), "A4".parse().unwrap());
        assert!(down.is_step_down());
        assert!(!down.is_ascending());
        assert_eq!(down.number(), 2);
        let up = GenericInterval::between("E1".parse().unwrap(), "G2".parse().unwrap());
        assert_eq!(up.staff_distance, 9);
        assert!(!up.is_step());
        assert!(up.is_ascending() && !up.is_descending());
    }
}
