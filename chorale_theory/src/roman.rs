// Roman-numeral labels for chords relative to a key.
//
// The numeral comes from the scale degree of the chord root (by letter);
// its case and suffix from the chord quality; the trailing figures from the
// inversion, in figured-bass shorthand:
//
//   triads:   root ""   first "6"    second "64"
//   sevenths: root "7"  first "65"   second "43"   third "42"
//
// Suffixes: "o" diminished (triad or fully diminished seventh), "ø" half
// diminished seventh, "+" augmented. Roots that are chromatically altered
// against the key get a "b" or "#" prefix ("bVI" in a major key built on a
// lowered sixth degree). In minor keys the raised sixth and seventh degrees
// count as diatonic, so G#–B–D is "viio" in A minor.
//
// Secondary functions (V/V etc.) are not recognized; such chords are
// labelled by their root alone, e.g. "II" for D–F#–A in C major.

use crate::chord_facts::{ChordFacts, ChordQuality};
use crate::key::Key;

const NUMERALS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

/// Figure for a chord given its analysis and the key.
pub fn roman_figure(facts: &ChordFacts, key: &Key) -> String {
    let degree = key.scale_degree(facts.root);
    let mut numeral = NUMERALS[degree as usize - 1].to_string();

    let lower = matches!(facts.quality, ChordQuality::Minor | ChordQuality::Diminished);
    if lower {
        numeral = numeral.to_lowercase();
    }

    let mut alteration = key.chromatic_alteration(facts.root.name());
    // The raised sixth and seventh belong to the minor mode.
    if key.is_minor() && matches!(degree, 6 | 7) && alteration == 1 {
        alteration = 0;
    }

    let mut figure = String::new();
    match alteration {
        a if a < 0 => figure.push_str(&"b".repeat(a.unsigned_abs() as usize)),
        a if a > 0 => figure.push_str(&"#".repeat(a as usize)),
        _ => {}
    }
    figure.push_str(&numeral);

    let seventh_size = facts.seventh_size();
    match (facts.quality, seventh_size) {
        (ChordQuality::Diminished, Some(10)) => figure.push('ø'),
        (ChordQuality::Diminished, _) => figure.push('o'),
        (ChordQuality::Augmented, _) => figure.push('+'),
        _ => {}
    }

    let inversion_figure = if facts.is_seventh_chord() {
        match facts.inversion {
            0 => "7",
            1 => "65",
            2 => "43",
            3 => "42",
            _ => "7",
        }
    } else {
        match facts.inversion {
            1 => "6",
            2 => "64",
            _ => "",
        }
    };
    figure.push_str(inversion_figure);
    figure
}
