// The voice-leading rule catalogue.
//
// Each rule is a pure predicate over a `Window` (previous neighbour, current
// chord, next neighbour) that returns true when the current chord passes.
// Rules never look further than one chord away, never see each other's
// results and never mutate anything, so they can be run in any order or in
// parallel.
//
// A rule is a plain value: a name, a one-line summary, a function pointer and
// a list of literal example windows with their expected outcome. The
// examples double as documentation and as the data for `--self-test`.
//
// The `RuleRegistry` is the ordered, immutable catalogue handed to the
// engine. Its order only decides how violations of the same chord are listed.
//
// Rules in catalogue order:
// - Spacing: upper adjacent voices within an octave (staff distance ≤ 7)
// - HasThird: the chord contains its third
// - VocalRanges: every voice inside its singing range
// - VoiceCrossing: no voice below the voice under it
// - VoiceOverlap: no voice passes the previous note of its neighbour
// - FirstAndLastChord: opening/closing chords are complete tonic voicings
// - ResolveLeadingTone: degree 7 goes to degree 1
// - ResolveSevenths: the chord seventh falls by step
// - PrepareSevenths: the chord seventh is held over or freely introduced
// - NoAugmentedSecond: no melodic augmented seconds
// - ParallelOctavesFifthsUnisons: no parallel perfect consonances
// - HiddenOctavesAndFifths: no fifths/octaves reached by similar motion
// - NoRootDiminishedChords: diminished chords are inverted
// - SevenSevenChordResolved: placeholder, always passes

use crate::chord::{Neighbor, Voice, Window};
use crate::config::CheckConfig;
use crate::error::{Error, Result};
use chorale_theory::interval::staff_distance;
use chorale_theory::{Accidental, ChordQuality, DiatonicInterval, GenericInterval, KeyMode};
use std::fmt;

/// Largest allowed staff distance between soprano–alto and alto–tenor.
pub const MAX_UPPER_SPACING: i32 = 7;

/// A rule predicate: true means the window's current chord passes.
pub type RuleCheck = fn(&Window<'_>) -> bool;

/// A literal example window for a rule, soprano-first pitch names.
#[derive(Debug, Clone, Copy)]
pub struct RuleExample {
    pub key: &'static str,
    pub prev: Option<&'static [&'static str]>,
    pub curr: &'static [&'static str],
    pub next: Option<&'static [&'static str]>,
    pub expected: bool,
}

/// A named voice-leading rule.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub summary: &'static str,
    pub check: RuleCheck,
    pub examples: &'static [RuleExample],
}

impl Rule {
    pub fn evaluate(&self, window: &Window<'_>) -> bool {
        (self.check)(window)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("examples", &self.examples.len())
            .finish()
    }
}

/// Ordered, immutable rule catalogue.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
}

impl RuleRegistry {
    /// The full fourteen-rule catalogue in its standard order.
    pub fn standard() -> Self {
        RuleRegistry {
            rules: STANDARD_RULES.to_vec(),
        }
    }

    /// A registry over an explicit rule list (kept in the given order).
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        RuleRegistry { rules }
    }

    /// The standard catalogue minus the rules the config disables.
    pub fn from_config(config: &CheckConfig) -> Result<Self> {
        Self::standard().without(&config.disabled_rules)
    }

    /// Copy of this registry without the named rules. Unknown names are an
    /// error so typos in configuration do not silently disable nothing.
    pub fn without(&self, names: &[String]) -> Result<Self> {
        if let Some(unknown) = names.iter().find(|n| self.get(n).is_none()) {
            return Err(Error::UnknownRule(unknown.clone()));
        }
        let rules = self
            .rules
            .iter()
            .filter(|r| !names.iter().any(|n| n == r.name))
            .copied()
            .collect();
        Ok(RuleRegistry { rules })
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

// ── Single-chord rules ──

fn spacing(w: &Window<'_>) -> bool {
    let p = w.curr.pitches();
    // Tenor–bass (voices 2–3) may be as far apart as they like.
    (0..2).all(|i| staff_distance(p[i], p[i + 1]).abs() <= MAX_UPPER_SPACING)
}

fn has_third(w: &Window<'_>) -> bool {
    w.curr.has_third()
}

fn vocal_ranges(w: &Window<'_>) -> bool {
    Voice::ALL.iter().all(|&v| {
        let (low, high) = v.range();
        (low..=high).contains(&w.curr.pitch(v).midi())
    })
}

fn voice_crossing(w: &Window<'_>) -> bool {
    let p = w.curr.pitches();
    (0..3).all(|i| !p[i].is_lower_than(p[i + 1]))
}

fn no_root_diminished_chords(w: &Window<'_>) -> bool {
    !(w.curr.quality() == ChordQuality::Diminished && w.curr.inversion() == 0)
}

fn seven_seven_chord_resolved(_w: &Window<'_>) -> bool {
    true
}

// ── Rules that look back ──

fn voice_overlap(w: &Window<'_>) -> bool {
    let Neighbor::Chord(prev) = w.prev else {
        return true;
    };
    let before = prev.pitches();
    let now = w.curr.pitches();
    for i in 0..3 {
        // Lower voice rising above where the upper voice just was.
        if now[i + 1].is_higher_than(before[i]) {
            return false;
        }
        // Upper voice dropping below where the lower voice just was.
        if now[i].is_lower_than(before[i + 1]) {
            return false;
        }
    }
    true
}

fn prepare_sevenths(w: &Window<'_>) -> bool {
    let Neighbor::Chord(prev) = w.prev else {
        return true;
    };
    let Some(voice) = w.curr.seventh_voice() else {
        return true;
    };
    let seventh = w.curr.pitch(voice);
    if !prev.contains_name(seventh.name()) {
        return true;
    }
    prev.pitch(voice) == seventh
}

fn no_augmented_second(w: &Window<'_>) -> bool {
    let Neighbor::Chord(prev) = w.prev else {
        return true;
    };
    Voice::ALL.iter().all(|&v| {
        DiatonicInterval::between(prev.pitch(v), w.curr.pitch(v)).name() != "A2"
    })
}

fn parallel_octaves_fifths_unisons(w: &Window<'_>) -> bool {
    let Neighbor::Chord(prev) = w.prev else {
        return true;
    };
    let before = prev.pitches();
    let now = w.curr.pitches();
    for i in 0..4 {
        for j in (i + 1)..4 {
            if before[i] == now[i] || before[j] == now[j] {
                continue;
            }
            // Full names: compound twelfths and double octaves do not count.
            let name = DiatonicInterval::between(now[j], now[i]).name();
            if !matches!(name.as_str(), "P1" | "P5" | "P8") {
                continue;
            }
            if DiatonicInterval::between(before[j], before[i]).name() == name {
                return false;
            }
        }
    }
    true
}

fn hidden_octaves_and_fifths(w: &Window<'_>) -> bool {
    let Neighbor::Chord(prev) = w.prev else {
        return true;
    };
    let before = prev.pitches();
    let now = w.curr.pitches();
    for i in 0..4 {
        for j in (i + 1)..4 {
            let motion_i = staff_distance(before[i], now[i]);
            let motion_j = staff_distance(before[j], now[j]);
            if motion_i == 0 || motion_j == 0 {
                continue;
            }
            if motion_i.signum() == motion_j.signum() && motion_i != motion_j {
                let result = staff_distance(now[i], now[j]).abs();
                if result == 4 || result == 7 {
                    return false;
                }
            }
        }
    }
    true
}

// ── Rules that look ahead ──

fn resolve_leading_tone(w: &Window<'_>) -> bool {
    let Neighbor::Chord(next) = w.next else {
        return true;
    };
    let curr = w.curr;
    Voice::ALL.iter().all(|&v| {
        if curr.degree(v) != 7 {
            return true;
        }
        let applies = match curr.key().mode() {
            KeyMode::Major => true,
            // The natural seventh of a minor key is a subtonic, not a
            // leading tone.
            KeyMode::Minor => curr.pitch(v).accidental() == Some(Accidental::Sharp),
        };
        !applies || next.degree(v) == 1
    })
}

fn resolve_sevenths(w: &Window<'_>) -> bool {
    let Neighbor::Chord(next) = w.next else {
        return true;
    };
    match w.curr.seventh_voice() {
        Some(v) => GenericInterval::between(w.curr.pitch(v), next.pitch(v)).is_step_down(),
        None => true,
    }
}

// ── Rules that use both sides ──

fn first_and_last_chord(w: &Window<'_>) -> bool {
    let curr = w.curr;
    let complete_doubled_root =
        curr.degree_count(1) == 2 && curr.degree_count(3) == 1 && curr.degree_count(5) == 1;
    let tripled_root_no_fifth = curr.degree_count(1) == 3 && curr.degree_count(3) == 1;

    match (w.prev, w.next) {
        (Neighbor::Chord(_), Neighbor::Chord(_)) => true,
        (Neighbor::Boundary, Neighbor::Chord(_)) => complete_doubled_root,
        // A lone chord is judged as a final chord.
        (_, Neighbor::Boundary) => complete_doubled_root || tripled_root_no_fifth,
    }
}

// ── Catalogue ──

const fn example(
    key: &'static str,
    prev: Option<&'static [&'static str]>,
    curr: &'static [&'static str],
    next: Option<&'static [&'static str]>,
    expected: bool,
) -> RuleExample {
    RuleExample {
        key,
        prev,
        curr,
        next,
        expected,
    }
}

const C_TONIC_OPEN: &[&str] = &["C1", "E1", "G1", "C2"];
const C_TONIC_TRIPLED: &[&str] = &["C2", "E1", "C1", "C1"];

pub const STANDARD_RULES: [Rule; 14] = [
    Rule {
        name: "Spacing",
        summary: "Adjacent upper voices are no more than an octave apart; the bass is exempt.",
        check: spacing,
        examples: &[
            example("C", None, &["C2", "G1", "E1", "C1"], None, true),
            example("C", None, &["C2", "E2", "D2", "C1"], None, true),
            example("C", None, &["C2", "E2", "C1", "C1"], None, false),
        ],
    },
    Rule {
        name: "HasThird",
        summary: "Every chord contains its third.",
        check: has_third,
        examples: &[
            example("C", None, &["G3", "G2", "C2", "C1"], None, false),
            example("C", None, &["G3", "C2", "E1", "C1"], None, true),
        ],
    },
    Rule {
        name: "VocalRanges",
        summary: "Each voice sings within its range.",
        check: vocal_ranges,
        examples: &[
            example("C", None, &["C4", "C3", "C2", "C1"], None, false),
            example("C", None, &["C5", "G3", "G4", "C4"], None, true),
        ],
    },
    Rule {
        name: "VoiceCrossing",
        summary: "No voice sings above the voice above it.",
        check: voice_crossing,
        examples: &[
            example("C", None, &["C4", "C3", "C2", "C1"], None, true),
            example("C", None, &["C3", "C4", "C2", "C1"], None, false),
        ],
    },
    Rule {
        name: "VoiceOverlap",
        summary: "No voice moves past the previous note of an adjacent voice.",
        check: voice_overlap,
        examples: &[
            example(
                "C",
                Some(&["C2", "C2", "C2", "C1"]),
                &["C2", "C2", "C2", "C3"],
                None,
                false,
            ),
            example(
                "C",
                Some(&["C4", "C3", "C2", "C1"]),
                &["B4", "B3", "B2", "B1"],
                None,
                true,
            ),
            example("C", None, &["C2", "C2", "C2", "C3"], None, true),
        ],
    },
    Rule {
        name: "FirstAndLastChord",
        summary: "The first chord doubles the root with third and fifth; the last may also triple the root and omit the fifth.",
        check: first_and_last_chord,
        examples: &[
            example("C", None, C_TONIC_OPEN, None, true),
            example("C", None, C_TONIC_TRIPLED, None, true),
            example("C", None, C_TONIC_TRIPLED, Some(C_TONIC_OPEN), false),
            example("C", Some(C_TONIC_OPEN), C_TONIC_OPEN, Some(C_TONIC_OPEN), true),
            example("C", Some(C_TONIC_OPEN), C_TONIC_TRIPLED, None, true),
            example("C", Some(C_TONIC_OPEN), &["C2", "E1", "E1", "C1"], None, false),
        ],
    },
    Rule {
        name: "ResolveLeadingTone",
        summary: "The leading tone moves to the tonic in the next chord.",
        check: resolve_leading_tone,
        examples: &[
            example(
                "C",
                None,
                &["G1", "B1", "D1", "G2"],
                Some(&["C1", "C2", "E2", "G2"]),
                true,
            ),
            example(
                "C",
                None,
                &["G1", "B1", "D1", "G2"],
                Some(&["C1", "D2", "E2", "G2"]),
                false,
            ),
            example(
                "Am",
                None,
                &["G#4", "E4", "B3", "E3"],
                Some(&["A4", "E4", "C4", "A2"]),
                true,
            ),
            example(
                "Am",
                None,
                &["G#4", "E4", "B3", "E3"],
                Some(&["B4", "E4", "C4", "A2"]),
                false,
            ),
            example(
                "Am",
                None,
                &["G4", "E4", "C4", "C3"],
                Some(&["E4", "E4", "C4", "C3"]),
                true,
            ),
            example("C", None, &["G1", "B1", "D1", "G2"], None, true),
        ],
    },
    Rule {
        name: "ResolveSevenths",
        summary: "The seventh of a chord resolves down by step.",
        check: resolve_sevenths,
        examples: &[
            example(
                "C",
                None,
                &["C4", "E4", "G4", "Bb4"],
                Some(&["F4", "A4", "C4", "A4"]),
                true,
            ),
            example(
                "C",
                None,
                &["C4", "E4", "G4", "Bb4"],
                Some(&["F4", "A4", "C4", "F4"]),
                false,
            ),
            example("C", None, &["C4", "E4", "G4", "Bb4"], None, true),
        ],
    },
    Rule {
        name: "PrepareSevenths",
        summary: "A seventh already sounding in the previous chord is held over in the same voice.",
        check: prepare_sevenths,
        examples: &[
            example(
                "C",
                Some(&["F1", "A1", "C2", "F2"]),
                &["G1", "F1", "D2", "B2"],
                None,
                false,
            ),
            example(
                "C",
                Some(&["F1", "A1", "C2", "F2"]),
                &["G1", "B1", "D2", "F2"],
                None,
                true,
            ),
            example("C", None, &["G1", "F1", "D2", "B2"], None, true),
        ],
    },
    Rule {
        name: "NoAugmentedSecond",
        summary: "No voice moves by an augmented second.",
        check: no_augmented_second,
        examples: &[
            example(
                "C",
                Some(&["C1", "C2", "C3", "C4"]),
                &["D#1", "C2", "C3", "C4"],
                None,
                false,
            ),
            example(
                "C",
                Some(&["C1", "C2", "C3", "C4"]),
                &["C1", "C2", "C3", "C4"],
                None,
                true,
            ),
        ],
    },
    Rule {
        name: "ParallelOctavesFifthsUnisons",
        summary: "No two moving voices keep a simple perfect fifth, octave or unison.",
        check: parallel_octaves_fifths_unisons,
        examples: &[
            example(
                "C",
                Some(&["C1", "C2", "C3", "C4"]),
                &["G1", "G2", "C3", "C4"],
                None,
                false,
            ),
            example(
                "C",
                Some(&["C1", "C2", "C3", "C4"]),
                &["C1", "D2", "C3", "C4"],
                None,
                true,
            ),
        ],
    },
    Rule {
        name: "HiddenOctavesAndFifths",
        summary: "Voices in similar motion do not arrive on a fifth or octave.",
        check: hidden_octaves_and_fifths,
        examples: &[
            example(
                "C",
                Some(&["C2", "G1", "E1", "C1"]),
                &["E2", "A1", "E1", "C1"],
                None,
                false,
            ),
            example(
                "C",
                Some(&["C2", "G1", "E1", "C1"]),
                &["D2", "G1", "G2", "C1"],
                None,
                true,
            ),
        ],
    },
    Rule {
        name: "NoRootDiminishedChords",
        summary: "Diminished chords are not used in root position.",
        check: no_root_diminished_chords,
        examples: &[
            example("C", None, &["Bbb4", "Gb4", "Eb4", "C4"], None, false),
            example("C", None, &["Gb4", "Eb4", "C4", "C3"], None, false),
            example("C", None, &["C5", "Gb4", "C4", "Eb3"], None, true),
        ],
    },
    Rule {
        name: "SevenSevenChordResolved",
        summary: "Reserved for leading-tone seventh chords; currently always passes.",
        check: seven_seven_chord_resolved,
        examples: &[example("C", None, &["C5", "G4", "E4", "C3"], None, true)],
    },
];
