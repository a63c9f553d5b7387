// Tertian analysis of a vertical sonority.
//
// Given the spelled pitches of a chord (any number, any order), find the
// root and the members stacked in thirds above it, then derive the chord
// quality and inversion. Root finding works on letters only:
//
// - For every distinct letter in the chord, take the staff offsets (mod 7)
//   of the other letters above it and count how far the chain
//   third → fifth → seventh → ninth → eleventh → thirteenth runs before the
//   first missing member.
// - The longest chain wins. Ties go to the candidate with more of the
//   third/fifth/seventh present, then to the lowest-sounding candidate.
//
// So C–E–G is rooted on C (chain of 2), and an open fifth C–G with no third
// is still rooted on C because G over C supplies a fifth while C over G
// only supplies an eleventh.
//
// Member lookups return the first pitch in input order on the member's
// letter, so callers that pass voices soprano-first get the highest
// occurrence of a doubled member.

use crate::pitch::{Pitch, Step};
use serde::{Deserialize, Serialize};

/// Staff offsets of the third, fifth, seventh, ninth, eleventh, thirteenth.
const STACKED_THIRDS: [i32; 6] = [2, 4, 6, 1, 3, 5];

/// Triad quality as determined by the third and fifth above the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    /// No third, or a third/fifth combination outside the four triads.
    Other,
}

/// Derived facts about one sonority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordFacts {
    pub root: Pitch,
    pub third: Option<Pitch>,
    pub fifth: Option<Pitch>,
    pub seventh: Option<Pitch>,
    pub bass: Pitch,
    pub quality: ChordQuality,
    /// 0 = root position, 1 = third in the bass, 2 = fifth, 3 = seventh.
    /// Basses on other members (ninths etc.) report 4.
    pub inversion: u8,
}

impl ChordFacts {
    /// Analyze a non-empty set of pitches. Returns `None` for an empty slice.
    pub fn analyze(pitches: &[Pitch]) -> Option<ChordFacts> {
        let bass = *pitches.iter().min_by_key(|p| (p.midi(), p.diatonic_index()))?;
        let root = find_root(pitches)?;

        let member = |offset: i32| -> Option<Pitch> {
            let step = Step::from_index(root.step.index() + offset);
            pitches.iter().copied().find(|p| p.step == step)
        };
        let third = member(2);
        let fifth = member(4);
        let seventh = member(6);

        let quality = quality_of(root, third, fifth);

        let bass_offset = (bass.step.index() - root.step.index()).rem_euclid(7);
        let inversion = match bass_offset {
            0 => 0,
            2 => 1,
            4 => 2,
            6 => 3,
            _ => 4,
        };

        Some(ChordFacts {
            root,
            third,
            fifth,
            seventh,
            bass,
            quality,
            inversion,
        })
    }

    pub fn has_third(&self) -> bool {
        self.third.is_some()
    }

    pub fn is_seventh_chord(&self) -> bool {
        self.seventh.is_some()
    }

    /// Semitones from the root up to the seventh, folded into an octave.
    pub fn seventh_size(&self) -> Option<i32> {
        self.seventh
            .map(|s| (s.pc() - self.root.pc()).rem_euclid(12))
    }
}

/// Pick the root pitch (first occurrence of the winning letter).
fn find_root(pitches: &[Pitch]) -> Option<Pitch> {
    let mut best: Option<(Pitch, (usize, usize, i32))> = None;

    for candidate in pitches {
        let offsets: Vec<i32> = pitches
            .iter()
            .map(|p| (p.step.index() - candidate.step.index()).rem_euclid(7))
            .collect();

        let chain = STACKED_THIRDS
            .iter()
            .take_while(|o| offsets.contains(o))
            .count();
        let core = [2, 4, 6].iter().filter(|o| offsets.contains(o)).count();
        // Lower-sounding candidates rank higher on a tie.
        let score = (chain, core, -candidate.midi());

        let better = match &best {
            None => true,
            Some((_, best_score)) => score > *best_score,
        };
        if better {
            best = Some((*candidate, score));
        }
    }

    // Report the first pitch (input order) on the winning letter.
    let (winner, _) = best?;
    pitches.iter().copied().find(|p| p.step == winner.step)
}

fn quality_of(root: Pitch, third: Option<Pitch>, fifth: Option<Pitch>) -> ChordQuality {
    let Some(third) = third else {
        return ChordQuality::Other;
    };
    let third_size = (third.pc() - root.pc()).rem_euclid(12);
    let fifth_size = fifth.map(|f| (f.pc() - root.pc()).rem_euclid(12));

    match (third_size, fifth_size) {
        (4, Some(7) | None) => ChordQuality::Major,
        (3, Some(7) | None) => ChordQuality::Minor,
        (3, Some(6)) => ChordQuality::Diminished,
        (4, Some(8)) => ChordQuality::Augmented,
        _ => ChordQuality::Other,
    }
}
