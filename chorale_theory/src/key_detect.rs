// Global key detection (Krumhansl–Kessler).
//
// The pitch content of the whole piece is summarized as a 12-bin pitch-class
// histogram (weighted by duration when the source has durations, by count
// otherwise). Each of the 24 major/minor keys is scored by the Pearson
// correlation between the histogram and the key's tonal-hierarchy profile
// rotated to that tonic; the best correlation wins.
//
// One key per piece: modulations are not tracked.
//
// Tonic spelling uses the conventional name for each pitch class and mode
// (Bb major, not A# major; C# minor, not Db minor).

use crate::key::{Key, KeyMode};
use crate::pitch::{PitchName, Step};

/// Krumhansl–Kessler probe-tone ratings, tonic first.
const MAJOR_PROFILE: [f64; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];
const MINOR_PROFILE: [f64; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Conventional tonic spellings per pitch class for major keys.
const MAJOR_TONICS: [(Step, i8); 12] = [
    (Step::C, 0),
    (Step::D, -1),
    (Step::D, 0),
    (Step::E, -1),
    (Step::E, 0),
    (Step::F, 0),
    (Step::F, 1),
    (Step::G, 0),
    (Step::A, -1),
    (Step::A, 0),
    (Step::B, -1),
    (Step::B, 0),
];

/// Conventional tonic spellings per pitch class for minor keys.
const MINOR_TONICS: [(Step, i8); 12] = [
    (Step::C, 0),
    (Step::C, 1),
    (Step::D, 0),
    (Step::E, -1),
    (Step::E, 0),
    (Step::F, 0),
    (Step::F, 1),
    (Step::G, 0),
    (Step::G, 1),
    (Step::A, 0),
    (Step::B, -1),
    (Step::B, 0),
];

/// Accumulates pitch-class weight for key detection.
#[derive(Debug, Clone, Default)]
pub struct PitchClassHistogram {
    bins: [f64; 12],
}

impl PitchClassHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `weight` to pitch class `pc` (any integer, folded mod 12).
    pub fn add(&mut self, pc: i32, weight: f64) {
        self.bins[pc.rem_euclid(12) as usize] += weight;
    }

    pub fn total(&self) -> f64 {
        self.bins.iter().sum()
    }

    pub fn bins(&self) -> &[f64; 12] {
        &self.bins
    }
}

/// Best-matching key with its correlation coefficient.
#[derive(Debug, Clone)]
pub struct KeyEstimate {
    pub key: Key,
    pub correlation: f64,
}

/// Estimate the key of a histogram. `None` when the histogram is empty or
/// flat (every key correlates equally).
pub fn detect_key(histogram: &PitchClassHistogram) -> Option<KeyEstimate> {
    if histogram.total() <= 0.0 {
        return None;
    }

    let mut best: Option<(i32, KeyMode, f64)> = None;
    for mode in [KeyMode::Major, KeyMode::Minor] {
        let profile = match mode {
            KeyMode::Major => &MAJOR_PROFILE,
            KeyMode::Minor => &MINOR_PROFILE,
        };
        for tonic in 0..12 {
            let rotated: [f64; 12] =
                std::array::from_fn(|pc| profile[(pc as i32 - tonic).rem_euclid(12) as usize]);
            let Some(r) = pearson(histogram.bins(), &rotated) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((_, _, best_r)) => r > best_r,
            };
            if better {
                best = Some((tonic, mode, r));
            }
        }
    }

    let (tonic_pc, mode, correlation) = best?;
    let (step, alter) = match mode {
        KeyMode::Major => MAJOR_TONICS[tonic_pc as usize],
        KeyMode::Minor => MINOR_TONICS[tonic_pc as usize],
    };
    Some(KeyEstimate {
        key: Key::new(PitchName::new(step, alter), mode),
        correlation,
    })
}

fn pearson(xs: &[f64; 12], ys: &[f64; 12]) -> Option<f64> {
    let mean_x = xs.iter().sum::<f64>() / 12.0;
    let mean_y = ys.iter().sum::<f64>() / 12.0;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 { None } else { Some(cov / denom) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn histogram_of(pcs: &[(i32, f64)]) -> PitchClassHistogram {
        let mut h = PitchClassHistogram::new();
        for &(pc, w) in pcs {
            h.add(pc, w);
        }
        h
    }

    #[test]
    fn test_c_major_scale_and_cadence() {
        // Tonic and dominant triads weighted more than the passing notes.
        let h = histogram_of(&[
            (0, 6.0),
            (2, 2.0),
            (4, 4.0),
            (5, 2.0),
            (7, 5.0),
            (9, 1.0),
            (11, 2.0),
        ]);
        let est = detect_key(&h).unwrap();
        assert_eq!(est.key, "C".parse().unwrap());
    }

    #[test]
    fn test_a_minor_with_leading_tone() {
        let h = histogram_of(&[
            (9, 6.0),
            (0, 4.0),
            (4, 5.0),
            (11, 1.0),
            (2, 2.0),
            (5, 1.0),
            (8, 2.0),
        ]);
        let est = detect_key(&h).unwrap();
        assert_eq!(est.key, "Am".parse().unwrap());
    }

    #[test]
    fn test_empty_and_flat_histograms() {
        assert!(detect_key(&PitchClassHistogram::new()).is_none());
        let flat = histogram_of(&(0..12).map(|pc| (pc, 1.0)).collect::<Vec<_>>());
        assert!(detect_key(&flat).is_none());
    }

    #[test]
    fn test_flat_key_spelling() {
        // Bb major triad plus F7 colour.
        let h = histogram_of(&[(10, 6.0), (2, 4.0), (5, 5.0), (3, 2.0), (9, 2.0), (0, 1.0)]);
        let est = detect_key(&h).unwrap();
        assert_eq!(est.key.tonic().to_string(), "Bb");
    }
}
