//! Diehard style tests.
//!
//! Every test here returns -1.0 when its input is too short. RanksOfMatrices,
//! Runs and Gcd accept an optional hash closure that is expanded with
//! [`generate`] to pad (or, for Gcd, replace) a short input.

use super::{chi_square, Family, TestResult};
use crate::numeric::{binomial_probability, igamc, poisson_cdf, poisson_sf, two_sided_p};
use crate::stream::{generate, BitString};
use std::borrow::Cow;
use std::f64::consts::{LN_2, PI};
use std::sync::OnceLock;
use tracing::{debug, trace};

/// Stream length used by [`craps_on_stream`] in the battery.
pub const DEFAULT_STREAM_BITS: usize = 1_500_000;

const BIRTHDAYS: usize = 512;
const BIRTHDAY_BITS: usize = 24;
const BIRTHDAY_MAX_SAMPLES: usize = 10_000;

const RANK_CELLS: usize = 32 * 32;
const RANK_TARGET_MATRICES: usize = 200;
const RANK_MIN_MATRICES: usize = 10;
const RANK_PROBABILITIES: [f64; 3] = [0.2887880950866024, 0.5775761901732048, 0.13363571474019285];

const PERMUTATION_WORD: usize = 5;
const PERMUTATION_GROUP: usize = 32;
const PERMUTATION_MIN_GROUPS: usize = 100;

const RUNS_BLOCK: usize = 20_000;
const RUNS_MIN_BLOCKS: usize = 20;
const RUN_LENGTH_PROBABILITIES: [f64; 6] = [0.5, 0.25, 0.125, 0.0625, 0.03125, 0.03125];

const GCD_WORDS: usize = 100_000;

const SQUEEZE_MAX_TRIALS: usize = 100_000;
const SQUEEZE_MIN_TRIALS: usize = 100;

const CRAPS_MAX_GAMES: usize = 200_000;
const CRAPS_MIN_GAMES: usize = 1000;
const CRAPS_WIN_PROBABILITY: f64 = 244.0 / 495.0;

/// Birthday spacings on samples of 512 24-bit birthdays.
///
/// Duplicate spacings over all samples are compared with Poisson(2·samples).
pub fn birthday_spacings(bits: &BitString) -> f64 {
    let sample_bits = BIRTHDAYS * BIRTHDAY_BITS;
    let samples = (bits.len() / sample_bits).min(BIRTHDAY_MAX_SAMPLES);
    if samples == 0 {
        debug!(test = "BirthdaySpacings", bits = bits.len(), "Input too short");
        return -1.0;
    }

    let mut duplicates = 0u64;
    let mut days = Vec::with_capacity(BIRTHDAYS);
    let mut spacings = Vec::with_capacity(BIRTHDAYS);
    for sample in 0..samples {
        let start = sample * sample_bits;
        days.clear();
        days.extend((0..BIRTHDAYS).map(|i| bits.read_uint(start + i * BIRTHDAY_BITS, BIRTHDAY_BITS)));
        days.sort_unstable();

        spacings.clear();
        spacings.push(days[0]);
        spacings.extend(days.windows(2).map(|w| w[1] - w[0]));
        spacings.sort_unstable();
        let before = spacings.len();
        spacings.dedup();
        duplicates += (before - spacings.len()) as u64;
    }

    let n = BIRTHDAYS as f64;
    let lambda = samples as f64 * n.powi(3) / (4.0 * 2f64.powi(BIRTHDAY_BITS as i32));
    trace!(test = "BirthdaySpacings", samples, duplicates, lambda, "Collision total");
    let lower = poisson_cdf(duplicates, lambda);
    let upper = poisson_sf(duplicates, lambda);
    (2.0 * lower.min(upper)).min(1.0)
}

/// Popcount of each byte against Binomial(8, ½), df = 8.
pub fn count_ones(bits: &BitString) -> f64 {
    let bytes = bits.len() / 8;
    if bytes < 10 {
        debug!(test = "CountOnes", bytes, "Input too short");
        return -1.0;
    }

    let mut counts = [0u64; 9];
    for chunk in bits.as_slice().chunks_exact(8) {
        counts[chunk.iter().filter(|&&b| b == 1).count()] += 1;
    }

    let n = bytes as f64;
    let chi2 = chi_square(
        counts
            .iter()
            .enumerate()
            .map(|(k, &c)| (c as f64, n * binomial_probability(8, k as u32, 0.5))),
    );
    igamc(4.0, chi2 / 2.0)
}

/// Appends `hash` output until `bits` holds at least `target` bits.
fn pad_with<'a>(
    test: &'static str,
    bits: &'a BitString,
    target: usize,
    hash: Option<&dyn Fn(&[u8]) -> Vec<u8>>,
) -> Cow<'a, BitString> {
    match hash {
        Some(hash) if bits.len() < target => {
            let missing = target - bits.len();
            debug!(test, bits = bits.len(), padded = missing, "Padding from hash stream");
            let mut padded = bits.clone();
            padded.extend_from(&generate(hash, missing));
            Cow::Owned(padded)
        }
        _ => Cow::Borrowed(bits),
    }
}

/// GF(2) ranks of 32×32 matrices; df = 2.
///
/// With a hash, input shorter than 200 matrices is padded from its stream.
pub fn ranks_of_matrices(bits: &BitString, hash: Option<&dyn Fn(&[u8]) -> Vec<u8>>) -> f64 {
    let data = pad_with("RanksOfMatrices", bits, RANK_TARGET_MATRICES * RANK_CELLS, hash);
    let matrices = data.len() / RANK_CELLS;
    if matrices < RANK_MIN_MATRICES {
        debug!(test = "RanksOfMatrices", matrices, "Too few matrices");
        return -1.0;
    }

    let classes = super::nist::rank_classes(data.as_slice(), matrices);
    let n = matrices as f64;
    let chi2 = chi_square(
        classes
            .iter()
            .zip(RANK_PROBABILITIES)
            .map(|(&c, p)| (c as f64, n * p)),
    );
    igamc(1.0, chi2 / 2.0)
}

/// Probability that no 5-bit pattern in the `avoid` mask occurs among the
/// sliding windows of a uniformly random group span.
///
/// The last four bits are a complete state for 5-bit windows.
fn avoidance_probability(avoid: u32) -> f64 {
    let mut states = [1.0 / 16.0; 16];
    for _ in 0..PERMUTATION_GROUP {
        let mut next = [0.0; 16];
        for (state, &p) in states.iter().enumerate() {
            for bit in 0..2 {
                let window = (state << 1) | bit;
                if (avoid >> window) & 1 == 0 {
                    next[window & 15] += p / 2.0;
                }
            }
        }
        states = next;
    }
    states.iter().sum()
}

/// Exact mean and variance of the distinct-window count of one group.
fn distinct_window_moments() -> (f64, f64) {
    static MOMENTS: OnceLock<(f64, f64)> = OnceLock::new();
    *MOMENTS.get_or_init(|| {
        let patterns = 1usize << PERMUTATION_WORD;
        let seen: Vec<f64> = (0..patterns)
            .map(|w| 1.0 - avoidance_probability(1 << w))
            .collect();
        let mean: f64 = seen.iter().sum();

        // E[D²] = Σ P(w) + Σ_{w≠v} P(w and v both occur).
        let mut second = mean;
        for w in 0..patterns {
            for v in (0..patterns).filter(|&v| v != w) {
                second += seen[w] + seen[v] - 1.0 + avoidance_probability((1 << w) | (1 << v));
            }
        }
        (mean, second - mean * mean)
    })
}

/// Distinct patterns among the 32 sliding 5-bit windows starting at `start`.
fn distinct_windows(bits: &BitString, start: usize) -> u32 {
    let mut seen = 0u32;
    for offset in 0..PERMUTATION_GROUP {
        seen |= 1 << bits.read_uint(start + offset, PERMUTATION_WORD);
    }
    seen.count_ones()
}

/// Distinct patterns among 32 overlapping 5-bit windows, per disjoint
/// 36-bit group.
///
/// The total is compared with the exact mean and variance for dependent
/// windows over uniform bits.
pub fn overlapping_permutations(bits: &BitString) -> f64 {
    let span = PERMUTATION_GROUP + PERMUTATION_WORD - 1;
    let groups = bits.len() / span;
    if groups < PERMUTATION_MIN_GROUPS {
        debug!(test = "OverlappingPermutations", groups, "Too few groups");
        return -1.0;
    }

    let distinct: u64 = (0..groups)
        .map(|g| u64::from(distinct_windows(bits, g * span)))
        .sum();

    let (mean, variance) = distinct_window_moments();
    let g = groups as f64;
    let z = (distinct as f64 - g * mean) / (g * variance).sqrt();
    two_sided_p(z)
}

/// Run lengths (1..≥6) within 20,000-bit blocks; at least 20 blocks.
pub fn runs(bits: &BitString, hash: Option<&dyn Fn(&[u8]) -> Vec<u8>>) -> f64 {
    let data = pad_with("Runs", bits, RUNS_BLOCK * RUNS_MIN_BLOCKS, hash);
    let blocks = data.len() / RUNS_BLOCK;
    if blocks < RUNS_MIN_BLOCKS {
        debug!(test = "Runs", blocks, "Too few blocks");
        return -1.0;
    }

    let mut counts = [0u64; 6];
    for block in data.as_slice().chunks_exact(RUNS_BLOCK) {
        let mut length = 1usize;
        for w in block.windows(2) {
            if w[0] == w[1] {
                length += 1;
            } else {
                counts[length.min(6) - 1] += 1;
                length = 1;
            }
        }
        counts[length.min(6) - 1] += 1;
    }

    let total = counts.iter().sum::<u64>() as f64;
    let chi2 = chi_square(
        counts
            .iter()
            .zip(RUN_LENGTH_PROBABILITIES)
            .map(|(&c, p)| (c as f64, total * p)),
    );
    igamc(2.5, chi2 / 2.0)
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Coprime rate of 32-bit word pairs against 6/π².
///
/// Fewer than 100,000 words are replaced by a fresh stream from `hash`.
pub fn gcd_test(bits: &BitString, hash: Option<&dyn Fn(&[u8]) -> Vec<u8>>) -> f64 {
    let required = GCD_WORDS * 32;
    let data = match hash {
        Some(hash) if bits.len() < required => {
            debug!(test = "Gcd", bits = bits.len(), required, "Regenerating from hash stream");
            Cow::Owned(generate(hash, required))
        }
        _ => Cow::Borrowed(bits),
    };

    if data.len() < required {
        debug!(test = "Gcd", bits = data.len(), "Input too short");
        return -1.0;
    }

    let words: Vec<u64> = data.words(32).collect();
    let pairs = words.len() / 2;
    if pairs == 0 {
        return -1.0;
    }

    let coprime = words
        .chunks_exact(2)
        .filter(|pair| gcd(pair[0], pair[1]) == 1)
        .count() as f64;

    let p = 6.0 / (PI * PI);
    let n = pairs as f64;
    let z = (coprime - n * p) / (n * p * (1.0 - p)).sqrt();
    two_sided_p(z)
}

/// Draws of U = (w + ½)/2^32 until Σ -ln U exceeds 32·ln 2.
///
/// The per-trial count of draws before crossing is Poisson(32·ln 2).
pub fn squeeze(bits: &BitString) -> f64 {
    let threshold = 32.0 * LN_2;
    let mut words = bits.words(32);
    let mut trials = Vec::new();

    'trials: while trials.len() < SQUEEZE_MAX_TRIALS {
        let mut draws = 0u64;
        let mut total = 0.0;
        while total <= threshold {
            let Some(w) = words.next() else {
                break 'trials;
            };
            let u = (w as f64 + 0.5) / 4_294_967_296.0;
            total -= u.ln();
            draws += 1;
        }
        trials.push(draws - 1);
    }

    if trials.len() < SQUEEZE_MIN_TRIALS {
        debug!(test = "Squeeze", trials = trials.len(), "Too few trials");
        return -1.0;
    }

    let t = trials.len() as f64;
    let mean = trials.iter().sum::<u64>() as f64 / t;
    let z = (mean - threshold) / (threshold / t).sqrt();
    two_sided_p(z)
}

/// Dice from 3-bit draws with values above 5 rejected.
struct Dice<'a> {
    bits: &'a BitString,
    position: usize,
}

impl Dice<'_> {
    fn roll(&mut self) -> Option<u64> {
        while self.position + 3 <= self.bits.len() {
            let v = self.bits.read_uint(self.position, 3);
            self.position += 3;
            if v <= 5 {
                return Some(v + 1);
            }
        }
        None
    }

    fn pair(&mut self) -> Option<u64> {
        Some(self.roll()? + self.roll()?)
    }

    /// Plays one game; `None` when the bits run out before it ends.
    fn game(&mut self) -> Option<bool> {
        let point = self.pair()?;
        match point {
            7 | 11 => Some(true),
            2 | 3 | 12 => Some(false),
            _ => loop {
                match self.pair()? {
                    7 => break Some(false),
                    s if s == point => break Some(true),
                    _ => {}
                }
            },
        }
    }
}

/// Win rate of simulated craps games against 244/495.
///
/// A game cut off by the end of the input is discarded.
pub fn craps(bits: &BitString) -> f64 {
    let mut dice = Dice { bits, position: 0 };
    let mut games = 0usize;
    let mut wins = 0usize;
    while games < CRAPS_MAX_GAMES {
        match dice.game() {
            Some(won) => {
                games += 1;
                wins += usize::from(won);
            }
            None => break,
        }
    }

    if games < CRAPS_MIN_GAMES {
        debug!(test = "Craps", games, "Too few games");
        return -1.0;
    }

    let n = games as f64;
    let p = CRAPS_WIN_PROBABILITY;
    let z = (wins as f64 - n * p) / (n * p * (1.0 - p)).sqrt();
    two_sided_p(z)
}

/// [`craps`] over `required_bits` generated from `hash`.
pub fn craps_on_stream<H>(hash: &H, required_bits: usize) -> f64
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
{
    craps(&generate(hash, required_bits))
}

/// Runs every Diehard test; `hash` pads the tests that accept it and feeds Craps.
pub fn battery(bits: &BitString, hash: &dyn Fn(&[u8]) -> Vec<u8>) -> Vec<TestResult> {
    let f = Family::Diehard;
    debug!(bits = bits.len(), "Running Diehard battery");

    vec![
        TestResult::new(f, "BirthdaySpacings", birthday_spacings(bits)),
        TestResult::new(f, "CountOnes", count_ones(bits)),
        TestResult::new(f, "RanksOfMatrices", ranks_of_matrices(bits, Some(hash))),
        TestResult::new(f, "OverlappingPermutations", overlapping_permutations(bits)),
        TestResult::new(f, "Runs", runs(bits, Some(hash))),
        TestResult::new(f, "Gcd", gcd_test(bits, Some(hash))),
        TestResult::new(f, "Squeeze", squeeze(bits)),
        TestResult::new(f, "Craps", craps_on_stream(hash, DEFAULT_STREAM_BITS)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::{keccak_hash, keccak_stream};

    const FLOOR: f64 = 1e-4;

    fn zeros(n: usize) -> BitString {
        BitString::from_bits(vec![0; n])
    }

    #[test]
    fn test_birthday_spacings() {
        assert_eq!(birthday_spacings(&zeros(12_287)), -1.0);
        assert!(birthday_spacings(&zeros(12_288 * 4)) < 1e-10);
        let p = birthday_spacings(keccak_stream());
        assert!(p > FLOOR && p <= 1.0);
    }

    #[test]
    fn test_count_ones() {
        assert_eq!(count_ones(&zeros(79)), -1.0);
        assert!(count_ones(&zeros(8000)) < 1e-10);
        assert!(count_ones(keccak_stream()) > FLOOR);
    }

    #[test]
    fn test_rank_probabilities_sum_to_one() {
        assert!((RANK_PROBABILITIES.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ranks_of_matrices() {
        let short = zeros(RANK_CELLS * 5);
        assert_eq!(ranks_of_matrices(&short, None), -1.0);
        // 5 zero matrices followed by 195 random ones still look random enough.
        assert!(ranks_of_matrices(&short, Some(&keccak_hash)) > 1e-6);
        assert!(ranks_of_matrices(&zeros(RANK_CELLS * 50), None) < 1e-10);
        assert!(ranks_of_matrices(keccak_stream(), None) > FLOOR);
    }

    #[test]
    fn test_overlapping_permutations() {
        assert_eq!(overlapping_permutations(&zeros(1000)), -1.0);
        assert!(overlapping_permutations(&zeros(100_000)) < 1e-10);
        assert!(overlapping_permutations(keccak_stream()) > FLOOR);
    }

    #[test]
    fn test_permutation_windows_slide() {
        // A single one at bit 4: sliding windows give 00001, 00010, 00100,
        // 01000, 10000 and 00000. Disjoint 5-bit words would give only two.
        let mut raw = vec![0u8; 36];
        raw[4] = 1;
        assert_eq!(distinct_windows(&BitString::from_bits(raw), 0), 6);
        assert_eq!(distinct_windows(&zeros(36), 0), 1);
    }

    #[test]
    fn test_permutation_moments() {
        assert_eq!(avoidance_probability(0), 1.0);
        assert_eq!(avoidance_probability(u32::MAX), 0.0);

        let (mean, variance) = distinct_window_moments();
        assert!(mean > 17.0 && mean < 23.0);
        assert!(variance > 0.0 && variance < 16.0);
    }

    #[test]
    fn test_period_five_stream_fails_permutations() {
        // Only five distinct windows per group.
        let bits = BitString::repeating(&[0, 0, 0, 0, 1], 36 * 200);
        assert!(overlapping_permutations(&bits) < 1e-10);
    }

    #[test]
    fn test_runs() {
        assert_eq!(runs(&zeros(1000), None), -1.0);
        assert!(runs(&BitString::repeating(&[0, 1], 400_000), None) < 1e-10);
        assert!(runs(keccak_stream(), None) > FLOOR);
        let padded = runs(&BitString::from_bits(keccak_stream().as_slice()[..1000].to_vec()), Some(&keccak_hash));
        assert!(padded > FLOOR);
    }

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(0, 0), 0);
        assert_eq!(gcd(7, 0), 7);
    }

    #[test]
    fn test_gcd_test() {
        assert_eq!(gcd_test(keccak_stream(), None), -1.0);
        assert!(gcd_test(keccak_stream(), Some(&keccak_hash)) > FLOOR);
        assert!(gcd_test(&zeros(GCD_WORDS * 32), None) < 1e-10);
    }

    #[test]
    fn test_squeeze() {
        assert_eq!(squeeze(&zeros(320)), -1.0);
        assert!(squeeze(&zeros(100_000)) < 1e-10);
        assert!(squeeze(keccak_stream()) > FLOOR);
    }

    #[test]
    fn test_craps() {
        assert_eq!(craps(&zeros(300)), -1.0);
        // Every die is a one: snake eyes lose every game.
        assert!(craps(&zeros(100_000)) < 1e-10);
        assert!(craps(keccak_stream()) > FLOOR);
    }

    #[test]
    fn test_battery_reports_every_test() {
        let bits = generate(&keccak_hash, 500_000);
        let results = battery(&bits, &keccak_hash);
        assert_eq!(results.len(), 8);
        assert!(results.iter().all(|r| r.family == Family::Diehard));
        assert!(results.iter().all(|r| !r.is_inapplicable()));
    }
}
