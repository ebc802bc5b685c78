//! NIST SP 800-22 style tests.
//!
//! Sentinels: NaN for Monobit, FrequencyWithinBlock, Runs, LongestRunOfOnes,
//! BinaryMatrixRank, DiscreteFourierTransform, OverlappingTemplate, Maurer,
//! LempelZiv and both excursion tests; -1.0 for LinearComplexity, Serial,
//! ApproximateEntropy and CumulativeSums. Runs returns exactly 0.0 when its
//! frequency pre-test fails.

use super::{chi_square, floor_power_of_two, result_from, AnalysisError, Family, TestResult};
use crate::numeric::{chi_squared_sf, erfc, igamc, ln_gamma, normal_cdf, sign_spectrum, Gf2Matrix};
use crate::stream::{generate, BitString};
use rand_core::RngCore;
use std::borrow::Cow;
use std::f64::consts::{LN_2, SQRT_2};
use tracing::{debug, trace};

/// Stream length used by the `*_on_stream` entry points.
pub const DEFAULT_STREAM_BITS: usize = 1_500_000;
/// Block length for [`frequency_within_block`] in the battery.
pub const DEFAULT_BLOCK_SIZE: usize = 128;
/// Template for [`non_overlapping_template`] in the battery.
pub const DEFAULT_TEMPLATE: &str = "000111";
/// Template length for [`overlapping_template`] in the battery.
pub const DEFAULT_OVERLAPPING_LENGTH: usize = 9;
/// Block length for [`linear_complexity`] in the battery.
pub const DEFAULT_LINEAR_COMPLEXITY_BLOCK: usize = 32;
/// Pattern length for [`serial`] in the battery.
pub const DEFAULT_SERIAL_LENGTH: usize = 2;
/// Pattern length for [`approximate_entropy`] in the battery.
pub const DEFAULT_APEN_LENGTH: usize = 2;

const LONGEST_RUN_BLOCK: usize = 128;
const LONGEST_RUN_PROBABILITIES: [f64; 6] = [
    0.1174035788,
    0.2429559595,
    0.2493228532,
    0.1751990705,
    0.1027013343,
    0.1124172037,
];

const RANK_SIDE: usize = 32;
const RANK_MIN_MATRICES: usize = 38;
const RANK_PROBABILITIES: [f64; 3] = [0.2888, 0.5776, 0.1336];

const DFT_MIN_BITS: usize = 100_000;

const TEMPLATE_BLOCK: usize = 1000;
const TEMPLATE_MIN_BLOCKS: usize = 5;
const TEMPLATE_MAX_LENGTH: usize = 21;

const OVERLAPPING_BLOCK: usize = 1032;
const OVERLAPPING_MIN_BITS: usize = 10_000;
const OVERLAPPING_MIN_BLOCKS: usize = 5;

/// (minimum n, L) pairs for Maurer's test.
const MAURER_THRESHOLDS: [(usize, usize); 10] = [
    (387_840, 6),
    (904_960, 7),
    (2_068_480, 8),
    (4_654_080, 9),
    (10_342_400, 10),
    (22_753_280, 11),
    (49_643_520, 12),
    (107_560_960, 13),
    (231_669_760, 14),
    (496_435_200, 15),
];
/// Expected value and variance of the statistic for L = 6..=15.
const MAURER_EXPECTED: [f64; 10] = [
    5.2177052, 6.1962507, 7.1836656, 8.1764248, 9.1723243, 10.170032, 11.168765, 12.168070,
    13.167693, 14.167488,
];
const MAURER_VARIANCE: [f64; 10] = [
    2.954, 3.125, 3.238, 3.311, 3.356, 3.384, 3.401, 3.410, 3.416, 3.419,
];
const MAURER_MIN_TEST_BLOCKS: usize = 1000;

const LEMPEL_ZIV_BITS: usize = 1_000_000;
const LEMPEL_ZIV_MEAN: f64 = 69588.2019;
const LEMPEL_ZIV_SIGMA: f64 = 73.23726011;

const EXCURSION_MIN_BITS: usize = 1_000_000;
const EXCURSION_MIN_CYCLES: usize = 100;

fn invalid(test: &'static str, reason: impl Into<String>) -> AnalysisError {
    AnalysisError::invalid(test, reason)
}

fn ones(bits: &[u8]) -> usize {
    bits.iter().filter(|&&b| b == 1).count()
}

fn step(bit: u8) -> i64 {
    if bit == 1 {
        1
    } else {
        -1
    }
}

/// erfc(x) as a p-value for x >= 0.
fn tail(x: f64) -> f64 {
    erfc(x).clamp(0.0, 1.0)
}

/// Frequency (monobit) test on the normalized ±1 sum.
pub fn monobit(bits: &BitString) -> f64 {
    let n = bits.len();
    if n == 0 {
        debug!(test = "Monobit", "Empty input");
        return f64::NAN;
    }

    let sum: i64 = bits.as_slice().iter().map(|&b| step(b)).sum();
    let s_obs = sum.unsigned_abs() as f64 / (n as f64).sqrt();
    tail(s_obs / SQRT_2)
}

/// Frequency test within non-overlapping blocks of `block_size` bits.
pub fn frequency_within_block(bits: &BitString, block_size: usize) -> Result<f64, AnalysisError> {
    if block_size == 0 {
        return Err(invalid("FrequencyWithinBlock", "block size must be positive"));
    }

    let blocks = bits.len() / block_size;
    if blocks == 0 {
        debug!(test = "FrequencyWithinBlock", bits = bits.len(), block_size, "No complete block");
        return Ok(f64::NAN);
    }

    let m = block_size as f64;
    let chi2 = 4.0
        * m
        * bits
            .as_slice()
            .chunks_exact(block_size)
            .map(|block| (ones(block) as f64 / m - 0.5).powi(2))
            .sum::<f64>();

    Ok(igamc(blocks as f64 / 2.0, chi2 / 2.0))
}

/// Runs test: total number of runs against its expectation given the ones fraction.
///
/// Returns 0.0 when the frequency pre-test |π - ½| < 2/√n fails.
pub fn runs(bits: &BitString) -> f64 {
    let data = bits.as_slice();
    let n = data.len();
    if n == 0 {
        debug!(test = "Runs", "Empty input");
        return f64::NAN;
    }

    let nf = n as f64;
    let pi = ones(data) as f64 / nf;
    if (pi - 0.5).abs() >= 2.0 / nf.sqrt() {
        debug!(test = "Runs", pi, "Frequency pre-test failed");
        return 0.0;
    }

    let spread = pi * (1.0 - pi);
    if spread == 0.0 {
        return 0.0;
    }

    let v_obs = 1 + data.windows(2).filter(|w| w[0] != w[1]).count();
    let numerator = (v_obs as f64 - 2.0 * nf * spread).abs();
    let denominator = 2.0 * (2.0 * nf).sqrt() * spread;
    tail(numerator / denominator)
}

fn longest_run(block: &[u8]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for &b in block {
        if b == 1 {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Longest run of ones in 128-bit blocks, six buckets (≤4, 5, 6, 7, 8, ≥9).
pub fn longest_run_of_ones(bits: &BitString) -> f64 {
    let blocks = bits.len() / LONGEST_RUN_BLOCK;
    if blocks == 0 {
        debug!(test = "LongestRunOfOnes", bits = bits.len(), "No complete block");
        return f64::NAN;
    }

    let mut counts = [0u64; 6];
    for block in bits.as_slice().chunks_exact(LONGEST_RUN_BLOCK) {
        let bucket = longest_run(block).clamp(4, 9) - 4;
        counts[bucket] += 1;
    }
    trace!(test = "LongestRunOfOnes", ?counts, "Bucket counts");

    let n = blocks as f64;
    let chi2 = chi_square(
        counts
            .iter()
            .zip(LONGEST_RUN_PROBABILITIES)
            .map(|(&c, p)| (c as f64, n * p)),
    );
    igamc(2.5, chi2 / 2.0)
}

/// Ranks of consecutive 32×32 matrices bucketed as full, full-1, lower.
pub(crate) fn rank_classes(bits: &[u8], matrices: usize) -> [u64; 3] {
    let cells = RANK_SIDE * RANK_SIDE;
    let mut classes = [0u64; 3];
    for chunk in bits.chunks_exact(cells).take(matrices) {
        let rank = Gf2Matrix::from_bits(RANK_SIDE, RANK_SIDE, chunk)
            .map(|m| m.rank())
            .unwrap_or(0);
        let class = if rank == RANK_SIDE {
            0
        } else if rank == RANK_SIDE - 1 {
            1
        } else {
            2
        };
        classes[class] += 1;
    }
    classes
}

/// Binary matrix rank test on 32×32 matrices; at least 38 are required.
pub fn binary_matrix_rank(bits: &BitString) -> f64 {
    let matrices = bits.len() / (RANK_SIDE * RANK_SIDE);
    if matrices < RANK_MIN_MATRICES {
        debug!(test = "BinaryMatrixRank", matrices, "Too few matrices");
        return f64::NAN;
    }

    let classes = rank_classes(bits.as_slice(), matrices);
    let n = matrices as f64;
    let chi2 = chi_square(
        classes
            .iter()
            .zip(RANK_PROBABILITIES)
            .map(|(&c, p)| (c as f64, n * p)),
    );
    (-chi2 / 2.0).exp()
}

/// Spectral test: share of DFT moduli below the 95% threshold.
///
/// The input is truncated to the largest power of two.
pub fn discrete_fourier_transform(bits: &BitString) -> f64 {
    if bits.len() < DFT_MIN_BITS {
        debug!(test = "DiscreteFourierTransform", bits = bits.len(), "Input too short");
        return f64::NAN;
    }

    let n = floor_power_of_two(bits.len());
    let spectrum = match sign_spectrum(&bits.as_slice()[..n]) {
        Ok(spectrum) => spectrum,
        Err(e) => {
            debug!(test = "DiscreteFourierTransform", error = %e, "Transform failed");
            return f64::NAN;
        }
    };

    let nf = n as f64;
    let threshold = ((1.0f64 / 0.05).ln() * nf).sqrt();
    let expected = 0.95 * nf / 2.0;
    let observed = spectrum[..n / 2].iter().filter(|&&m| m < threshold).count() as f64;
    let d = (observed - expected) / (nf * 0.95 * 0.05 / 4.0).sqrt();
    tail(d.abs() / SQRT_2)
}

/// Non-overlapping template matching in 1000-bit blocks.
///
/// Inputs shorter than five blocks are padded with bits drawn from `rng`.
pub fn non_overlapping_template<R>(
    bits: &BitString,
    template: &str,
    rng: &mut R,
) -> Result<f64, AnalysisError>
where
    R: RngCore + ?Sized,
{
    const NAME: &str = "NonOverlappingTemplate";

    let template: BitString = template
        .parse()
        .map_err(|e: crate::stream::ParseBitStringError| invalid(NAME, e.to_string()))?;
    let m = template.len();
    if m == 0 || m > TEMPLATE_MAX_LENGTH {
        return Err(invalid(
            NAME,
            format!("template length {m} outside 1..={TEMPLATE_MAX_LENGTH}"),
        ));
    }

    let minimum = TEMPLATE_BLOCK * TEMPLATE_MIN_BLOCKS;
    let data: Cow<'_, [u8]> = if bits.len() < minimum {
        let mut padded = bits.as_slice().to_vec();
        let missing = minimum - padded.len();
        padded.extend((0..missing).map(|_| (rng.next_u32() & 1) as u8));
        debug!(test = NAME, bits = bits.len(), padded = missing, "Padding with random bits");
        Cow::Owned(padded)
    } else {
        Cow::Borrowed(bits.as_slice())
    };

    let pattern = template.as_slice();
    let blocks = data.len() / TEMPLATE_BLOCK;
    let block_len = TEMPLATE_BLOCK as f64;
    let cells = 2f64.powi(m as i32);
    let mean = (TEMPLATE_BLOCK - m + 1) as f64 / cells;
    let variance = block_len * (1.0 / cells - (2.0 * m as f64 - 1.0) / (cells * cells));
    if variance <= 0.0 {
        return Ok(0.0);
    }

    let chi2: f64 = data
        .chunks_exact(TEMPLATE_BLOCK)
        .map(|block| {
            let mut hits = 0usize;
            let mut j = 0;
            while j + m <= block.len() {
                if &block[j..j + m] == pattern {
                    hits += 1;
                    j += m;
                } else {
                    j += 1;
                }
            }
            (hits as f64 - mean).powi(2) / variance
        })
        .sum();

    Ok(igamc(blocks as f64 / 2.0, chi2 / 2.0))
}

/// P(U = u) for the overlapping-template hit count in a block.
fn overlapping_probability(u: usize, eta: f64) -> f64 {
    if u == 0 {
        return (-eta).exp();
    }
    let uf = u as f64;
    (1..=u)
        .map(|l| {
            let lf = l as f64;
            (-eta - uf * LN_2 + lf * eta.ln() - ln_gamma(lf + 1.0) + ln_gamma(uf)
                - ln_gamma(lf)
                - ln_gamma(uf - lf + 1.0))
            .exp()
        })
        .sum()
}

fn overlapping_probabilities(m: usize) -> [f64; 6] {
    let lambda = (OVERLAPPING_BLOCK - m + 1) as f64 / 2f64.powi(m as i32);
    let eta = lambda / 2.0;
    let mut pi = [0.0; 6];
    for (u, slot) in pi.iter_mut().enumerate().take(5) {
        *slot = overlapping_probability(u, eta);
    }
    pi[5] = 1.0 - pi[..5].iter().sum::<f64>();
    pi
}

/// Overlapping matching of the all-ones template of length `m` (9 or 10).
pub fn overlapping_template(bits: &BitString, m: usize) -> Result<f64, AnalysisError> {
    if m != 9 && m != 10 {
        return Err(invalid(
            "OverlappingTemplate",
            format!("template length {m} must be 9 or 10"),
        ));
    }

    let blocks = bits.len() / OVERLAPPING_BLOCK;
    if bits.len() < OVERLAPPING_MIN_BITS || blocks < OVERLAPPING_MIN_BLOCKS {
        debug!(test = "OverlappingTemplate", bits = bits.len(), "Input too short");
        return Ok(f64::NAN);
    }

    let pi = overlapping_probabilities(m);
    let n = blocks as f64;
    if pi.iter().any(|p| n * p < 5.0) {
        debug!(test = "OverlappingTemplate", blocks, "Expected cell count below 5");
        return Ok(f64::NAN);
    }

    let mut counts = [0u64; 6];
    for block in bits.as_slice().chunks_exact(OVERLAPPING_BLOCK) {
        let mut run = 0;
        let mut hits = 0usize;
        for &b in block {
            run = if b == 1 { run + 1 } else { 0 };
            if run >= m {
                hits += 1;
            }
        }
        counts[hits.min(5)] += 1;
    }

    let chi2 = chi_square(counts.iter().zip(pi).map(|(&c, p)| (c as f64, n * p)));
    Ok(igamc(2.5, chi2 / 2.0))
}

/// Maurer's universal statistical test.
///
/// L is chosen from n; at least 1000 test blocks must remain after the
/// Q = 10·2^L training blocks.
pub fn maurer_universal(bits: &BitString) -> f64 {
    let n = bits.len();
    let Some(&(_, l)) = MAURER_THRESHOLDS.iter().rev().find(|(min, _)| n >= *min) else {
        debug!(test = "MaurerUniversal", bits = n, "Input too short");
        return f64::NAN;
    };

    let q = 10 * (1usize << l);
    let total = n / l;
    if total < q + MAURER_MIN_TEST_BLOCKS {
        debug!(test = "MaurerUniversal", bits = n, l, "Too few test blocks");
        return f64::NAN;
    }
    let k = total - q;

    let mut last_seen = vec![0usize; 1 << l];
    for i in 0..q {
        last_seen[bits.read_uint(i * l, l) as usize] = i + 1;
    }

    let mut sum = 0.0;
    for i in q..total {
        let pattern = bits.read_uint(i * l, l) as usize;
        sum += ((i + 1 - last_seen[pattern]) as f64).log2();
        last_seen[pattern] = i + 1;
    }

    let kf = k as f64;
    let lf = l as f64;
    let statistic = sum / kf;
    let c = 0.7 - 0.8 / lf + (4.0 + 32.0 / lf) * kf.powf(-3.0 / lf) / 15.0;
    let sigma = c * (MAURER_VARIANCE[l - 6] / kf).sqrt();
    trace!(test = "MaurerUniversal", l, k, statistic, "Statistic");
    tail((statistic - MAURER_EXPECTED[l - 6]).abs() / (SQRT_2 * sigma))
}

/// Counts incremental-parsing phrases with a binary trie; a trailing
/// incomplete phrase counts as one.
fn phrase_count(data: &[u8]) -> usize {
    let mut trie: Vec<[u32; 2]> = vec![[0, 0]];
    let mut phrases = 0;
    let mut node = 0usize;

    for &b in data {
        let bit = usize::from(b & 1);
        let child = trie[node][bit];
        if child == 0 {
            trie.push([0, 0]);
            trie[node][bit] = (trie.len() - 1) as u32;
            phrases += 1;
            node = 0;
        } else {
            node = child as usize;
        }
    }

    if node != 0 {
        phrases += 1;
    }
    phrases
}

/// Lempel-Ziv compression test on the first 10^6 bits.
pub fn lempel_ziv(bits: &BitString) -> f64 {
    if bits.len() < LEMPEL_ZIV_BITS {
        debug!(test = "LempelZiv", bits = bits.len(), "Input too short");
        return f64::NAN;
    }

    let words = phrase_count(&bits.as_slice()[..LEMPEL_ZIV_BITS]);
    let z = (words as f64 - LEMPEL_ZIV_MEAN) / LEMPEL_ZIV_SIGMA;
    tail(z.abs() / SQRT_2)
}

/// Length of the shortest LFSR generating `block`.
fn berlekamp_massey(block: &[u8]) -> usize {
    let n = block.len();
    let mut c = vec![0u8; n + 1];
    let mut b = vec![0u8; n + 1];
    c[0] = 1;
    b[0] = 1;
    let mut l = 0usize;
    let mut m: isize = -1;

    for i in 0..n {
        let mut d = block[i];
        for j in 1..=l {
            d ^= c[j] & block[i - j];
        }
        if d == 1 {
            let t = c.clone();
            let shift = (i as isize - m) as usize;
            for j in 0..=(n - shift) {
                c[j + shift] ^= b[j];
            }
            if 2 * l <= i {
                l = i + 1 - l;
                m = i as isize;
                b = t;
            }
        }
    }
    l
}

/// Linear complexity of `block_size`-bit blocks, three-bucket χ².
///
/// Returns -1.0 with fewer than four blocks.
pub fn linear_complexity(bits: &BitString, block_size: usize) -> Result<f64, AnalysisError> {
    if block_size == 0 {
        return Err(invalid("LinearComplexity", "block size must be positive"));
    }

    let blocks = bits.len() / block_size;
    if blocks < 4 {
        debug!(test = "LinearComplexity", blocks, "Too few blocks");
        return Ok(-1.0);
    }

    let m = block_size as f64;
    let parity = if block_size % 2 == 0 { 1.0 } else { -1.0 };
    let mean = m / 2.0 + (9.0 - parity) / 36.0 - (m / 3.0 + 2.0 / 9.0) / 2f64.powi(block_size.min(1023) as i32);

    let mut counts = [0u64; 3];
    for block in bits.as_slice().chunks_exact(block_size) {
        let l = berlekamp_massey(block) as f64;
        let t = parity * (l - mean) + 2.0 / 9.0;
        let bucket = if t <= -0.5 {
            0
        } else if t <= 0.5 {
            1
        } else {
            2
        };
        counts[bucket] += 1;
    }

    let n = blocks as f64;
    let pi = [1.0 / 6.0, 0.5, 1.0 / 3.0];
    let chi2 = chi_square(counts.iter().zip(pi).map(|(&c, p)| (c as f64, n * p)));
    Ok((-chi2 / 2.0).exp())
}

/// Serial test on non-overlapping `m`-bit patterns, df = 2^m - 1.
///
/// Returns -1.0 when n < 10·2^m.
pub fn serial(bits: &BitString, m: usize) -> Result<f64, AnalysisError> {
    if m == 0 || m > 16 {
        return Err(invalid("Serial", format!("pattern length {m} outside 1..=16")));
    }

    let cells = 1usize << m;
    if bits.len() < 10 * cells {
        debug!(test = "Serial", bits = bits.len(), m, "Input too short");
        return Ok(-1.0);
    }

    let mut counts = vec![0u64; cells];
    for word in bits.words(m) {
        counts[word as usize] += 1;
    }

    let expected = (bits.len() / m) as f64 / cells as f64;
    let chi2 = chi_square(counts.iter().map(|&c| (c as f64, expected)));
    Ok(igamc((cells - 1) as f64 / 2.0, chi2 / 2.0))
}

/// Σ π ln π over circular `m`-bit windows.
fn phi(data: &[u8], m: usize) -> f64 {
    let n = data.len();
    let mask = (1usize << m) - 1;
    let mut counts = vec![0u64; 1 << m];
    let mut window = 0usize;
    for &b in &data[..m - 1] {
        window = (window << 1) | usize::from(b);
    }
    for i in 0..n {
        window = ((window << 1) | usize::from(data[(i + m - 1) % n])) & mask;
        counts[window] += 1;
    }

    let nf = n as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / nf;
            p * p.ln()
        })
        .sum()
}

/// Approximate entropy with circular windows of length m and m + 1.
///
/// χ² = 2n(ln 2 - ApEn) is referred to df = 2^(m-1). Returns -1.0 for m = 0 or n < m + 1.
pub fn approximate_entropy(bits: &BitString, m: usize) -> Result<f64, AnalysisError> {
    if m > 20 {
        return Err(invalid("ApproximateEntropy", format!("pattern length {m} above 20")));
    }

    let n = bits.len();
    if m == 0 || n < m + 1 {
        debug!(test = "ApproximateEntropy", bits = n, m, "Inapplicable");
        return Ok(-1.0);
    }

    let data = bits.as_slice();
    let apen = phi(data, m) - phi(data, m + 1);
    let chi2 = (2.0 * n as f64 * (LN_2 - apen)).max(0.0);
    Ok(chi_squared_sf(chi2, 2f64.powi(m as i32 - 1)))
}

/// Cumulative sums test, forward mode.
pub fn cusum(bits: &BitString) -> f64 {
    let n = bits.len();
    if n == 0 {
        debug!(test = "CumulativeSums", "Empty input");
        return -1.0;
    }

    let mut sum = 0i64;
    let mut z = 0i64;
    for &b in bits.as_slice() {
        sum += step(b);
        z = z.max(sum.abs());
    }
    if z == 0 {
        return 1.0;
    }

    let n = n as i64;
    let sqrt_n = (n as f64).sqrt();
    let zf = z as f64;

    let mut sum1 = 0.0;
    for k in ((-n / z + 1) / 4)..=((n / z - 1) / 4) {
        let k = k as f64;
        sum1 += normal_cdf((4.0 * k + 1.0) * zf / sqrt_n) - normal_cdf((4.0 * k - 1.0) * zf / sqrt_n);
    }

    let mut sum2 = 0.0;
    for k in ((-n / z - 3) / 4)..=((n / z - 1) / 4) {
        let k = k as f64;
        sum2 += normal_cdf((4.0 * k + 3.0) * zf / sqrt_n) - normal_cdf((4.0 * k + 1.0) * zf / sqrt_n);
    }

    (1.0 - sum1 + sum2).clamp(0.0, 1.0)
}

/// Probabilities of 0..=4 and ≥5 visits to state `x` in one cycle.
fn excursion_probabilities(x: u32) -> [f64; 6] {
    let x = f64::from(x);
    let stay = 1.0 - 1.0 / (2.0 * x);
    let first = 1.0 / (4.0 * x * x);
    [
        stay,
        first,
        first * stay,
        first * stay.powi(2),
        first * stay.powi(3),
        stay.powi(4) / (2.0 * x),
    ]
}

/// Partial sums of the ±1 walk.
fn walk(bits: &BitString) -> impl Iterator<Item = i64> + '_ {
    bits.as_slice().iter().scan(0i64, |s, &b| {
        *s += step(b);
        Some(*s)
    })
}

/// Random excursions test over states ±1..±4; the smallest p-value.
///
/// A final walk segment that does not return to zero counts as a cycle.
pub fn random_excursions(bits: &BitString) -> f64 {
    if bits.len() < EXCURSION_MIN_BITS {
        debug!(test = "RandomExcursions", bits = bits.len(), "Input too short");
        return f64::NAN;
    }

    const STATES: [i64; 8] = [-4, -3, -2, -1, 1, 2, 3, 4];
    let index = |s: i64| if s < 0 { (s + 4) as usize } else { (s + 3) as usize };

    let mut visits = [[0u64; 6]; 8];
    let mut current = [0u64; 8];
    let mut cycles = 0usize;
    let mut last = 0i64;

    let mut close = |current: &mut [u64; 8]| {
        for (state, &count) in current.iter().enumerate() {
            visits[state][count.min(5) as usize] += 1;
        }
        *current = [0; 8];
    };

    for s in walk(bits) {
        if s == 0 {
            close(&mut current);
            cycles += 1;
        } else if s.abs() <= 4 {
            current[index(s)] += 1;
        }
        last = s;
    }
    if last != 0 {
        close(&mut current);
        cycles += 1;
    }

    if cycles < EXCURSION_MIN_CYCLES {
        debug!(test = "RandomExcursions", cycles, "Too few cycles");
        return f64::NAN;
    }

    let j = cycles as f64;
    STATES
        .iter()
        .map(|&x| {
            let pi = excursion_probabilities(x.unsigned_abs() as u32);
            let chi2 = chi_square(
                visits[index(x)]
                    .iter()
                    .zip(pi)
                    .map(|(&v, p)| (v as f64, j * p)),
            );
            let p = igamc(2.5, chi2 / 2.0);
            trace!(test = "RandomExcursions", state = x, p, "State p-value");
            p
        })
        .fold(f64::INFINITY, f64::min)
}

/// Random excursions variant over states ±1..±9; the smallest p-value.
pub fn random_excursions_variant(bits: &BitString) -> f64 {
    if bits.len() < EXCURSION_MIN_BITS {
        debug!(test = "RandomExcursionsVariant", bits = bits.len(), "Input too short");
        return f64::NAN;
    }

    let mut visits = [0u64; 19];
    let mut cycles = 0u64;
    let mut last = 0i64;
    for s in walk(bits) {
        if s == 0 {
            cycles += 1;
        } else if s.abs() <= 9 {
            visits[(s + 9) as usize] += 1;
        }
        last = s;
    }
    if last != 0 {
        cycles += 1;
    }

    if cycles == 0 {
        debug!(test = "RandomExcursionsVariant", "No cycles");
        return f64::NAN;
    }

    let j = cycles as f64;
    (-9i64..=9)
        .filter(|&x| x != 0)
        .map(|x| {
            let xi = visits[(x + 9) as usize] as f64;
            let spread = (2.0 * j * (4.0 * x.abs() as f64 - 2.0)).sqrt();
            tail((xi - j).abs() / spread)
        })
        .fold(f64::INFINITY, f64::min)
}

/// [`maurer_universal`] over `required_bits` generated from `hash`.
pub fn maurer_universal_on_stream<H>(hash: &H, required_bits: usize) -> f64
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
{
    maurer_universal(&generate(hash, required_bits))
}

/// [`lempel_ziv`] over `required_bits` generated from `hash`.
pub fn lempel_ziv_on_stream<H>(hash: &H, required_bits: usize) -> f64
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
{
    lempel_ziv(&generate(hash, required_bits))
}

/// [`random_excursions`] over `required_bits` generated from `hash`.
pub fn random_excursions_on_stream<H>(hash: &H, required_bits: usize) -> f64
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
{
    random_excursions(&generate(hash, required_bits))
}

/// [`random_excursions_variant`] over `required_bits` generated from `hash`.
pub fn random_excursions_variant_on_stream<H>(hash: &H, required_bits: usize) -> f64
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
{
    random_excursions_variant(&generate(hash, required_bits))
}

/// Runs every NIST test with default parameters.
///
/// Maurer, LempelZiv and both excursion tests run on a shared
/// [`DEFAULT_STREAM_BITS`] stream generated from `hash`; the rest use `bits`.
pub fn battery<H, R>(bits: &BitString, hash: &H, rng: &mut R) -> Vec<TestResult>
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
    R: RngCore + ?Sized,
{
    let f = Family::Nist;
    let stream = generate(hash, DEFAULT_STREAM_BITS);
    debug!(bits = bits.len(), stream_bits = stream.len(), "Running NIST battery");

    vec![
        TestResult::new(f, "Monobit", monobit(bits)),
        result_from(f, "FrequencyWithinBlock", frequency_within_block(bits, DEFAULT_BLOCK_SIZE)),
        TestResult::new(f, "Runs", runs(bits)),
        TestResult::new(f, "LongestRunOfOnes", longest_run_of_ones(bits)),
        TestResult::new(f, "BinaryMatrixRank", binary_matrix_rank(bits)),
        TestResult::new(f, "DiscreteFourierTransform", discrete_fourier_transform(bits)),
        result_from(
            f,
            "NonOverlappingTemplate",
            non_overlapping_template(bits, DEFAULT_TEMPLATE, rng),
        ),
        result_from(
            f,
            "OverlappingTemplate",
            overlapping_template(bits, DEFAULT_OVERLAPPING_LENGTH),
        ),
        TestResult::new(f, "MaurerUniversal", maurer_universal(&stream)),
        TestResult::new(f, "LempelZiv", lempel_ziv(&stream)),
        result_from(
            f,
            "LinearComplexity",
            linear_complexity(bits, DEFAULT_LINEAR_COMPLEXITY_BLOCK),
        ),
        result_from(f, "Serial", serial(bits, DEFAULT_SERIAL_LENGTH)),
        result_from(f, "ApproximateEntropy", approximate_entropy(bits, DEFAULT_APEN_LENGTH)),
        TestResult::new(f, "CumulativeSums", cusum(bits)),
        TestResult::new(f, "RandomExcursions", random_excursions(&stream)),
        TestResult::new(f, "RandomExcursionsVariant", random_excursions_variant(&stream)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::{keccak_hash, keccak_stream, weak_hash};
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    const FLOOR: f64 = 1e-4;

    fn zeros(n: usize) -> BitString {
        BitString::from_bits(vec![0; n])
    }

    fn alternating(n: usize) -> BitString {
        BitString::repeating(&[0, 1], n)
    }

    #[test]
    fn test_monobit() {
        assert!(monobit(&zeros(100)) < 1e-10);
        assert!((monobit(&alternating(1000)) - 1.0).abs() < 1e-6);
        assert!(monobit(&BitString::default()).is_nan());
        assert!(monobit(keccak_stream()) > FLOOR);
    }

    #[test]
    fn test_frequency_within_block() {
        assert!(frequency_within_block(keccak_stream(), 0).is_err());
        assert!(frequency_within_block(&zeros(10), 128).unwrap().is_nan());
        assert!(frequency_within_block(&zeros(1280), 128).unwrap() < 1e-10);
        assert!(frequency_within_block(keccak_stream(), 128).unwrap() > FLOOR);
    }

    #[test]
    fn test_runs() {
        assert!(runs(&alternating(1000)) < 1e-10);
        assert_eq!(runs(&zeros(1000)), 0.0);
        assert!(runs(&BitString::default()).is_nan());
        assert!(runs(keccak_stream()) > FLOOR);
    }

    #[test]
    fn test_longest_run_of_ones() {
        let ones = BitString::from_bits(vec![1; 128 * 20]);
        assert!(longest_run_of_ones(&ones) < 1e-10);
        assert!(longest_run_of_ones(&zeros(100)).is_nan());
        assert!(longest_run_of_ones(keccak_stream()) > FLOOR);
    }

    #[test]
    fn test_binary_matrix_rank() {
        assert!(binary_matrix_rank(&zeros(1024 * 37)).is_nan());
        assert!(binary_matrix_rank(&zeros(1024 * 40)) < 1e-10);
        assert!(binary_matrix_rank(keccak_stream()) > FLOOR);
    }

    #[test]
    fn test_rank_classes_of_zero_matrices() {
        assert_eq!(rank_classes(&[0; 2048], 2), [0, 0, 2]);
    }

    #[test]
    fn test_discrete_fourier_transform() {
        assert!(discrete_fourier_transform(&zeros(99_999)).is_nan());
        assert!(discrete_fourier_transform(&alternating(100_000)) < 1e-10);
        assert!(discrete_fourier_transform(keccak_stream()) > FLOOR);
    }

    #[test]
    fn test_non_overlapping_template() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let bits = keccak_stream();
        assert!(non_overlapping_template(bits, "01x", &mut rng).is_err());
        assert!(non_overlapping_template(bits, "", &mut rng).is_err());
        assert!(non_overlapping_template(bits, "000111", &mut rng).unwrap() > FLOOR);

        let short = non_overlapping_template(&zeros(100), "000111", &mut rng).unwrap();
        assert!((0.0..=1.0).contains(&short));

        let repeated = BitString::repeating(&[0, 0, 0, 1, 1, 1], 20_000);
        assert!(non_overlapping_template(&repeated, "000111", &mut rng).unwrap() < 1e-10);
    }

    #[test]
    fn test_overlapping_probabilities() {
        let pi = overlapping_probabilities(9);
        let expected = [0.367879, 0.183940, 0.137945, 0.099793, 0.073262, 0.137181];
        for (p, e) in pi.iter().zip(expected) {
            assert!((p - e).abs() < 5e-3, "{p} vs {e}");
        }
        for (p, e) in pi.iter().zip(expected).take(3) {
            assert!((p - e).abs() < 1e-5, "{p} vs {e}");
        }
        assert!((pi.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_overlapping_template() {
        assert!(overlapping_template(keccak_stream(), 8).is_err());
        assert!(overlapping_template(&zeros(5000), 9).unwrap().is_nan());
        let ones = BitString::from_bits(vec![1; 100_000]);
        assert!(overlapping_template(&ones, 9).unwrap() < 1e-10);
        assert!(overlapping_template(keccak_stream(), 9).unwrap() > FLOOR);
        assert!(overlapping_template(keccak_stream(), 10).unwrap() > FLOOR);
    }

    #[test]
    fn test_maurer_universal() {
        assert!(maurer_universal(&zeros(387_839)).is_nan());
        assert!(maurer_universal(&zeros(400_000)) < 1e-10);
        assert!(maurer_universal(keccak_stream()) > FLOOR);
    }

    #[test]
    fn test_phrase_count() {
        // 0 | 1 | 00 | 01 | 10 | 1
        let data = [0, 1, 0, 0, 0, 1, 1, 0, 1];
        assert_eq!(phrase_count(&data), 6);
    }

    #[test]
    fn test_lempel_ziv() {
        assert!(lempel_ziv(&zeros(999_999)).is_nan());
        assert!(lempel_ziv(&zeros(1_000_000)) < 1e-10);
        assert!(lempel_ziv(keccak_stream()) > FLOOR);
    }

    #[test]
    fn test_berlekamp_massey() {
        assert_eq!(berlekamp_massey(&[0, 0, 0, 0]), 0);
        assert_eq!(berlekamp_massey(&[0, 0, 0, 1]), 4);
        assert_eq!(berlekamp_massey(&[1, 1, 1, 1, 1]), 1);
        assert_eq!(berlekamp_massey(&[1, 0, 1, 0, 1, 0]), 2);
    }

    #[test]
    fn test_linear_complexity() {
        assert!(linear_complexity(keccak_stream(), 0).is_err());
        assert_eq!(linear_complexity(&zeros(100), 32).unwrap(), -1.0);
        assert!(linear_complexity(&zeros(32 * 100), 32).unwrap() < 1e-10);
        assert!(linear_complexity(keccak_stream(), 32).unwrap() > FLOOR);
    }

    #[test]
    fn test_serial() {
        assert!(serial(keccak_stream(), 0).is_err());
        assert!(serial(keccak_stream(), 17).is_err());
        assert_eq!(serial(&zeros(39), 2).unwrap(), -1.0);
        assert!(serial(&zeros(1000), 2).unwrap() < 1e-10);
        assert!(serial(keccak_stream(), 2).unwrap() > FLOOR);
    }

    #[test]
    fn test_approximate_entropy() {
        assert!(approximate_entropy(keccak_stream(), 21).is_err());
        assert_eq!(approximate_entropy(keccak_stream(), 0).unwrap(), -1.0);
        assert_eq!(approximate_entropy(&zeros(2), 2).unwrap(), -1.0);
        assert!(approximate_entropy(&alternating(1000), 2).unwrap() < 1e-10);
        assert!(approximate_entropy(keccak_stream(), 2).unwrap() > FLOOR);
    }

    #[test]
    fn test_one_round_stream_is_biased() {
        // One Keccak round leaves the sparse counter state mostly zero.
        let bits = generate(&weak_hash, 100_000);
        assert!(monobit(&bits) < 1e-6);
        assert!(frequency_within_block(&bits, DEFAULT_BLOCK_SIZE).unwrap() < 1e-6);
    }

    #[test]
    fn test_approximate_entropy_pi_digits() {
        // ApEn = 0.665393, χ² = 5.550792 with df = 2.
        let bits: BitString =
            "1100100100001111110110101010001000100001011010001100001000110100110001001100011001100010100010111000"
                .parse()
                .unwrap();
        let p = approximate_entropy(&bits, 2).unwrap();
        assert!((p - (-5.550792f64 / 2.0).exp()).abs() < 1e-5);
        assert!((p - 0.062325).abs() < 1e-5);
    }

    #[test]
    fn test_cusum() {
        assert_eq!(cusum(&BitString::default()), -1.0);
        assert!(cusum(&BitString::from_bits(vec![1; 1000])) < 1e-10);
        assert!(cusum(keccak_stream()) > FLOOR);
    }

    #[test]
    fn test_excursion_probabilities_sum_to_one() {
        for x in 1..=4 {
            let total: f64 = excursion_probabilities(x).iter().sum();
            assert!((total - 1.0).abs() < 1e-12);
        }
        assert_eq!(excursion_probabilities(1)[0], 0.5);
    }

    #[test]
    fn test_random_excursions() {
        assert!(random_excursions(&zeros(10_000)).is_nan());
        // The walk never returns to zero: a single cycle.
        assert!(random_excursions(&BitString::from_bits(vec![1; 1_000_000])).is_nan());
        let p = random_excursions(keccak_stream());
        assert!(p > 1e-6 && p <= 1.0);
    }

    #[test]
    fn test_random_excursions_variant() {
        assert!(random_excursions_variant(&zeros(10_000)).is_nan());
        let p = random_excursions_variant(keccak_stream());
        assert!(p > 1e-6 && p <= 1.0);
    }

    #[test]
    fn test_on_stream_matches_direct() {
        let direct = maurer_universal(&generate(&keccak_hash, 500_000));
        assert_eq!(maurer_universal_on_stream(&keccak_hash, 500_000), direct);
        assert!(lempel_ziv_on_stream(&keccak_hash, 1000).is_nan());
    }

    #[test]
    fn test_battery_reports_every_test() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let bits = generate(&keccak_hash, 200_000);
        let results = battery(&bits, &keccak_hash, &mut rng);
        assert_eq!(results.len(), 16);
        assert!(results.iter().all(|r| r.family == Family::Nist));
        assert!(results.iter().all(|r| !r.is_inapplicable()));
    }
}
