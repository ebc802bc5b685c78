//! TestU01 style tests.
//!
//! Values are read as consecutive non-overlapping `t`-bit integers. Every
//! test returns NaN when the input cannot support it, except
//! CouponCollector, which returns 0.0 when a segment exceeds its draw cap.
//! Each test has an `*_on_stream` form that generates exactly the bits its
//! parameters need.

use super::{chi_square, floor_power_of_two, result_from, AnalysisError, Family, TestResult};
use crate::numeric::{
    binomial_probability, chi_squared_sf, harmonic, harmonic_squares, igamc, sign_spectrum,
    two_sided_p,
};
use crate::stream::{generate, BitString};
use tracing::{debug, trace};

/// Bit width of collision values in the battery.
pub const DEFAULT_COLLISION_T: usize = 20;
/// Values drawn by the collision test in the battery.
pub const DEFAULT_COLLISION_N: usize = 500_000;
/// Bit width of gap values in the battery.
pub const DEFAULT_GAP_T: usize = 20;
/// Values drawn by the gap test in the battery.
pub const DEFAULT_GAP_N: usize = 500_000;
/// Autocorrelation lag in the battery.
pub const DEFAULT_LAG: usize = 1;
/// Block length of the Hamming weight test in the battery.
pub const DEFAULT_HAMMING_BLOCK: usize = 32;

const GAP_ALPHA: f64 = 0.0;
const GAP_BETA: f64 = 0.2;
const GAP_BUCKETS: usize = 11;

const AUTOCORRELATION_MAX_BITS: usize = 1_000_000;
const SPECTRAL_MAX_BITS: usize = 1 << 20;
const SPECTRAL_MIN_BITS: usize = 64;
const HAMMING_MAX_BLOCKS: usize = 100_000;
const COCHRAN_MIN_EXPECTED: f64 = 5.0;

/// Parameters of the overlapping serial test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialParams {
    /// Bits per value.
    pub t: usize,
    /// Tuple length.
    pub k: usize,
    /// Number of tuples.
    pub n: usize,
}

impl Default for SerialParams {
    fn default() -> Self {
        Self {
            t: 2,
            k: 2,
            n: 500_000,
        }
    }
}

/// Parameters of the multinomial test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultinomialParams {
    /// Bits per value.
    pub t: usize,
    /// Tuple length.
    pub k: usize,
    /// Number of tuples.
    pub n: usize,
}

impl Default for MultinomialParams {
    fn default() -> Self {
        Self {
            t: 2,
            k: 3,
            n: 200_000,
        }
    }
}

/// Parameters of the close-pairs bucket test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosePairsParams {
    /// Bits per value.
    pub t: usize,
    /// Number of values.
    pub n: usize,
    /// Number of buckets.
    pub buckets: usize,
}

impl Default for ClosePairsParams {
    fn default() -> Self {
        Self {
            t: 20,
            n: 200_000,
            buckets: 256,
        }
    }
}

/// Parameters of the coupon collector test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CouponParams {
    /// Bits per coupon; there are 2^t coupons.
    pub t: usize,
    /// Number of collection segments.
    pub segments: usize,
}

impl Default for CouponParams {
    fn default() -> Self {
        Self { t: 8, segments: 500 }
    }
}

fn invalid(test: &'static str, reason: impl Into<String>) -> AnalysisError {
    AnalysisError::invalid(test, reason)
}

fn read_values(bits: &BitString, t: usize, n: usize) -> Vec<u64> {
    bits.words(t).take(n).collect()
}

/// Occupancy of 2^t cells by up to `n` values, against Poisson cell counts.
///
/// Cells are classed as holding 0, 1, 2 or at least 3 values; df = 3.
pub fn collision(bits: &BitString, t: usize, n: usize) -> Result<f64, AnalysisError> {
    if !(1..=24).contains(&t) {
        return Err(invalid("Collision", format!("t = {t} outside 1..=24")));
    }

    let values = read_values(bits, t, n);
    if values.is_empty() {
        debug!(test = "Collision", bits = bits.len(), t, "No values");
        return Ok(f64::NAN);
    }

    let cells = 1usize << t;
    let mut occupancy = vec![0u32; cells];
    for &v in &values {
        occupancy[v as usize] += 1;
    }

    let mut classes = [0u64; 4];
    for &count in &occupancy {
        classes[(count as usize).min(3)] += 1;
    }

    let k = cells as f64;
    let lambda = values.len() as f64 / k;
    let e0 = k * (-lambda).exp();
    let e1 = e0 * lambda;
    let e2 = e1 * lambda / 2.0;
    let e3 = k - e0 - e1 - e2;
    trace!(test = "Collision", ?classes, lambda, "Occupancy classes");

    let chi2 = chi_square(
        classes
            .iter()
            .zip([e0, e1, e2, e3])
            .map(|(&c, e)| (c as f64, e)),
    );
    Ok(igamc(1.5, chi2 / 2.0))
}

/// Gap lengths between values falling in [0, 0.2).
///
/// Only gaps closed by a hit are counted; lengths 0..=9 and ≥10, df = 10.
pub fn gap(bits: &BitString, t: usize, n: usize) -> Result<f64, AnalysisError> {
    if !(1..=32).contains(&t) {
        return Err(invalid("Gap", format!("t = {t} outside 1..=32")));
    }

    let scale = 2f64.powi(t as i32);
    let mut counts = [0u64; GAP_BUCKETS];
    let mut length = 0usize;
    for v in bits.words(t).take(n) {
        let u = v as f64 / scale;
        if (GAP_ALPHA..GAP_BETA).contains(&u) {
            counts[length.min(GAP_BUCKETS - 1)] += 1;
            length = 0;
        } else {
            length += 1;
        }
    }

    let gaps = counts.iter().sum::<u64>();
    if gaps == 0 {
        debug!(test = "Gap", bits = bits.len(), "No complete gap");
        return Ok(f64::NAN);
    }

    let p = GAP_BETA - GAP_ALPHA;
    let total = gaps as f64;
    let expected = (0..GAP_BUCKETS).map(|k| {
        if k + 1 < GAP_BUCKETS {
            total * p * (1.0 - p).powi(k as i32)
        } else {
            total * (1.0 - p).powi(k as i32)
        }
    });
    let chi2 = chi_square(counts.iter().map(|&c| c as f64).zip(expected));
    Ok(igamc((GAP_BUCKETS - 1) as f64 / 2.0, chi2 / 2.0))
}

/// Agreement rate of bits `d` apart, over at most the first 10^6 bits.
pub fn autocorrelation(bits: &BitString, d: usize) -> Result<f64, AnalysisError> {
    if d == 0 {
        return Err(invalid("Autocorrelation", "lag must be positive"));
    }

    let data = &bits.as_slice()[..bits.len().min(AUTOCORRELATION_MAX_BITS)];
    if data.len() <= d {
        debug!(test = "Autocorrelation", bits = data.len(), d, "Input not longer than lag");
        return Ok(f64::NAN);
    }

    let m = data.len() - d;
    let agreements = data[..m]
        .iter()
        .zip(&data[d..])
        .filter(|(a, b)| a == b)
        .count() as f64;
    let mf = m as f64;
    let z = (agreements - mf / 2.0) / (mf / 4.0).sqrt();
    Ok(two_sided_p(z))
}

/// Share of DFT moduli below the 95% threshold over k = 1..=N/2.
///
/// N is the largest power of two not above min(n, 2^20).
pub fn spectral(bits: &BitString) -> f64 {
    let n = floor_power_of_two(bits.len().min(SPECTRAL_MAX_BITS));
    if n < SPECTRAL_MIN_BITS {
        debug!(test = "Spectral", bits = bits.len(), "Input too short");
        return f64::NAN;
    }

    let spectrum = match sign_spectrum(&bits.as_slice()[..n]) {
        Ok(spectrum) => spectrum,
        Err(e) => {
            debug!(test = "Spectral", error = %e, "Transform failed");
            return f64::NAN;
        }
    };

    let threshold = ((1.0f64 / 0.05).ln() * n as f64).sqrt();
    let half = n / 2;
    let below = spectrum[1..=half].iter().filter(|&&m| m < threshold).count() as f64;
    let m = half as f64;
    let z = (below - 0.95 * m) / (m * 0.95 * 0.05).sqrt();
    two_sided_p(z)
}

/// Popcounts of `block_len`-bit blocks against Binomial(L, ½).
///
/// Cells expecting fewer than five blocks are dropped; df = kept cells - 1.
pub fn hamming_weight(bits: &BitString, block_len: usize) -> Result<f64, AnalysisError> {
    if !(1..=64).contains(&block_len) {
        return Err(invalid(
            "HammingWeight",
            format!("block length {block_len} outside 1..=64"),
        ));
    }

    let blocks = (bits.len() / block_len).min(HAMMING_MAX_BLOCKS);
    let mut counts = vec![0u64; block_len + 1];
    for word in bits.words(block_len).take(blocks) {
        counts[word.count_ones() as usize] += 1;
    }

    let n = blocks as f64;
    let kept: Vec<(f64, f64)> = counts
        .iter()
        .enumerate()
        .map(|(w, &c)| (c as f64, n * binomial_probability(block_len as u32, w as u32, 0.5)))
        .filter(|&(_, e)| e >= COCHRAN_MIN_EXPECTED)
        .collect();

    if kept.len() < 2 {
        debug!(test = "HammingWeight", blocks, cells = kept.len(), "No degrees of freedom");
        return Ok(f64::NAN);
    }

    let df = (kept.len() - 1) as f64;
    Ok(chi_squared_sf(chi_square(kept), df))
}

/// Tuple index of `k` consecutive `t`-bit values starting at `start`.
fn tuple_index(values: &[u64], start: usize, k: usize, t: usize) -> usize {
    values[start..start + k]
        .iter()
        .fold(0usize, |acc, &v| (acc << t) | v as usize)
}

fn uniform_chi_square(counts: &[u64], n: usize) -> f64 {
    let expected = n as f64 / counts.len() as f64;
    chi_square(counts.iter().map(|&c| (c as f64, expected)))
}

/// Overlapping serial test: χ² of k-tuples minus χ² of (k-1)-tuples.
///
/// Reads n + k values; df = 2^{tk} - 2^{t(k-1)}.
pub fn serial(bits: &BitString, params: SerialParams) -> Result<f64, AnalysisError> {
    let SerialParams { t, k, n } = params;
    if !(1..=10).contains(&t) || !(2..=5).contains(&k) || t * k > 24 || n == 0 {
        return Err(invalid(
            "Serial",
            format!("(t, k, n) = ({t}, {k}, {n}) needs t in 1..=10, k in 2..=5, t·k <= 24, n > 0"),
        ));
    }

    if bits.len() < t * (n + k) {
        debug!(test = "Serial", bits = bits.len(), required = t * (n + k), "Input too short");
        return Ok(f64::NAN);
    }

    let values = read_values(bits, t, n + k);
    let mut full = vec![0u64; 1 << (t * k)];
    let mut reduced = vec![0u64; 1 << (t * (k - 1))];
    for i in 0..n {
        full[tuple_index(&values, i, k, t)] += 1;
        reduced[tuple_index(&values, i, k - 1, t)] += 1;
    }

    let statistic = uniform_chi_square(&full, n) - uniform_chi_square(&reduced, n);
    let df = (full.len() - reduced.len()) as f64;
    Ok(chi_squared_sf(statistic, df))
}

/// Overlapping k-tuple occupancy χ² over n tuples, df = 2^{tk} - 1.
pub fn multinomial(bits: &BitString, params: MultinomialParams) -> Result<f64, AnalysisError> {
    let MultinomialParams { t, k, n } = params;
    if !(1..=12).contains(&t) || !(2..=6).contains(&k) || n < 1000 || t * k > 24 {
        return Err(invalid(
            "Multinomial",
            format!(
                "(t, k, n) = ({t}, {k}, {n}) needs t in 1..=12, k in 2..=6, t·k <= 24, n >= 1000"
            ),
        ));
    }

    let required = (n + k - 1) * t;
    if bits.len() < required {
        debug!(test = "Multinomial", bits = bits.len(), required, "Input too short");
        return Ok(f64::NAN);
    }

    let cells = 1usize << (t * k);
    if (n as f64) / (cells as f64) < 5.0 {
        debug!(test = "Multinomial", n, cells, "Expected count below 5");
        return Ok(f64::NAN);
    }

    let values = read_values(bits, t, n + k - 1);
    let mut counts = vec![0u64; cells];
    for i in 0..n {
        counts[tuple_index(&values, i, k, t)] += 1;
    }

    Ok(chi_squared_sf(uniform_chi_square(&counts, n), (cells - 1) as f64))
}

/// Uniform occupancy of `buckets` equal cells of [0, 1), df = buckets - 1.
pub fn close_pairs(bits: &BitString, params: ClosePairsParams) -> Result<f64, AnalysisError> {
    let ClosePairsParams { t, n, buckets } = params;
    if !(1..=32).contains(&t) || buckets < 2 || n == 0 {
        return Err(invalid(
            "ClosePairs",
            format!("(t, n, buckets) = ({t}, {n}, {buckets}) needs t in 1..=32, buckets >= 2, n >= 1"),
        ));
    }

    if bits.len() < n * t {
        debug!(test = "ClosePairs", bits = bits.len(), required = n * t, "Input too short");
        return Ok(f64::NAN);
    }

    let scale = 2f64.powi(t as i32);
    let mut counts = vec![0u64; buckets];
    for v in bits.words(t).take(n) {
        let cell = ((v as f64 / scale) * buckets as f64) as usize;
        counts[cell.min(buckets - 1)] += 1;
    }

    Ok(chi_squared_sf(
        uniform_chi_square(&counts, n),
        (buckets - 1) as f64,
    ))
}

/// Draws needed to collect all 2^t coupons, averaged over segments.
///
/// Values are read circularly. Returns 0.0 if a segment needs more than
/// 64·2^t·(t + 1) draws.
pub fn coupon_collector(bits: &BitString, params: CouponParams) -> Result<f64, AnalysisError> {
    let CouponParams { t, segments } = params;
    if !(1..=16).contains(&t) || segments == 0 {
        return Err(invalid(
            "CouponCollector",
            format!("(t, segments) = ({t}, {segments}) needs t in 1..=16, segments >= 1"),
        ));
    }

    let values = read_values(bits, t, usize::MAX);
    if values.is_empty() {
        debug!(test = "CouponCollector", bits = bits.len(), "No values");
        return Ok(f64::NAN);
    }

    let d = 1usize << t;
    let cap = 64 * d * (t + 1);
    let mut cursor = values.iter().cycle();
    let mut seen = vec![false; d];
    let mut total = 0u64;

    for segment in 0..segments {
        seen.iter_mut().for_each(|s| *s = false);
        let mut collected = 0;
        let mut draws = 0;
        while collected < d {
            if draws == cap {
                debug!(test = "CouponCollector", segment, cap, "Draw cap exceeded");
                return Ok(0.0);
            }
            let Some(&v) = cursor.next() else {
                return Ok(f64::NAN);
            };
            draws += 1;
            if !seen[v as usize] {
                seen[v as usize] = true;
                collected += 1;
            }
        }
        total += draws as u64;
    }

    let df = d as f64;
    let expected = df * harmonic(d as u64);
    let variance = df * df * harmonic_squares(d as u64) - expected;
    let s = segments as f64;
    let z = (total as f64 / s - expected) / (variance / s).sqrt();
    Ok(two_sided_p(z))
}

/// [`collision`] over the `t·n` bits it needs, generated from `hash`.
pub fn collision_on_stream<H>(hash: &H, t: usize, n: usize) -> Result<f64, AnalysisError>
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
{
    collision(&generate(hash, t.saturating_mul(n)), t, n)
}

/// [`gap`] over the `t·n` bits it needs, generated from `hash`.
pub fn gap_on_stream<H>(hash: &H, t: usize, n: usize) -> Result<f64, AnalysisError>
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
{
    gap(&generate(hash, t.saturating_mul(n)), t, n)
}

/// [`autocorrelation`] over 10^6 bits generated from `hash`.
pub fn autocorrelation_on_stream<H>(hash: &H, d: usize) -> Result<f64, AnalysisError>
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
{
    autocorrelation(&generate(hash, AUTOCORRELATION_MAX_BITS), d)
}

/// [`spectral`] over 2^20 bits generated from `hash`.
pub fn spectral_on_stream<H>(hash: &H) -> f64
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
{
    spectral(&generate(hash, SPECTRAL_MAX_BITS))
}

/// [`hamming_weight`] over 10^5 blocks generated from `hash`.
pub fn hamming_weight_on_stream<H>(hash: &H, block_len: usize) -> Result<f64, AnalysisError>
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
{
    hamming_weight(
        &generate(hash, block_len.saturating_mul(HAMMING_MAX_BLOCKS)),
        block_len,
    )
}

/// [`serial`] over the `t·(n + k)` bits it needs, generated from `hash`.
pub fn serial_on_stream<H>(hash: &H, params: SerialParams) -> Result<f64, AnalysisError>
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
{
    let required = params.t.saturating_mul(params.n.saturating_add(params.k));
    serial(&generate(hash, required), params)
}

/// [`multinomial`] over the `t·(n + k - 1)` bits it needs, generated from `hash`.
pub fn multinomial_on_stream<H>(hash: &H, params: MultinomialParams) -> Result<f64, AnalysisError>
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
{
    let required = params
        .t
        .saturating_mul(params.n.saturating_add(params.k).saturating_sub(1));
    multinomial(&generate(hash, required), params)
}

/// [`close_pairs`] over the `t·n` bits it needs, generated from `hash`.
pub fn close_pairs_on_stream<H>(hash: &H, params: ClosePairsParams) -> Result<f64, AnalysisError>
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
{
    close_pairs(&generate(hash, params.t.saturating_mul(params.n)), params)
}

/// [`coupon_collector`] over roughly twice the expected draws, generated from `hash`.
pub fn coupon_collector_on_stream<H>(hash: &H, params: CouponParams) -> Result<f64, AnalysisError>
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
{
    let t = params.t.min(16);
    let d = 1u64 << t;
    let draws = 2.0 * params.segments as f64 * d as f64 * harmonic(d);
    let required = (draws.ceil() as usize).saturating_mul(t.max(1));
    coupon_collector(&generate(hash, required), params)
}

/// Runs every TestU01 test on streams generated from `hash` with default parameters.
pub fn battery<H>(hash: &H) -> Vec<TestResult>
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
{
    let f = Family::TestU01;
    debug!("Running TestU01 battery");

    vec![
        result_from(
            f,
            "Collision",
            collision_on_stream(hash, DEFAULT_COLLISION_T, DEFAULT_COLLISION_N),
        ),
        result_from(f, "Gap", gap_on_stream(hash, DEFAULT_GAP_T, DEFAULT_GAP_N)),
        result_from(f, "Autocorrelation", autocorrelation_on_stream(hash, DEFAULT_LAG)),
        TestResult::new(f, "Spectral", spectral_on_stream(hash)),
        result_from(
            f,
            "HammingWeight",
            hamming_weight_on_stream(hash, DEFAULT_HAMMING_BLOCK),
        ),
        result_from(f, "Serial", serial_on_stream(hash, SerialParams::default())),
        result_from(
            f,
            "Multinomial",
            multinomial_on_stream(hash, MultinomialParams::default()),
        ),
        result_from(
            f,
            "ClosePairs",
            close_pairs_on_stream(hash, ClosePairsParams::default()),
        ),
        result_from(
            f,
            "CouponCollector",
            coupon_collector_on_stream(hash, CouponParams::default()),
        ),
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
    fn test_collision() {
        assert!(collision(keccak_stream(), 0, 10).is_err());
        assert!(collision(keccak_stream(), 25, 10).is_err());
        assert!(collision(&zeros(5), 8, 10).unwrap().is_nan());
        assert!(collision(&zeros(8000), 8, 1000).unwrap() < 1e-10);
        assert!(collision(keccak_stream(), 16, 60_000).unwrap() > FLOOR);
        assert!(collision_on_stream(&keccak_hash, 20, 500_000).unwrap() > FLOOR);
    }

    #[test]
    fn test_gap() {
        assert!(gap(keccak_stream(), 0, 10).is_err());
        assert!(gap(&BitString::from_bits(vec![1; 2000]), 20, 100).unwrap().is_nan());
        assert!(gap(&zeros(20_000), 20, 1000).unwrap() < 1e-10);
        assert!(gap(keccak_stream(), 20, 50_000).unwrap() > FLOOR);
    }

    #[test]
    fn test_autocorrelation() {
        assert!(autocorrelation(keccak_stream(), 0).is_err());
        assert!(autocorrelation(&zeros(5), 10).unwrap().is_nan());
        let alternating = BitString::repeating(&[0, 1], 10_000);
        assert!(autocorrelation(&alternating, 1).unwrap() < 1e-10);
        assert!(autocorrelation(&alternating, 2).unwrap() < 1e-10);
        assert!(autocorrelation(keccak_stream(), 1).unwrap() > FLOOR);
        assert!(autocorrelation(keccak_stream(), 7).unwrap() > FLOOR);
    }

    #[test]
    fn test_spectral() {
        assert!(spectral(&zeros(63)).is_nan());
        assert!(spectral(&BitString::repeating(&[0, 1], 65_536)) < 1e-10);
        assert!(spectral(keccak_stream()) > FLOOR);
    }

    #[test]
    fn test_hamming_weight() {
        assert!(hamming_weight(keccak_stream(), 0).is_err());
        assert!(hamming_weight(keccak_stream(), 65).is_err());
        assert!(hamming_weight(&BitString::default(), 32).unwrap().is_nan());
        assert!(hamming_weight(&zeros(32_000), 32).unwrap() < 1e-10);
        assert!(hamming_weight(keccak_stream(), 32).unwrap() > FLOOR);
    }

    #[test]
    fn test_serial() {
        let bits = keccak_stream();
        assert!(serial(bits, SerialParams { t: 0, k: 2, n: 10 }).is_err());
        assert!(serial(bits, SerialParams { t: 2, k: 1, n: 10 }).is_err());
        assert!(serial(bits, SerialParams { t: 5, k: 5, n: 10 }).is_err());
        assert!(serial(bits, SerialParams::default()).unwrap().is_nan());
        assert!(serial(&zeros(2004), SerialParams { t: 2, k: 2, n: 1000 }).unwrap() < 1e-10);
        assert!(serial(bits, SerialParams { t: 2, k: 2, n: 400_000 }).unwrap() > FLOOR);
    }

    #[test]
    fn test_multinomial() {
        let bits = keccak_stream();
        assert!(multinomial(bits, MultinomialParams { t: 2, k: 3, n: 999 }).is_err());
        assert!(multinomial(bits, MultinomialParams { t: 13, k: 2, n: 1000 }).is_err());
        assert!(multinomial(bits, MultinomialParams { t: 5, k: 5, n: 1000 }).is_err());
        assert!(multinomial(&zeros(1000), MultinomialParams::default()).unwrap().is_nan());
        assert!(multinomial(&zeros(24_000), MultinomialParams { t: 8, k: 3, n: 1000 })
            .unwrap()
            .is_nan());
        assert!(multinomial(&zeros(6000), MultinomialParams { t: 2, k: 3, n: 1000 }).unwrap() < 1e-10);
        assert!(multinomial(bits, MultinomialParams { t: 2, k: 3, n: 100_000 }).unwrap() > 1e-6);
    }

    #[test]
    fn test_close_pairs() {
        let bits = keccak_stream();
        let params = ClosePairsParams { t: 20, n: 40_000, buckets: 256 };
        assert!(close_pairs(bits, ClosePairsParams { t: 0, ..params }).is_err());
        assert!(close_pairs(bits, ClosePairsParams { t: 33, ..params }).is_err());
        assert!(close_pairs(bits, ClosePairsParams { buckets: 1, ..params }).is_err());
        assert!(close_pairs(bits, ClosePairsParams { n: 0, ..params }).is_err());
        assert!(close_pairs(bits, ClosePairsParams::default()).unwrap().is_nan());
        assert!(close_pairs(&zeros(800_000), params).unwrap() < 1e-10);
        assert!(close_pairs(bits, params).unwrap() > FLOOR);
    }

    #[test]
    fn test_coupon_collector() {
        let bits = keccak_stream();
        assert!(coupon_collector(bits, CouponParams { t: 0, segments: 10 }).is_err());
        assert!(coupon_collector(bits, CouponParams { t: 17, segments: 10 }).is_err());
        assert!(coupon_collector(bits, CouponParams { t: 5, segments: 0 }).is_err());
        assert!(coupon_collector(&BitString::default(), CouponParams::default())
            .unwrap()
            .is_nan());
        assert_eq!(
            coupon_collector(&zeros(1000), CouponParams { t: 5, segments: 10 }).unwrap(),
            0.0
        );
        assert!(coupon_collector(bits, CouponParams { t: 5, segments: 200 }).unwrap() > FLOOR);
    }

    #[test]
    fn test_coupon_collector_on_stream() {
        let p = coupon_collector_on_stream(&keccak_hash, CouponParams { t: 4, segments: 300 }).unwrap();
        assert!(p > FLOOR && p <= 1.0);
    }

    #[test]
    fn test_battery_reports_every_test() {
        let results = battery(&keccak_hash);
        assert_eq!(results.len(), 9);
        assert!(results.iter().all(|r| r.family == Family::TestU01));
        assert!(results.iter().all(|r| !r.is_inapplicable()));
    }
}
