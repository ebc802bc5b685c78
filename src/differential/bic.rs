//! Bit Independence Criterion.

use super::{flip_bit, DifferentialError};
use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// BIC parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BicParams {
    /// Input length in bits; every one of them is flipped in turn.
    pub input_bits: usize,
    /// Random base inputs per flipped bit.
    pub experiments_per_bit: usize,
}

impl Default for BicParams {
    fn default() -> Self {
        Self {
            input_bits: 128,
            experiments_per_bit: 200,
        }
    }
}

/// Symmetric matrix of Pearson correlations between output-bit flip indicators.
#[derive(Clone, PartialEq)]
pub struct CorrelationMatrix {
    size: usize,
    values: Vec<f64>,
}

impl CorrelationMatrix {
    fn zeros(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size],
        }
    }

    /// Number of output bits.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Correlation between output bits `i` and `j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    fn add_symmetric(&mut self, i: usize, j: usize, r: f64) {
        self.values[i * self.size + j] += r;
        if i != j {
            self.values[j * self.size + i] += r;
        }
    }

    fn scale(&mut self, factor: f64) {
        self.values.iter_mut().for_each(|v| *v *= factor);
    }

    /// Entries with i != j.
    pub fn off_diagonal(&self) -> impl Iterator<Item = f64> + '_ {
        let size = self.size;
        self.values
            .iter()
            .enumerate()
            .filter(move |(k, _)| k / size != k % size)
            .map(|(_, &v)| v)
    }
}

impl fmt::Debug for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorrelationMatrix")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// BIC summary; all statistics exclude the diagonal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BicResult {
    /// Mean off-diagonal correlation.
    pub mean_correlation: f64,
    /// Population standard deviation of the off-diagonal correlations.
    pub std_correlation: f64,
    /// Largest |correlation|.
    pub max_correlation_abs: f64,
    /// Smallest (signed) correlation.
    pub min_correlation: f64,
    /// Input bits whose flip never changed any output bit.
    pub inert_input_bits: Vec<usize>,
    /// Digest width in bits.
    pub output_bits: usize,
    /// Parameter summary.
    pub notes: String,
    /// Mean correlation matrix over all input bits.
    #[serde(skip)]
    pub matrix: Option<CorrelationMatrix>,
}

/// Flip indicators of every output bit across the experiments for one input bit,
/// one bitset column per output bit.
struct FlipColumns {
    words: usize,
    columns: Vec<u64>,
}

impl FlipColumns {
    fn new(output_bits: usize, experiments: usize) -> Self {
        let words = experiments.div_ceil(64);
        Self {
            words,
            columns: vec![0; output_bits * words],
        }
    }

    fn set(&mut self, output_bit: usize, experiment: usize) {
        self.columns[output_bit * self.words + experiment / 64] |= 1 << (experiment % 64);
    }

    fn column(&self, output_bit: usize) -> &[u64] {
        &self.columns[output_bit * self.words..(output_bit + 1) * self.words]
    }

    fn ones(&self, output_bit: usize) -> u32 {
        self.column(output_bit).iter().map(|w| w.count_ones()).sum()
    }

    fn both(&self, i: usize, j: usize) -> u32 {
        self.column(i)
            .iter()
            .zip(self.column(j))
            .map(|(a, b)| (a & b).count_ones())
            .sum()
    }
}

/// Pearson correlation of two 0/1 indicators from their counts; 0 if either is constant.
fn indicator_correlation(n11: u32, n1: u32, n2: u32, n: usize) -> f64 {
    let n = n as f64;
    let p1 = f64::from(n1) / n;
    let p2 = f64::from(n2) / n;
    let var = p1 * (1.0 - p1) * p2 * (1.0 - p2);
    if var <= 0.0 {
        return 0.0;
    }
    (f64::from(n11) / n - p1 * p2) / var.sqrt()
}

/// Averages the output-bit correlation matrix over single flips of every input bit.
///
/// Input bits that never change the digest are logged and listed but do
/// not abort the analysis.
pub fn compute_bic<H, R>(
    hash: &H,
    params: &BicParams,
    rng: &mut R,
) -> Result<BicResult, DifferentialError>
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
    R: RngCore + ?Sized,
{
    const NAME: &str = "BitIndependence";

    if params.input_bits == 0 {
        return Err(DifferentialError::invalid(NAME, "input bits must be positive"));
    }
    if params.experiments_per_bit < 2 {
        return Err(DifferentialError::invalid(
            NAME,
            "at least two experiments per bit are needed",
        ));
    }

    let input_len = params.input_bits.div_ceil(8);
    let output_bits = hash(&vec![0u8; input_len]).len() * 8;
    if output_bits == 0 {
        return Err(DifferentialError::invalid(NAME, "hash returned an empty digest"));
    }

    let experiments = params.experiments_per_bit;
    let mut matrix = CorrelationMatrix::zeros(output_bits);
    let mut inert = Vec::new();
    let mut input = vec![0u8; input_len];

    for input_bit in 0..params.input_bits {
        let mut columns = FlipColumns::new(output_bits, experiments);
        let mut changed = 0usize;

        for experiment in 0..experiments {
            rng.fill_bytes(&mut input);
            let base = hash(&input);
            flip_bit(&mut input, input_bit);
            let flipped = hash(&input);

            let mut any = false;
            for (byte, (a, b)) in base.iter().zip(&flipped).enumerate() {
                let diff = a ^ b;
                for bit in 0..8 {
                    if (diff >> bit) & 1 == 1 {
                        columns.set(byte * 8 + bit, experiment);
                        any = true;
                    }
                }
            }
            changed += usize::from(any);
        }

        if changed == 0 {
            warn!(input_bit, "BIC input bit never changes any output bit");
            inert.push(input_bit);
        }

        let ones: Vec<u32> = (0..output_bits).map(|i| columns.ones(i)).collect();
        for i in 0..output_bits {
            for j in i..output_bits {
                let r = indicator_correlation(columns.both(i, j), ones[i], ones[j], experiments);
                matrix.add_symmetric(i, j, r);
            }
        }
    }
    matrix.scale(1.0 / params.input_bits as f64);

    let count = (output_bits * output_bits - output_bits).max(1) as f64;
    let (sum, sum_sq, max_abs, min) = matrix.off_diagonal().fold(
        (0.0, 0.0, 0.0f64, f64::INFINITY),
        |(sum, sum_sq, max_abs, min), v| (sum + v, sum_sq + v * v, max_abs.max(v.abs()), min.min(v)),
    );
    let mean = sum / count;
    let std = (sum_sq / count - mean * mean).max(0.0).sqrt();
    let min = if min.is_finite() { min } else { 0.0 };

    debug!(
        input_bits = params.input_bits,
        output_bits,
        mean_correlation = mean,
        max_correlation_abs = max_abs,
        "BIC computed"
    );

    Ok(BicResult {
        mean_correlation: mean,
        std_correlation: std,
        max_correlation_abs: max_abs,
        min_correlation: min,
        inert_input_bits: inert,
        output_bits,
        notes: format!(
            "BIC: experimentsPerBit={}, inputBits={}, outputBits={}. LSB-first bit ordering used.",
            experiments, params.input_bits, output_bits
        ),
        matrix: Some(matrix),
    })
}
