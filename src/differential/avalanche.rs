//! Strict Avalanche Criterion.

use super::{flip_bit, DifferentialError};
use crate::numeric::two_sided_p;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// How input bits are chosen for flipping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvalancheMode {
    /// One random input bit per trial.
    #[default]
    Sampled,
    /// Every input bit once per trial.
    Exhaustive,
}

impl fmt::Display for AvalancheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AvalancheMode::Sampled => "sampled",
            AvalancheMode::Exhaustive => "exhaustive",
        })
    }
}

/// SAC parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SacParams {
    /// Length of the random base inputs.
    pub input_size_bytes: usize,
    /// Number of base inputs.
    pub trials: usize,
    /// Flip selection.
    pub mode: AvalancheMode,
}

impl Default for SacParams {
    fn default() -> Self {
        Self {
            input_size_bytes: 16,
            trials: 1000,
            mode: AvalancheMode::Sampled,
        }
    }
}

/// Per-output-bit flip counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlipCountVector {
    counts: Vec<u64>,
    experiments: u64,
}

impl FlipCountVector {
    /// Zeroed counters for `output_bits` bits.
    pub fn new(output_bits: usize) -> Self {
        Self {
            counts: vec![0; output_bits],
            experiments: 0,
        }
    }

    /// Counts the bits that differ between two digests as one experiment.
    pub fn accumulate(&mut self, base: &[u8], flipped: &[u8]) {
        for (i, (a, b)) in base.iter().zip(flipped).enumerate() {
            let diff = a ^ b;
            for bit in 0..8 {
                if let Some(count) = self.counts.get_mut(i * 8 + bit) {
                    *count += u64::from((diff >> bit) & 1);
                }
            }
        }
        self.experiments += 1;
    }

    /// Raw flip counts.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Experiments accumulated.
    pub fn experiments(&self) -> u64 {
        self.experiments
    }

    /// Flip rate per output bit (count / experiments).
    pub fn rates(&self) -> Vec<f64> {
        let n = self.experiments.max(1) as f64;
        self.counts.iter().map(|&c| c as f64 / n).collect()
    }
}

/// SAC summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvalancheResult {
    /// Mean flip rate over output bits; 0.5 is ideal.
    pub mean_flip_rate: f64,
    /// Population standard deviation of the flip rates.
    pub std_dev_flip_rate: f64,
    /// max |rate - 0.5|.
    pub max_deviation_from_half: f64,
    /// Smallest per-bit p-value.
    pub min_p_value: f64,
    /// Largest per-bit p-value.
    pub max_p_value: f64,
    /// Single-bit flips performed.
    pub experiments: u64,
    /// Digest width in bits.
    pub output_bits: usize,
    /// Parameter summary.
    pub notes: String,
}

/// Measures how often each output bit flips when one input bit flips.
///
/// Per-bit p-values use the normal approximation with σ = √(0.25 / experiments).
pub fn compute_sac<H, R>(
    hash: &H,
    params: &SacParams,
    rng: &mut R,
) -> Result<AvalancheResult, DifferentialError>
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
    R: RngCore + ?Sized,
{
    const NAME: &str = "Avalanche";

    if params.input_size_bytes == 0 {
        return Err(DifferentialError::invalid(NAME, "input size must be positive"));
    }
    if params.trials == 0 {
        return Err(DifferentialError::invalid(NAME, "trials must be positive"));
    }

    let input_bits = params.input_size_bytes * 8;
    let mut input = vec![0u8; params.input_size_bytes];
    rng.fill_bytes(&mut input);
    let output_bits = hash(&input).len() * 8;
    if output_bits == 0 {
        return Err(DifferentialError::invalid(NAME, "hash returned an empty digest"));
    }

    let mut flips = FlipCountVector::new(output_bits);
    for _ in 0..params.trials {
        rng.fill_bytes(&mut input);
        let base = hash(&input);

        match params.mode {
            AvalancheMode::Sampled => {
                let bit = (rng.next_u64() % input_bits as u64) as usize;
                let mut modified = input.clone();
                flip_bit(&mut modified, bit);
                flips.accumulate(&base, &hash(&modified));
            }
            AvalancheMode::Exhaustive => {
                let mut modified = input.clone();
                for bit in 0..input_bits {
                    flip_bit(&mut modified, bit);
                    flips.accumulate(&base, &hash(&modified));
                    flip_bit(&mut modified, bit);
                }
            }
        }
    }

    let rates = flips.rates();
    let n = rates.len() as f64;
    let mean = rates.iter().sum::<f64>() / n;
    let std = (rates.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n).sqrt();
    let max_dev = rates.iter().map(|r| (r - 0.5).abs()).fold(0.0, f64::max);

    let sigma = (0.25 / flips.experiments() as f64).sqrt();
    let (min_p, max_p) = rates
        .iter()
        .map(|r| two_sided_p((r - 0.5) / sigma))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p), hi.max(p))
        });

    debug!(
        experiments = flips.experiments(),
        output_bits,
        mean_flip_rate = mean,
        "SAC computed"
    );

    Ok(AvalancheResult {
        mean_flip_rate: mean,
        std_dev_flip_rate: std,
        max_deviation_from_half: max_dev,
        min_p_value: min_p,
        max_p_value: max_p,
        experiments: flips.experiments(),
        output_bits,
        notes: format!(
            "SAC computed: trials={}, outputBits={}, mode={}",
            params.trials, output_bits, params.mode
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{Algorithm, RoundHasher};
    use crate::seeding::TrialRng;

    fn sac(rounds: u32, params: &SacParams, seed: u64) -> AvalancheResult {
        let hasher = RoundHasher::new(Algorithm::Keccak, rounds).unwrap();
        let mut rng = TrialRng::from_u64(seed);
        compute_sac(&|x: &[u8]| hasher.hash(x), params, &mut rng).unwrap()
    }

    #[test]
    fn test_flip_count_vector() {
        let mut flips = FlipCountVector::new(16);
        flips.accumulate(&[0x01, 0x00], &[0x00, 0x80]);
        flips.accumulate(&[0x00, 0x00], &[0x00, 0x00]);
        assert_eq!(flips.counts()[0], 1);
        assert_eq!(flips.counts()[15], 1);
        assert_eq!(flips.experiments(), 2);
        assert_eq!(flips.rates()[0], 0.5);
    }

    #[test]
    fn test_full_rounds_near_half() {
        let result = sac(24, &SacParams::default(), 11);
        assert_eq!(result.output_bits, 256);
        assert_eq!(result.experiments, 1000);
        assert!((result.mean_flip_rate - 0.5).abs() < 0.01);
        assert!(result.max_p_value <= 1.0 && result.min_p_value >= 0.0);
    }

    #[test]
    fn test_one_round_deviates() {
        let result = sac(1, &SacParams::default(), 11);
        assert!(result.mean_flip_rate < 0.4);
        assert!(result.max_deviation_from_half > 0.1);
    }

    #[test]
    fn test_exhaustive_counts_every_bit() {
        let params = SacParams {
            input_size_bytes: 4,
            trials: 10,
            mode: AvalancheMode::Exhaustive,
        };
        assert_eq!(sac(24, &params, 5).experiments, 320);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let params = SacParams {
            trials: 50,
            ..SacParams::default()
        };
        assert_eq!(sac(3, &params, 9), sac(3, &params, 9));
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let mut rng = TrialRng::from_u64(1);
        let hash = |x: &[u8]| x.to_vec();
        let zero_trials = SacParams {
            trials: 0,
            ..SacParams::default()
        };
        assert!(compute_sac(&hash, &zero_trials, &mut rng).is_err());

        let empty = |_: &[u8]| Vec::<u8>::new();
        assert!(compute_sac(&empty, &SacParams::default(), &mut rng).is_err());
    }
}
