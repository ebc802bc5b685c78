//! Reduced-round versus full-round digest comparison.

use crate::numeric::chi_squared_sf;
use crate::primitives::RoundHasher;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Hamming and bit-flip statistics of one reduced-round primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicStatistics {
    /// Random inputs hashed.
    pub tests_count: usize,
    /// Length of each input.
    pub input_size_bytes: usize,
    /// Mean Hamming distance between the reduced and full digests.
    pub mean_hamming: f64,
    /// Population standard deviation of the Hamming distance.
    pub std_hamming: f64,
    /// Per output bit (LSB-first within each byte): inputs where the two digests differ.
    pub bit_flip_counts: Vec<u64>,
    /// Σ (count - n/2)² / (n/2) over output bits.
    pub flip_chi_square: f64,
    /// Upper-tail p-value of `flip_chi_square`, one degree of freedom per output bit.
    pub flip_p_value: f64,
    /// Distinct reduced digests produced by more than one input.
    pub collisions: usize,
}

fn hamming(a: &[u8], b: &[u8]) -> u32 {
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Hashes `tests_count` random inputs with `reduced` and with the
/// full-round variant of the same algorithm, and compares the digests.
///
/// Returns `None` when `tests_count` or `input_size_bytes` is zero.
pub fn compare_with_full<R>(
    reduced: &RoundHasher,
    input_size_bytes: usize,
    tests_count: usize,
    rng: &mut R,
) -> Option<BasicStatistics>
where
    R: RngCore + ?Sized,
{
    if tests_count == 0 || input_size_bytes == 0 {
        return None;
    }

    let full = RoundHasher::full(reduced.algorithm());
    let output_bits = reduced.digest_len() * 8;
    let mut flips = vec![0u64; output_bits];
    let mut seen: HashMap<Vec<u8>, usize> = HashMap::with_capacity(tests_count);
    let mut distances = Vec::with_capacity(tests_count);
    let mut input = vec![0u8; input_size_bytes];

    for _ in 0..tests_count {
        rng.fill_bytes(&mut input);
        let reference = full.hash(&input);
        let digest = reduced.hash(&input);

        distances.push(f64::from(hamming(&reference, &digest)));
        for (i, (a, b)) in reference.iter().zip(&digest).enumerate() {
            let diff = a ^ b;
            for bit in 0..8 {
                flips[i * 8 + bit] += u64::from((diff >> bit) & 1);
            }
        }
        *seen.entry(digest).or_insert(0) += 1;
    }

    let n = distances.len() as f64;
    let mean = distances.iter().sum::<f64>() / n;
    let std = (distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n).sqrt();

    let expected = tests_count as f64 / 2.0;
    let chi = flips
        .iter()
        .map(|&c| (c as f64 - expected).powi(2) / expected)
        .sum::<f64>();
    let collisions = seen.values().filter(|&&c| c > 1).count();

    debug!(
        algorithm = %reduced.algorithm(),
        rounds = reduced.rounds(),
        mean_hamming = mean,
        collisions,
        "Basic statistics computed"
    );

    Some(BasicStatistics {
        tests_count,
        input_size_bytes,
        mean_hamming: mean,
        std_hamming: std,
        bit_flip_counts: flips,
        flip_chi_square: chi,
        flip_p_value: chi_squared_sf(chi, output_bits as f64),
        collisions,
    })
}
