//! Differential analyzers: Strict Avalanche Criterion and Bit Independence Criterion.
//!
//! Both drive a hash closure directly: draw a random base input, flip one
//! input bit, and compare the two digests. Input bits are flipped
//! LSB-first within each byte, and output bits are indexed the same way
//! (`byte * 8 + bit`, bit 0 least significant).

mod avalanche;
mod bic;

pub use avalanche::{compute_sac, AvalancheMode, AvalancheResult, FlipCountVector, SacParams};
pub use bic::{compute_bic, BicParams, BicResult, CorrelationMatrix};

use crate::primitives::{Algorithm, PrimitiveError, RoundHasher};
use rand_core::RngCore;

/// Errors from the differential analyzers.
#[derive(Debug, thiserror::Error)]
pub enum DifferentialError {
    /// An analyzer parameter outside its domain.
    #[error("{analyzer}: {reason}")]
    InvalidParameter {
        /// Analyzer that rejected the parameter.
        analyzer: &'static str,
        /// What was wrong.
        reason: String,
    },

    /// The primitive could not be built for the requested rounds.
    #[error(transparent)]
    Primitive(#[from] PrimitiveError),
}

impl DifferentialError {
    fn invalid(analyzer: &'static str, reason: impl Into<String>) -> Self {
        DifferentialError::InvalidParameter {
            analyzer,
            reason: reason.into(),
        }
    }
}

/// Sets bit `index` (LSB-first within each byte) of `bytes` flipped.
pub(crate) fn flip_bit(bytes: &mut [u8], index: usize) {
    bytes[index / 8] ^= 1 << (index % 8);
}

/// [`compute_sac`] on `algorithm` reduced to `rounds`.
pub fn sac_for_rounds<R>(
    algorithm: Algorithm,
    rounds: u32,
    params: &SacParams,
    rng: &mut R,
) -> Result<AvalancheResult, DifferentialError>
where
    R: RngCore + ?Sized,
{
    let hasher = RoundHasher::new(algorithm, rounds)?;
    compute_sac(&|x: &[u8]| hasher.hash(x), params, rng)
}

/// [`compute_bic`] on `algorithm` reduced to `rounds`.
pub fn bic_for_rounds<R>(
    algorithm: Algorithm,
    rounds: u32,
    params: &BicParams,
    rng: &mut R,
) -> Result<BicResult, DifferentialError>
where
    R: RngCore + ?Sized,
{
    let hasher = RoundHasher::new(algorithm, rounds)?;
    compute_bic(&|x: &[u8]| hasher.hash(x), params, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeding::TrialRng;

    #[test]
    fn test_flip_bit_is_lsb_first() {
        let mut bytes = [0u8; 2];
        flip_bit(&mut bytes, 0);
        flip_bit(&mut bytes, 15);
        assert_eq!(bytes, [0x01, 0x80]);
    }

    #[test]
    fn test_invalid_rounds_propagate() {
        let mut rng = TrialRng::from_u64(1);
        let err = sac_for_rounds(Algorithm::Blake2s, 13, &SacParams::default(), &mut rng)
            .unwrap_err();
        assert!(matches!(
            err,
            DifferentialError::Primitive(PrimitiveError::InvalidRounds { .. })
        ));
    }

    #[test]
    fn test_bic_for_rounds() {
        let mut rng = TrialRng::from_u64(1);
        let params = BicParams {
            input_bits: 8,
            experiments_per_bit: 32,
        };
        let result = bic_for_rounds(Algorithm::Blake3, 7, &params, &mut rng).unwrap();
        assert_eq!(result.output_bits, 256);
    }
}
