//! Statistical randomness tests.
//!
//! Three batteries of pure functions turning a [`BitString`] into a
//! p-value under the randomness null hypothesis:
//!
//! - [`nist`]: SP 800-22 style frequency, run, template, spectral,
//!   compression and random-walk tests
//! - [`diehard`]: Marsaglia style birthday, rank, permutation and game tests
//! - [`testu01`]: TestU01 style collision, gap, serial and occupancy tests
//!
//! A test that cannot apply to its input (too short, degenerate) returns
//! its own sentinel, NaN or -1.0, and never an error. Errors are reserved
//! for parameters outside a test's domain. Tests that need more data than
//! they were given take a hash closure and expand it with
//! [`crate::stream::generate`].
//!
//! [`BitString`]: crate::stream::BitString

pub mod diehard;
pub mod nist;
mod outcome;
pub mod testu01;
mod threshold;

pub use outcome::{Family, FamilySummary, TestResult, Verdict};
pub use threshold::{SignificanceThresholds, ThresholdViolation};

/// Errors for test parameters outside their supported domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// A parameter the test cannot work with.
    #[error("{test}: {reason}")]
    InvalidParameter {
        /// Test that rejected the parameter.
        test: &'static str,
        /// What was wrong.
        reason: String,
    },
}

impl AnalysisError {
    pub(crate) fn invalid(test: &'static str, reason: impl Into<String>) -> Self {
        AnalysisError::InvalidParameter {
            test,
            reason: reason.into(),
        }
    }
}

/// Turns a parameterized test outcome into a result; errors become NaN with a note.
pub(crate) fn result_from(
    family: Family,
    name: &'static str,
    outcome: Result<f64, AnalysisError>,
) -> TestResult {
    match outcome {
        Ok(p) => TestResult::new(family, name, p),
        Err(e) => {
            tracing::warn!(test = name, error = %e, "Test rejected its parameters");
            TestResult::new(family, name, f64::NAN).with_note(e.to_string())
        }
    }
}

/// Largest power of two not above `n` (0 for 0).
pub(crate) fn floor_power_of_two(n: usize) -> usize {
    if n == 0 {
        0
    } else {
        1 << (usize::BITS - 1 - n.leading_zeros())
    }
}

/// Pearson statistic Σ (observed - expected)² / expected over paired cells.
///
/// Cells with a non-positive expectation are skipped.
pub(crate) fn chi_square<I>(cells: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    cells
        .into_iter()
        .filter(|&(_, expected)| expected > 0.0)
        .map(|(observed, expected)| (observed - expected).powi(2) / expected)
        .sum()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::primitives::{Algorithm, RoundHasher};
    use crate::stream::{generate, BitString};
    use std::sync::OnceLock;

    /// Full-round Keccak expanded to one million bits, shared by the test modules.
    pub fn keccak_stream() -> &'static BitString {
        static STREAM: OnceLock<BitString> = OnceLock::new();
        STREAM.get_or_init(|| {
            let hasher = RoundHasher::full(Algorithm::Keccak);
            generate(&|x: &[u8]| hasher.hash(x), 1_000_000)
        })
    }

    pub fn keccak_hash(input: &[u8]) -> Vec<u8> {
        RoundHasher::full(Algorithm::Keccak).hash(input)
    }

    /// One-round Keccak, badly non-random.
    pub fn weak_hash(input: &[u8]) -> Vec<u8> {
        RoundHasher::new(Algorithm::Keccak, 1)
            .map(|h| h.hash(input))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_power_of_two() {
        assert_eq!(floor_power_of_two(0), 0);
        assert_eq!(floor_power_of_two(1), 1);
        assert_eq!(floor_power_of_two(1_000_000), 524_288);
        assert_eq!(floor_power_of_two(1 << 20), 1 << 20);
    }

    #[test]
    fn test_chi_square_skips_empty_cells() {
        let chi2 = chi_square([(3.0, 2.0), (1.0, 2.0), (5.0, 0.0)]);
        assert!((chi2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_result_from_error_is_nan_with_note() {
        let result = result_from(
            Family::Nist,
            "Serial",
            Err(AnalysisError::invalid("Serial", "m must be positive")),
        );
        assert!(result.p_value.is_nan());
        assert_eq!(result.note.as_deref(), Some("Serial: m must be positive"));
    }
}
