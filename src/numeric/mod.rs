//! Numeric kernel shared by the statistical tests and analyzers.
//!
//! Special functions, distribution tails, GF(2) rank and a radix-2 FFT.
//! Functions return NaN on invalid domains instead of failing; callers
//! are expected to check and map NaN onto their own sentinel.

mod combinatorics;
mod fft;
mod gamma;
mod gf2;
mod normal;

pub use combinatorics::{binomial_coefficient, binomial_probability, harmonic, harmonic_squares};
pub use fft::{fft, sign_spectrum, Complex};
pub use gamma::{
    chi_squared_cdf, chi_squared_sf, gamma, gamma_lower_incomplete, igam, igamc, ln_gamma,
    poisson_cdf, poisson_sf,
};
pub use gf2::Gf2Matrix;
pub use normal::{erfc, normal_cdf, two_sided_p};

/// Errors for the few kernel operations with structural preconditions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumericError {
    /// FFT input length is zero or not a power of two.
    #[error("FFT length {0} is not a non-zero power of two")]
    NotPowerOfTwo(usize),

    /// GF(2) rows are stored in a `u64`.
    #[error("GF(2) matrix with {0} columns exceeds the 64-column limit")]
    TooManyColumns(usize),

    /// Entry slice does not match rows × cols.
    #[error("expected {expected} matrix entries, got {got}")]
    DimensionMismatch {
        /// rows × cols
        expected: usize,
        /// Entries supplied.
        got: usize,
    },
}
