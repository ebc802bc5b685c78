//! Iterative radix-2 FFT.

use super::NumericError;
use std::f64::consts::PI;
use std::ops::{Add, Mul, Sub};

/// Minimal complex number for the transform.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex {
    /// Real part.
    pub re: f64,
    /// Imaginary part.
    pub im: f64,
}

impl Complex {
    /// Creates a complex number.
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Modulus |z|.
    pub fn norm(self) -> f64 {
        self.re.hypot(self.im)
    }
}

impl Add for Complex {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Complex {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

/// Forward DFT in place, X_k = Σ x_j e^{-2πijk/n}.
///
/// The length must be a non-zero power of two.
pub fn fft(data: &mut [Complex]) -> Result<(), NumericError> {
    let n = data.len();
    if n == 0 || !n.is_power_of_two() {
        return Err(NumericError::NotPowerOfTwo(n));
    }
    if n == 1 {
        return Ok(());
    }

    let shift = usize::BITS - n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> shift;
        if i < j {
            data.swap(i, j);
        }
    }

    // One table for every stage; stage `len` reads it with stride n / len.
    let twiddles: Vec<Complex> = (0..n / 2)
        .map(|k| {
            let angle = -2.0 * PI * k as f64 / n as f64;
            Complex::new(angle.cos(), angle.sin())
        })
        .collect();

    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let stride = n / len;
        for start in (0..n).step_by(len) {
            for k in 0..half {
                let u = data[start + k];
                let v = data[start + k + half] * twiddles[k * stride];
                data[start + k] = u + v;
                data[start + k + half] = u - v;
            }
        }
        len <<= 1;
    }

    Ok(())
}

/// Magnitudes of the DFT of a 0/1 sequence mapped to -1/+1.
pub fn sign_spectrum(bits: &[u8]) -> Result<Vec<f64>, NumericError> {
    let mut data: Vec<Complex> = bits
        .iter()
        .map(|&b| Complex::new(if b != 0 { 1.0 } else { -1.0 }, 0.0))
        .collect();
    fft(&mut data)?;
    Ok(data.into_iter().map(Complex::norm).collect())
}
