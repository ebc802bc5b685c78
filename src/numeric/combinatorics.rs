//! Binomial coefficients and harmonic numbers.

/// C(n, k), exact in f64 for the small n the tests use (n <= 64).
pub fn binomial_coefficient(n: u32, k: u32) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (1..=k).fold(1.0, |acc, i| acc * f64::from(n - k + i) / f64::from(i))
}

/// P(X = k) for X ~ Binomial(n, p).
pub fn binomial_probability(n: u32, k: u32, p: f64) -> f64 {
    if k > n {
        return 0.0;
    }
    binomial_coefficient(n, k) * p.powi(k as i32) * (1.0 - p).powi((n - k) as i32)
}

/// H_n = Σ_{i=1..n} 1/i.
pub fn harmonic(n: u64) -> f64 {
    (1..=n).map(|i| 1.0 / i as f64).sum()
}

/// Σ_{i=1..n} 1/i².
pub fn harmonic_squares(n: u64) -> f64 {
    (1..=n).map(|i| 1.0 / (i as f64 * i as f64)).sum()
}
