//! Run orchestration.
//!
//! A run binds one algorithm to one reduced round count, expands the
//! reduced hash into a bit stream, and hands the stream and the hash to
//! every enabled analysis. The analyses share nothing mutable, so each
//! one gets its own scoped thread and its own child [`TrialRng`].
//!
//! ```text
//! RoundHasher ──► generate ──► NIST / Diehard
//!      │                          TestU01 (own streams)
//!      └──────────────────────► Avalanche / BIC / basic statistics
//! ```
//!
//! Only a primitive that cannot be built stops a run early; the report
//! then carries the error and nothing else.

mod basic;
mod config;
mod report;

pub use basic::{compare_with_full, BasicStatistics};
pub use config::{AnalysisConfig, ConfigError, FamilyToggles, StreamConfig};
pub use report::{sanitize, FamilyReport, RunReport};

use crate::analysis::{diehard, nist, testu01};
use crate::differential::{compute_bic, compute_sac};
use crate::primitives::{Algorithm, RoundHasher};
use crate::seeding::TrialRng;
use crate::stream::generate;
use serde::{Deserialize, Serialize};
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

/// What to analyse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParameters {
    /// Primitive under test.
    pub algorithm: Algorithm,
    /// Reduced round count.
    pub rounds: u32,
    /// Input length for the basic statistics.
    pub input_size_bytes: usize,
    /// Random inputs for the basic statistics.
    pub tests_count: usize,
    /// Overrides the configured seed when set.
    pub seed: Option<u64>,
}

impl RunParameters {
    /// Parameters with the default input size (16 bytes) and test count (1000).
    pub fn new(algorithm: Algorithm, rounds: u32) -> Self {
        Self {
            algorithm,
            rounds,
            input_size_bytes: 16,
            tests_count: 1000,
            seed: None,
        }
    }
}

/// Joins an analysis thread, turning a panic into a warning.
fn join<T>(label: &str, handle: Option<ScopedJoinHandle<'_, T>>, warnings: &mut Vec<String>) -> Option<T> {
    match handle?.join() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(analysis = label, "Analysis thread panicked");
            warnings.push(format!("{label}: analysis thread panicked"));
            None
        }
    }
}

/// Runs every enabled analysis on `params.algorithm` at `params.rounds`.
///
/// The report keeps raw values, sentinels included; hand it on through
/// [`RunReport::sanitized`] or [`RunReport::to_toml`].
pub fn run(params: &RunParameters, config: &AnalysisConfig) -> RunReport {
    let started = Instant::now();
    let mut report = RunReport::new(
        params.algorithm,
        params.rounds,
        params.input_size_bytes,
        params.tests_count,
    );
    report.alpha = config.thresholds.alpha;
    report.seed = params.seed.or(config.seed);

    info!(
        algorithm = %params.algorithm,
        rounds = params.rounds,
        seed = ?report.seed,
        "Starting run"
    );

    let hasher = match RoundHasher::new(params.algorithm, params.rounds) {
        Ok(hasher) => hasher,
        Err(e) => {
            warn!(error = %e, "Hashing failed; recording partial run");
            report.hashing_error = Some(e.to_string());
            report.elapsed_ms = started.elapsed().as_millis() as u64;
            return report;
        }
    };
    let hash = move |input: &[u8]| hasher.hash(input);

    let root = TrialRng::new(report.seed);
    let mut basic_rng = root.child("basic");
    let mut nist_rng = root.child("nist");
    let mut sac_rng = root.child("avalanche");
    let mut bic_rng = root.child("bic");

    let families = config.families;
    let bits = if families.nist || families.diehard {
        let bits = generate(&hash, config.stream.bits);
        debug!(bits = bits.len(), "Generated bit stream");
        Some(bits)
    } else {
        None
    };

    let hash = &hash;
    let bits = bits.as_ref();
    let thresholds = &config.thresholds;
    let mut warnings = Vec::new();

    thread::scope(|scope| {
        let nist = bits
            .filter(|_| families.nist)
            .map(|bits| scope.spawn(move || nist::battery(bits, hash, &mut nist_rng)));
        let diehard = bits
            .filter(|_| families.diehard)
            .map(|bits| scope.spawn(move || diehard::battery(bits, hash)));
        let testu01 = families
            .testu01
            .then(|| scope.spawn(move || testu01::battery(hash)));
        let avalanche = families
            .avalanche
            .then(|| scope.spawn(move || compute_sac(hash, &config.avalanche, &mut sac_rng)));
        let bic = families
            .bic
            .then(|| scope.spawn(move || compute_bic(hash, &config.bic, &mut bic_rng)));

        report.basic = compare_with_full(
            &hasher,
            params.input_size_bytes,
            params.tests_count,
            &mut basic_rng,
        );

        report.nist = join("NIST", nist, &mut warnings).map(|r| FamilyReport::new(r, thresholds));
        report.diehard =
            join("Diehard", diehard, &mut warnings).map(|r| FamilyReport::new(r, thresholds));
        report.testu01 =
            join("TestU01", testu01, &mut warnings).map(|r| FamilyReport::new(r, thresholds));

        report.avalanche = match join("Avalanche", avalanche, &mut warnings) {
            Some(Ok(result)) => Some(result),
            Some(Err(e)) => {
                warn!(error = %e, "Avalanche analysis failed");
                warnings.push(e.to_string());
                None
            }
            None => None,
        };
        report.bic = match join("BIC", bic, &mut warnings) {
            Some(Ok(result)) => {
                if !result.inert_input_bits.is_empty() {
                    warnings.push(format!(
                        "BIC: {} input bits never change the digest",
                        result.inert_input_bits.len()
                    ));
                }
                Some(result)
            }
            Some(Err(e)) => {
                warn!(error = %e, "BIC analysis failed");
                warnings.push(e.to_string());
                None
            }
            None => None,
        };
    });

    report.warnings = warnings;
    report.elapsed_ms = started.elapsed().as_millis() as u64;

    let overall = report.overall_summary();
    info!(
        algorithm = %params.algorithm,
        rounds = params.rounds,
        passed = overall.passed,
        failed = overall.failed,
        inapplicable = overall.inapplicable,
        elapsed_ms = report.elapsed_ms,
        "Run complete"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differential::{BicParams, SacParams};

    fn differential_only() -> AnalysisConfig {
        AnalysisConfig {
            avalanche: SacParams {
                trials: 200,
                ..SacParams::default()
            },
            bic: BicParams {
                input_bits: 8,
                experiments_per_bit: 64,
            },
            families: FamilyToggles {
                avalanche: true,
                bic: true,
                ..FamilyToggles::none()
            },
            ..AnalysisConfig::default()
        }
    }

    fn params(algorithm: Algorithm, rounds: u32) -> RunParameters {
        RunParameters {
            tests_count: 200,
            seed: Some(7),
            ..RunParameters::new(algorithm, rounds)
        }
    }

    #[test]
    fn test_invalid_rounds_give_partial_report() {
        let report = run(&params(Algorithm::Blake2s, 40), &differential_only());
        assert!(report.is_partial());
        assert!(report.basic.is_none());
        assert!(report.avalanche.is_none());
        assert!(report.hashing_error.unwrap().contains("Blake2s"));
    }

    #[test]
    fn test_disabled_families_are_absent() {
        let report = run(&params(Algorithm::Keccak, 24), &differential_only());
        assert!(!report.is_partial());
        assert!(report.nist.is_none());
        assert!(report.diehard.is_none());
        assert!(report.testu01.is_none());
        assert!(report.avalanche.is_some());
        assert!(report.bic.is_some());
        assert_eq!(report.basic.as_ref().unwrap().tests_count, 200);
        assert_eq!(report.overall_summary().total(), 0);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let config = differential_only();
        let a = run(&params(Algorithm::Blake3, 3), &config);
        let b = run(&params(Algorithm::Blake3, 3), &config);
        assert_eq!(a.avalanche, b.avalanche);
        assert_eq!(a.bic, b.bic);
        assert_eq!(a.basic, b.basic);
    }

    #[test]
    fn test_reduced_rounds_show_in_avalanche() {
        let config = differential_only();
        let weak = run(&params(Algorithm::Keccak, 1), &config);
        let strong = run(&params(Algorithm::Keccak, 24), &config);
        let weak_dev = weak.avalanche.unwrap().max_deviation_from_half;
        let strong_dev = strong.avalanche.unwrap().max_deviation_from_half;
        assert!(weak_dev > strong_dev);
    }

    #[test]
    fn test_bit_string_batteries() {
        let config = AnalysisConfig {
            families: FamilyToggles {
                nist: true,
                diehard: true,
                ..FamilyToggles::none()
            },
            ..AnalysisConfig::default()
        };
        let report = run(&params(Algorithm::Keccak, 24), &config);

        let nist = report.nist.as_ref().unwrap();
        let diehard = report.diehard.as_ref().unwrap();
        assert_eq!(nist.results.len(), 16);
        assert_eq!(nist.summary.total(), 16);
        assert_eq!(diehard.results.len(), 8);
        assert!(report.test_results().all(|r| r.p_value.is_nan() || r.p_value <= 1.0));
        assert!(report.warnings.is_empty());
    }
}
