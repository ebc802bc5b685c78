//! Run output record.

use super::basic::BasicStatistics;
use crate::analysis::{Family, FamilySummary, SignificanceThresholds, TestResult};
use crate::differential::{AvalancheResult, BicResult};
use crate::primitives::Algorithm;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maps NaN to 0, +∞ to 1 and −∞ to 0; finite values pass through.
pub fn sanitize(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else if value == f64::INFINITY {
        1.0
    } else if value == f64::NEG_INFINITY {
        0.0
    } else {
        value
    }
}

/// Results of one battery plus their verdict tally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyReport {
    /// Individual test results.
    pub results: Vec<TestResult>,
    /// Pass/fail/inapplicable counts at the run's alpha.
    pub summary: FamilySummary,
}

impl FamilyReport {
    /// Tallies `results` against `thresholds`.
    pub fn new(results: Vec<TestResult>, thresholds: &SignificanceThresholds) -> Self {
        let summary = thresholds.summarize(&results);
        Self { results, summary }
    }
}

/// Everything one run produced, grouped by analysis.
///
/// Absent sections were disabled or could not be computed; a run whose
/// primitive could not be built carries only `hashing_error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Analysed primitive.
    pub algorithm: Algorithm,
    /// Reduced round count.
    pub rounds: u32,
    /// Input length for the basic statistics.
    pub input_size_bytes: usize,
    /// Inputs hashed for the basic statistics.
    pub tests_count: usize,
    /// Wall-clock start of the run.
    pub started_at: DateTime<Utc>,
    /// Run duration in milliseconds.
    pub elapsed_ms: u64,
    /// Significance level the summaries were computed at.
    pub alpha: f64,
    /// Seed used for trial sampling, if one was fixed.
    pub seed: Option<u64>,
    /// Reduced versus full-round digest comparison.
    pub basic: Option<BasicStatistics>,
    /// NIST battery.
    pub nist: Option<FamilyReport>,
    /// Diehard battery.
    pub diehard: Option<FamilyReport>,
    /// TestU01 battery.
    pub testu01: Option<FamilyReport>,
    /// Strict Avalanche Criterion.
    pub avalanche: Option<AvalancheResult>,
    /// Bit Independence Criterion.
    pub bic: Option<BicResult>,
    /// Set when the primitive could not produce a digest.
    pub hashing_error: Option<String>,
    /// Non-fatal problems encountered during the run.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl RunReport {
    /// Empty report for a run starting now.
    pub fn new(algorithm: Algorithm, rounds: u32, input_size_bytes: usize, tests_count: usize) -> Self {
        Self {
            algorithm,
            rounds,
            input_size_bytes,
            tests_count,
            started_at: Utc::now(),
            elapsed_ms: 0,
            alpha: SignificanceThresholds::default().alpha,
            seed: None,
            basic: None,
            nist: None,
            diehard: None,
            testu01: None,
            avalanche: None,
            bic: None,
            hashing_error: None,
            warnings: Vec::new(),
        }
    }

    /// True when the primitive failed and no analysis ran.
    pub fn is_partial(&self) -> bool {
        self.hashing_error.is_some()
    }

    /// The report section for `family`.
    pub fn family(&self, family: Family) -> Option<&FamilyReport> {
        match family {
            Family::Nist => self.nist.as_ref(),
            Family::Diehard => self.diehard.as_ref(),
            Family::TestU01 => self.testu01.as_ref(),
        }
    }

    /// Every battery result across the three families.
    pub fn test_results(&self) -> impl Iterator<Item = &TestResult> {
        [&self.nist, &self.diehard, &self.testu01]
            .into_iter()
            .flatten()
            .flat_map(|f| f.results.iter())
    }

    /// Sum of the per-family tallies.
    pub fn overall_summary(&self) -> FamilySummary {
        [&self.nist, &self.diehard, &self.testu01]
            .into_iter()
            .flatten()
            .fold(FamilySummary::default(), |acc, f| FamilySummary {
                passed: acc.passed + f.summary.passed,
                failed: acc.failed + f.summary.failed,
                inapplicable: acc.inapplicable + f.summary.inapplicable,
            })
    }

    /// Copy with every numeric field passed through [`sanitize`].
    ///
    /// Summaries are left as computed, so sentinels still count as
    /// inapplicable even though their values become 0.
    pub fn sanitized(&self) -> Self {
        let mut report = self.clone();

        for family in [&mut report.nist, &mut report.diehard, &mut report.testu01]
            .into_iter()
            .flatten()
        {
            for result in &mut family.results {
                result.p_value = sanitize(result.p_value);
            }
        }

        if let Some(basic) = report.basic.as_mut() {
            basic.mean_hamming = sanitize(basic.mean_hamming);
            basic.std_hamming = sanitize(basic.std_hamming);
            basic.flip_chi_square = sanitize(basic.flip_chi_square);
            basic.flip_p_value = sanitize(basic.flip_p_value);
        }

        if let Some(sac) = report.avalanche.as_mut() {
            sac.mean_flip_rate = sanitize(sac.mean_flip_rate);
            sac.std_dev_flip_rate = sanitize(sac.std_dev_flip_rate);
            sac.max_deviation_from_half = sanitize(sac.max_deviation_from_half);
            sac.min_p_value = sanitize(sac.min_p_value);
            sac.max_p_value = sanitize(sac.max_p_value);
        }

        if let Some(bic) = report.bic.as_mut() {
            bic.mean_correlation = sanitize(bic.mean_correlation);
            bic.std_correlation = sanitize(bic.std_correlation);
            bic.max_correlation_abs = sanitize(bic.max_correlation_abs);
            bic.min_correlation = sanitize(bic.min_correlation);
        }

        report
    }

    /// The sanitized report as TOML, the form handed to persistence.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&self.sanitized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with(results: Vec<TestResult>) -> RunReport {
        let mut report = RunReport::new(Algorithm::Keccak, 3, 16, 10);
        report.nist = Some(FamilyReport::new(results, &SignificanceThresholds::default()));
        report
    }

    #[test]
    fn test_sanitize_values() {
        assert_eq!(sanitize(f64::NAN), 0.0);
        assert_eq!(sanitize(f64::INFINITY), 1.0);
        assert_eq!(sanitize(f64::NEG_INFINITY), 0.0);
        assert_eq!(sanitize(0.42), 0.42);
        assert_eq!(sanitize(-1.0), -1.0);
    }

    #[test]
    fn test_sanitized_report_keeps_summary() {
        let report = report_with(vec![
            TestResult::new(Family::Nist, "Monobit", 0.5),
            TestResult::new(Family::Nist, "Universal", f64::NAN),
            TestResult::new(Family::Nist, "Runs", f64::INFINITY),
        ]);
        let clean = report.sanitized();
        let values: Vec<f64> = clean.test_results().map(|r| r.p_value).collect();
        assert_eq!(values, vec![0.5, 0.0, 1.0]);

        let summary = clean.nist.as_ref().unwrap().summary;
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.inapplicable, 1);
        assert!(report.test_results().nth(1).unwrap().p_value.is_nan());
    }

    #[test]
    fn test_toml_handoff_is_sanitized() {
        let report = report_with(vec![
            TestResult::new(Family::Nist, "Monobit", 0.25),
            TestResult::new(Family::Nist, "Universal", f64::NAN),
        ]);
        let text = report.to_toml().unwrap();
        assert!(!text.contains("nan"));

        let restored: RunReport = toml::from_str(&text).unwrap();
        let nist = restored.nist.unwrap();
        assert_eq!(nist.results[0].p_value, 0.25);
        assert_eq!(nist.results[1].p_value, 0.0);
        assert_eq!(nist.summary.inapplicable, 1);
        assert_eq!(restored.started_at, report.started_at);
    }

    #[test]
    fn test_overall_summary_sums_families() {
        let thresholds = SignificanceThresholds::default();
        let mut report = report_with(vec![TestResult::new(Family::Nist, "Monobit", 0.0)]);
        report.diehard = Some(FamilyReport::new(
            vec![
                TestResult::new(Family::Diehard, "CountOnes", 0.3),
                TestResult::new(Family::Diehard, "Craps", -1.0),
            ],
            &thresholds,
        ));

        let overall = report.overall_summary();
        assert_eq!(overall.failed, 1);
        assert_eq!(overall.passed, 1);
        assert_eq!(overall.inapplicable, 1);
        assert_eq!(overall.total(), 3);
        assert!(report.family(Family::TestU01).is_none());
    }

    #[test]
    fn test_partial_report() {
        let mut report = RunReport::new(Algorithm::Blake, 99, 16, 10);
        assert!(!report.is_partial());
        report.hashing_error = Some("rounds out of range".into());
        assert!(report.is_partial());
        assert_eq!(report.overall_summary().total(), 0);
    }
}
