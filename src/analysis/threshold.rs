//! Significance thresholds for test verdicts.

use super::outcome::{FamilySummary, TestResult, Verdict};
use serde::{Deserialize, Serialize};

/// Significance level applied to every p-value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignificanceThresholds {
    /// A result fails when p < alpha.
    pub alpha: f64,
}

impl Default for SignificanceThresholds {
    fn default() -> Self {
        Self { alpha: 0.01 }
    }
}

impl SignificanceThresholds {
    /// Rejects more readily (alpha = 0.05).
    pub fn strict() -> Self {
        Self { alpha: 0.05 }
    }

    /// Rejects only extreme results (alpha = 0.001).
    pub fn lenient() -> Self {
        Self { alpha: 0.001 }
    }

    /// Checks one result against alpha.
    pub fn check(&self, result: &TestResult) -> Result<(), ThresholdViolation> {
        if result.is_inapplicable() {
            return Err(ThresholdViolation::Inapplicable {
                test: result.name.clone(),
            });
        }

        if result.p_value < self.alpha {
            return Err(ThresholdViolation::BelowAlpha {
                test: result.name.clone(),
                observed: result.p_value,
                alpha: self.alpha,
            });
        }

        Ok(())
    }

    /// Classifies one result.
    pub fn verdict(&self, result: &TestResult) -> Verdict {
        match self.check(result) {
            Ok(()) => Verdict::Pass,
            Err(ThresholdViolation::BelowAlpha { .. }) => Verdict::Fail,
            Err(ThresholdViolation::Inapplicable { .. }) => Verdict::Inapplicable,
        }
    }

    /// Tallies verdicts over a battery's results.
    pub fn summarize(&self, results: &[TestResult]) -> FamilySummary {
        let mut summary = FamilySummary::default();
        for result in results {
            summary.record(self.verdict(result));
        }
        summary
    }
}

/// Why a result did not pass.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThresholdViolation {
    /// The p-value is below the significance level.
    #[error("{test}: p-value {observed:.6} below alpha {alpha}")]
    BelowAlpha {
        /// Test name.
        test: String,
        /// Observed p-value.
        observed: f64,
        /// Significance level.
        alpha: f64,
    },

    /// The test returned its sentinel.
    #[error("{test}: input inapplicable")]
    Inapplicable {
        /// Test name.
        test: String,
    },
}
