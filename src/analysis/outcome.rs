//! Test results and their classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The battery a test belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    /// NIST SP 800-22 style tests.
    Nist,
    /// Marsaglia's Diehard style tests.
    Diehard,
    /// TestU01 style tests.
    TestU01,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Family::Nist => "NIST",
            Family::Diehard => "Diehard",
            Family::TestU01 => "TestU01",
        })
    }
}

/// One test's p-value, or the test's own inapplicable sentinel.
///
/// Sentinels are NaN or -1.0 depending on the test; both classify as
/// [`Verdict::Inapplicable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Test name, e.g. `"Monobit"`.
    pub name: String,
    /// Owning battery.
    pub family: Family,
    /// p-value in [0, 1], NaN or -1.0.
    pub p_value: f64,
    /// Free-form remark (parameter choice, padding, error).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TestResult {
    /// Creates a result without a note.
    pub fn new(family: Family, name: impl Into<String>, p_value: f64) -> Self {
        Self {
            name: name.into(),
            family,
            p_value,
            note: None,
        }
    }

    /// Attaches a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// True when the value is a sentinel rather than a p-value.
    pub fn is_inapplicable(&self) -> bool {
        self.p_value.is_nan() || self.p_value < 0.0
    }
}

/// Outcome of comparing a result against a significance level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// p >= alpha.
    Pass,
    /// p < alpha.
    Fail,
    /// Sentinel value; the test did not apply.
    Inapplicable,
}

/// Pass/fail/inapplicable tally for one battery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilySummary {
    /// Results with p >= alpha.
    pub passed: usize,
    /// Results with p < alpha.
    pub failed: usize,
    /// Sentinel results.
    pub inapplicable: usize,
}

impl FamilySummary {
    /// Adds one verdict.
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Pass => self.passed += 1,
            Verdict::Fail => self.failed += 1,
            Verdict::Inapplicable => self.inapplicable += 1,
        }
    }

    /// Total results tallied.
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.inapplicable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_are_inapplicable() {
        assert!(TestResult::new(Family::Nist, "a", f64::NAN).is_inapplicable());
        assert!(TestResult::new(Family::Diehard, "b", -1.0).is_inapplicable());
        assert!(!TestResult::new(Family::TestU01, "c", 0.0).is_inapplicable());
    }

    #[test]
    fn test_summary_tally() {
        let mut summary = FamilySummary::default();
        summary.record(Verdict::Pass);
        summary.record(Verdict::Fail);
        summary.record(Verdict::Inapplicable);
        summary.record(Verdict::Pass);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.total(), 4);
    }
}
