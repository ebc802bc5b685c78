//! Metrics collection and registry.

use crate::orchestrator::RunReport;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Prometheus registry of run counters and the latest differential results.
pub struct MetricsRegistry {
    registry: Registry,

    // Run metrics
    runs_total: IntCounter,
    hash_failures_total: IntCounter,
    last_run_rounds: IntGauge,
    last_run_duration_ms: IntGauge,

    // Battery metrics
    tests_executed_total: IntCounter,
    tests_failed_total: IntCounter,
    tests_inapplicable_total: IntCounter,

    // Differential metrics
    sac_mean_flip_rate: Gauge,
    bic_max_correlation: Gauge,
}

impl MetricsRegistry {
    /// Creates a new registry with all run metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let runs_total = IntCounter::new("hashround_runs_total", "Total analysis runs recorded")?;
        let hash_failures_total = IntCounter::new(
            "hashround_hash_failures_total",
            "Runs that could not build their primitive",
        )?;
        let last_run_rounds = IntGauge::new(
            "hashround_last_run_rounds",
            "Round count of the most recent run",
        )?;
        let last_run_duration_ms = IntGauge::new(
            "hashround_last_run_duration_ms",
            "Wall-clock duration of the most recent run in milliseconds",
        )?;

        let tests_executed_total = IntCounter::new(
            "hashround_tests_executed_total",
            "Statistical tests executed across all batteries",
        )?;
        let tests_failed_total = IntCounter::new(
            "hashround_tests_failed_total",
            "Statistical tests with a p-value below alpha",
        )?;
        let tests_inapplicable_total = IntCounter::new(
            "hashround_tests_inapplicable_total",
            "Statistical tests that returned their inapplicable sentinel",
        )?;

        let sac_mean_flip_rate = Gauge::new(
            "hashround_sac_mean_flip_rate",
            "Mean output-bit flip rate of the most recent avalanche analysis",
        )?;
        let bic_max_correlation = Gauge::new(
            "hashround_bic_max_correlation",
            "Largest absolute output-bit correlation of the most recent BIC analysis",
        )?;

        registry.register(Box::new(runs_total.clone()))?;
        registry.register(Box::new(hash_failures_total.clone()))?;
        registry.register(Box::new(last_run_rounds.clone()))?;
        registry.register(Box::new(last_run_duration_ms.clone()))?;
        registry.register(Box::new(tests_executed_total.clone()))?;
        registry.register(Box::new(tests_failed_total.clone()))?;
        registry.register(Box::new(tests_inapplicable_total.clone()))?;
        registry.register(Box::new(sac_mean_flip_rate.clone()))?;
        registry.register(Box::new(bic_max_correlation.clone()))?;

        Ok(Self {
            registry,
            runs_total,
            hash_failures_total,
            last_run_rounds,
            last_run_duration_ms,
            tests_executed_total,
            tests_failed_total,
            tests_inapplicable_total,
            sac_mean_flip_rate,
            bic_max_correlation,
        })
    }

    /// Folds one finished run into the metrics.
    pub fn record(&self, report: &RunReport) {
        self.runs_total.inc();
        self.last_run_rounds.set(i64::from(report.rounds));
        self.last_run_duration_ms
            .set(i64::try_from(report.elapsed_ms).unwrap_or(i64::MAX));

        if report.is_partial() {
            self.hash_failures_total.inc();
            return;
        }

        let summary = report.overall_summary();
        self.tests_executed_total.inc_by(summary.total() as u64);
        self.tests_failed_total.inc_by(summary.failed as u64);
        self.tests_inapplicable_total.inc_by(summary.inapplicable as u64);

        // Gauges keep their previous value when the analysis was skipped.
        if let Some(sac) = &report.avalanche {
            self.sac_mean_flip_rate.set(sac.mean_flip_rate);
        }
        if let Some(bic) = &report.bic {
            self.bic_max_correlation.set(bic.max_correlation_abs);
        }
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Family, SignificanceThresholds, TestResult};
    use crate::orchestrator::FamilyReport;
    use crate::primitives::Algorithm;

    fn sample_report() -> RunReport {
        let mut report = RunReport::new(Algorithm::Keccak, 4, 16, 100);
        report.elapsed_ms = 250;
        report.nist = Some(FamilyReport::new(
            vec![
                TestResult::new(Family::Nist, "Monobit", 0.4),
                TestResult::new(Family::Nist, "Runs", 0.0001),
                TestResult::new(Family::Nist, "MaurerUniversal", f64::NAN),
            ],
            &SignificanceThresholds::default(),
        ));
        report
    }

    #[test]
    fn test_registry_creation() {
        assert!(MetricsRegistry::new().is_ok());
    }

    #[test]
    fn test_record_run() {
        let registry = MetricsRegistry::new().unwrap();
        registry.record(&sample_report());

        let output = registry.encode().unwrap();
        assert!(output.contains("hashround_runs_total 1"));
        assert!(output.contains("hashround_last_run_rounds 4"));
        assert!(output.contains("hashround_last_run_duration_ms 250"));
        assert!(output.contains("hashround_tests_executed_total 3"));
        assert!(output.contains("hashround_tests_failed_total 1"));
        assert!(output.contains("hashround_tests_inapplicable_total 1"));
        assert!(output.contains("hashround_hash_failures_total 0"));
    }

    #[test]
    fn test_record_partial_run() {
        let registry = MetricsRegistry::new().unwrap();
        let mut report = RunReport::new(Algorithm::Blake, 30, 16, 100);
        report.hashing_error = Some("out of range".into());
        registry.record(&report);
        registry.record(&sample_report());

        let output = registry.encode().unwrap();
        assert!(output.contains("hashround_runs_total 2"));
        assert!(output.contains("hashround_hash_failures_total 1"));
        assert!(output.contains("hashround_tests_executed_total 3"));
    }

    #[test]
    fn test_metrics_encode() {
        let registry = MetricsRegistry::new().unwrap();
        let output = registry.encode().unwrap();
        assert!(output.contains("hashround_sac_mean_flip_rate"));
        assert!(output.contains("hashround_bic_max_correlation"));
    }
}
