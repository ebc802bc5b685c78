//! Prometheus metrics for analysis runs.
//!
//! # Metrics Exposed
//!
//! ## Run Metrics
//! - `hashround_runs_total` - Runs recorded
//! - `hashround_hash_failures_total` - Runs whose primitive could not be built
//! - `hashround_last_run_rounds` - Round count of the latest run
//! - `hashround_last_run_duration_ms` - Duration of the latest run
//!
//! ## Battery Metrics
//! - `hashround_tests_executed_total` - Statistical tests executed
//! - `hashround_tests_failed_total` - Tests with p below alpha
//! - `hashround_tests_inapplicable_total` - Tests that returned their sentinel
//!
//! ## Differential Metrics
//! - `hashround_sac_mean_flip_rate` - Latest avalanche mean flip rate
//! - `hashround_bic_max_correlation` - Latest BIC max |correlation|
//!
//! # Example
//!
//! ```no_run
//! use hashround::metrics::MetricsRegistry;
//! use hashround::orchestrator::{run, AnalysisConfig, RunParameters};
//! use hashround::primitives::Algorithm;
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! let report = run(&RunParameters::new(Algorithm::Keccak, 4), &AnalysisConfig::default());
//! registry.record(&report);
//! println!("{}", registry.encode().expect("Failed to encode metrics"));
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry};
