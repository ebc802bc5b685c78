//! Run configuration.
//!
//! Every section is optional in the TOML file; missing sections and
//! fields take their defaults.

use crate::analysis::SignificanceThresholds;
use crate::differential::{BicParams, SacParams};
use crate::stream::MAX_STREAM_BITS;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Length of the generated stream fed to the bit-string tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Bits to expand from the reduced-round hash.
    pub bits: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { bits: 1_000_000 }
    }
}

/// Which analyses a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyToggles {
    /// NIST battery.
    pub nist: bool,
    /// Diehard battery.
    pub diehard: bool,
    /// TestU01 battery.
    pub testu01: bool,
    /// Strict Avalanche Criterion.
    pub avalanche: bool,
    /// Bit Independence Criterion.
    pub bic: bool,
}

impl Default for FamilyToggles {
    fn default() -> Self {
        Self {
            nist: true,
            diehard: true,
            testu01: true,
            avalanche: true,
            bic: true,
        }
    }
}

impl FamilyToggles {
    /// Everything off; enable what you need.
    pub fn none() -> Self {
        Self {
            nist: false,
            diehard: false,
            testu01: false,
            avalanche: false,
            bic: false,
        }
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Stream expansion for the bit-string tests.
    #[serde(default)]
    pub stream: StreamConfig,
    /// SAC parameters.
    #[serde(default)]
    pub avalanche: SacParams,
    /// BIC parameters.
    #[serde(default)]
    pub bic: BicParams,
    /// Enabled analyses.
    #[serde(default)]
    pub families: FamilyToggles,
    /// Verdict significance level.
    #[serde(default)]
    pub thresholds: SignificanceThresholds,
    /// Fixed seed for trial sampling; absent means OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl AnalysisConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream.bits == 0 || self.stream.bits > MAX_STREAM_BITS {
            return Err(ConfigError::InvalidStreamLength(self.stream.bits));
        }
        if self.avalanche.trials == 0 || self.avalanche.input_size_bytes == 0 {
            return Err(ConfigError::InvalidAvalanche);
        }
        if self.bic.input_bits == 0 || self.bic.experiments_per_bit < 2 {
            return Err(ConfigError::InvalidBic);
        }
        let alpha = self.thresholds.alpha;
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(ConfigError::InvalidAlpha(alpha));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// `[stream] bits` is zero or above the generator ceiling.
    #[error("stream length must be 1..=268435456 bits, got {0}")]
    InvalidStreamLength(usize),
    /// `[avalanche]` has zero trials or a zero input size.
    #[error("avalanche trials and input size must be positive")]
    InvalidAvalanche,
    /// `[bic]` has no input bits or fewer than two experiments per bit.
    #[error("BIC needs positive input bits and at least two experiments per bit")]
    InvalidBic,
    /// `[thresholds] alpha` outside (0, 1).
    #[error("significance level must be in (0, 1), got {0}")]
    InvalidAlpha(f64),
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The file is not valid TOML for this format.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differential::AvalancheMode;

    #[test]
    fn test_defaults_validate() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stream.bits, 1_000_000);
        assert_eq!(config.thresholds.alpha, 0.01);
        assert!(config.families.bic);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(AnalysisConfig::from_toml("").unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = AnalysisConfig::from_toml(
            r#"
            seed = 42

            [stream]
            bits = 200000

            [avalanche]
            trials = 500
            mode = "exhaustive"

            [families]
            diehard = false

            [thresholds]
            alpha = 0.05
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, Some(42));
        assert_eq!(config.stream.bits, 200_000);
        assert_eq!(config.avalanche.trials, 500);
        assert_eq!(config.avalanche.input_size_bytes, 16);
        assert_eq!(config.avalanche.mode, AvalancheMode::Exhaustive);
        assert!(!config.families.diehard);
        assert!(config.families.nist);
        assert_eq!(config.bic, BicParams::default());
        assert_eq!(config.thresholds.alpha, 0.05);
    }

    #[test]
    fn test_validation_errors() {
        assert_eq!(
            AnalysisConfig::from_toml("[stream]\nbits = 0"),
            Err(ConfigError::InvalidStreamLength(0))
        );
        assert_eq!(
            AnalysisConfig::from_toml("[bic]\nexperiments_per_bit = 1"),
            Err(ConfigError::InvalidBic)
        );
        assert_eq!(
            AnalysisConfig::from_toml("[thresholds]\nalpha = 1.5"),
            Err(ConfigError::InvalidAlpha(1.5))
        );
        assert!(matches!(
            AnalysisConfig::from_toml("[stream]\nbits = \"many\""),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ConfigError::InvalidStreamLength(0).to_string(),
            "stream length must be 1..=268435456 bits, got 0"
        );
        assert_eq!(
            ConfigError::InvalidAlpha(2.0).to_string(),
            "significance level must be in (0, 1), got 2"
        );
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            AnalysisConfig::from_file("/nonexistent/hashround.toml"),
            Err(ConfigError::FileReadError(_))
        ));
    }
}
