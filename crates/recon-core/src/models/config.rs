//! Configuration structures for the reconciliation pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Main configuration for a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Line parsing configuration.
    pub parser: ParserConfig,

    /// Transaction/receipt matching configuration.
    pub matching: MatchConfig,

    /// Run orchestration configuration.
    pub run: RunConfig,
}

/// PDF processing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages to read per document (0 = unlimited).
    pub max_pages: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self { max_pages: 0 }
    }
}

/// Line parsing configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Year applied to `MM/DD` dates when the document prints no closing date.
    pub default_year: Option<i32>,
}

/// Scoring weights and thresholds for the matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Largest absolute amount difference that still scores above zero.
    pub amount_tolerance: Decimal,

    /// Days of date difference over which the date score decays to zero.
    pub date_window_days: i64,

    /// Weight of the amount score.
    pub amount_weight: f64,

    /// Weight of the date score.
    pub date_weight: f64,

    /// Weight of the merchant/vendor name score.
    pub name_weight: f64,

    /// A candidate is assigned only when its score exceeds this value.
    pub threshold: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            amount_tolerance: Decimal::ONE,
            date_window_days: 3,
            amount_weight: 0.5,
            date_weight: 0.3,
            name_weight: 0.2,
            threshold: 0.6,
        }
    }
}

/// Longest date window accepted for matching and duplicate detection.
pub const MAX_WINDOW_DAYS: i64 = 366;

impl MatchConfig {
    /// Check ranges and that the weights form a convex combination.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.amount_tolerance.is_sign_negative() {
            return Err(ConfigError::invalid("matching.amount_tolerance", "must not be negative"));
        }
        if !(0..=MAX_WINDOW_DAYS).contains(&self.date_window_days) {
            return Err(ConfigError::invalid(
                "matching.date_window_days",
                format!("must be between 0 and {}", MAX_WINDOW_DAYS),
            ));
        }
        for (field, weight) in [
            ("matching.amount_weight", self.amount_weight),
            ("matching.date_weight", self.date_weight),
            ("matching.name_weight", self.name_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::invalid(field, format!("{} is not a non-negative number", weight)));
            }
        }
        let sum = self.amount_weight + self.date_weight + self.name_weight;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::invalid("matching", format!("weights sum to {:.4}, expected 1.0", sum)));
        }
        if !(0.0..1.0).contains(&self.threshold) {
            return Err(ConfigError::invalid("matching.threshold", "must be in [0, 1)"));
        }
        Ok(())
    }
}

/// Run orchestration configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Continue the run when a receipt document cannot be opened.
    pub skip_unreadable_receipts: bool,

    /// Raise a format mismatch instead of returning empty results.
    pub fail_on_format_mismatch: bool,

    /// Date window for duplicate charge detection.
    pub duplicate_window_days: i64,

    /// Minimum merchant similarity for duplicate charge detection.
    pub duplicate_threshold: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            skip_unreadable_receipts: true,
            fail_on_format_mismatch: false,
            duplicate_window_days: 1,
            duplicate_threshold: 0.9,
        }
    }
}

impl ReconConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.matching.validate()?;
        if !(0..=MAX_WINDOW_DAYS).contains(&self.run.duplicate_window_days) {
            return Err(ConfigError::invalid(
                "run.duplicate_window_days",
                format!("must be between 0 and {}", MAX_WINDOW_DAYS),
            ));
        }
        if !(0.0..=1.0).contains(&self.run.duplicate_threshold) {
            return Err(ConfigError::invalid("run.duplicate_threshold", "must be in [0, 1]"));
        }
        Ok(())
    }
}
