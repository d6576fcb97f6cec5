//! Pipeline configuration.
//!
//! All thresholds, weights and token sets used by the stages live in an
//! explicit [`PipelineConfig`] value passed to the pipeline. Nothing is read
//! from global state, so callers with different policies can run side by side.
//!
//! # Example
//!
//! ```rust
//! use sheet_guard::config::{AmbiguousHeaderPolicy, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .duplicate_ceiling(0.1)
//!     .coverage_threshold(0.9)
//!     .ambiguous_header_policy(AmbiguousHeaderPolicy::TreatAsData)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.duplicates.ceiling, 0.1);
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// What to do when no header rule decides whether row 0 is a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguousHeaderPolicy {
    /// Consume row 0 as the header row
    TreatAsHeader,
    /// Keep row 0 as data and synthesize names
    TreatAsData,
}

/// Configuration for the header resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Drop rows and columns whose every cell is blank before probing (default: true)
    pub prune_empty: bool,
    /// Resolution of ambiguous header detection (default: TreatAsHeader)
    pub ambiguous_policy: AmbiguousHeaderPolicy,
    /// Rows after row 0 inspected to learn each column's data pattern (default: 50)
    pub probe_rows: usize,
    /// Values sampled when deriving a name from column content (default: 20)
    pub name_sample_size: usize,
    /// Share of sampled values a naming rule must match (default: 0.8)
    pub name_inference_coverage: f64,
    /// Maximum length of a name taken from a header cell (default: 50)
    pub max_name_length: usize,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            prune_empty: true,
            ambiguous_policy: AmbiguousHeaderPolicy::TreatAsHeader,
            probe_rows: 50,
            name_sample_size: 20,
            name_inference_coverage: 0.8,
            max_name_length: 50,
        }
    }
}

/// Configuration for the type coercer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoercionConfig {
    /// Number of non-missing values sampled per column (default: 1000)
    pub sample_size: usize,
    /// Minimum share of sampled values matching a type pattern (default: 0.8)
    pub coverage_threshold: f64,
    /// Distinct values below which a text column is categorical (default: 100)
    pub categorical_max_cardinality: usize,
    /// Distinct-to-present ratio below which a text column is categorical (default: 0.5)
    pub categorical_max_ratio: f64,
}

impl Default for CoercionConfig {
    fn default() -> Self {
        Self {
            sample_size: 1000,
            coverage_threshold: 0.8,
            categorical_max_cardinality: 100,
            categorical_max_ratio: 0.5,
        }
    }
}

/// Configuration for the value normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Tokens mapped to the missing marker, compared case-insensitively
    pub null_tokens: Vec<String>,
    /// Trim leading/trailing whitespace of text cells (default: true)
    pub trim_whitespace: bool,
    /// Repair common mis-decoded UTF-8 sequences (default: true)
    pub repair_encoding: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            null_tokens: ["n/a", "na", "null", "none", "nan", "#n/a"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            trim_whitespace: true,
            repair_encoding: true,
        }
    }
}

impl NormalizerConfig {
    /// Compiles the configured token list into a lookup set.
    pub fn null_token_set(&self) -> NullTokens {
        NullTokens::new(&self.null_tokens)
    }
}

/// Case-insensitive set of null-like tokens.
///
/// Empty and whitespace-only strings are always null.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NullTokens {
    tokens: HashSet<String>,
}

impl NullTokens {
    pub fn new<S: AsRef<str>>(tokens: &[S]) -> Self {
        Self {
            tokens: tokens
                .iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    /// Returns true if the string should be read as a missing value.
    pub fn is_null(&self, raw: &str) -> bool {
        let trimmed = raw.trim();
        trimmed.is_empty() || self.tokens.contains(&trimmed.to_lowercase())
    }
}

/// Configuration for the duplicate resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateConfig {
    /// Duplicate ratio at or above which duplicates are retained (default: 0.2)
    pub ceiling: f64,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self { ceiling: 0.2 }
    }
}

/// Weights of the four quality dimensions. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub completeness: f64,
    pub uniqueness: f64,
    pub consistency: f64,
    pub validity: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            completeness: 0.35,
            uniqueness: 0.15,
            consistency: 0.25,
            validity: 0.25,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.completeness + self.uniqueness + self.consistency + self.validity
    }

    fn values(&self) -> [f64; 4] {
        [
            self.completeness,
            self.uniqueness,
            self.consistency,
            self.validity,
        ]
    }
}

/// Lenient plausibility bounds used by the validity dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidityBounds {
    /// Largest plausible absolute numeric value (default: 1e15)
    pub max_abs_numeric: f64,
    /// IQR multiplier of the outlier fence (default: 10.0)
    pub iqr_multiplier: f64,
    /// Minimum values in a column before the fence applies (default: 10)
    pub min_values_for_fence: usize,
    /// Earliest plausible year (default: 1900)
    pub min_year: i32,
    /// Latest plausible year (default: 2100)
    pub max_year: i32,
    /// Longest plausible text cell in characters (default: 10_000)
    pub max_text_length: usize,
}

impl Default for ValidityBounds {
    fn default() -> Self {
        Self {
            max_abs_numeric: 1e15,
            iqr_multiplier: 10.0,
            min_values_for_fence: 10,
            min_year: 1900,
            max_year: 2100,
            max_text_length: 10_000,
        }
    }
}

/// Configuration for the quality scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    /// Completeness sub-score never drops below this value (default: 0.8)
    pub completeness_floor: f64,
    /// Uniqueness sub-score never drops below this value (default: 0.9)
    pub uniqueness_floor: f64,
    /// Bonus when every column name is meaningful (default: 0.02)
    pub meaningful_names_bonus: f64,
    /// Bonus when at least one column has a non-text type (default: 0.03)
    pub proper_types_bonus: f64,
    /// Upper bound of the final score (default: 1.0)
    pub score_ceiling: f64,
    pub validity: ValidityBounds,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            completeness_floor: 0.8,
            uniqueness_floor: 0.9,
            meaningful_names_bonus: 0.02,
            proper_types_bonus: 0.03,
            score_ceiling: 1.0,
            validity: ValidityBounds::default(),
        }
    }
}

/// Complete configuration consumed by [`Pipeline`](crate::core::Pipeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub header: HeaderConfig,
    pub coercion: CoercionConfig,
    pub normalizer: NormalizerConfig,
    pub duplicates: DuplicateConfig,
    pub scoring: ScoringConfig,
    /// Attach cleaning suggestions to the diagnostics (default: true)
    pub suggestions: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            header: HeaderConfig::default(),
            coercion: CoercionConfig::default(),
            normalizer: NormalizerConfig::default(),
            duplicates: DuplicateConfig::default(),
            scoring: ScoringConfig::default(),
            suggestions: true,
        }
    }
}

impl PipelineConfig {
    /// Creates a builder starting from the defaults.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// The default configuration, with generous completeness and uniqueness
    /// floors.
    pub fn lenient() -> Self {
        Self::default()
    }

    /// Configuration without the generous score floors: completeness and
    /// uniqueness are scored as measured.
    pub fn strict() -> Self {
        let mut config = Self::lenient();
        config.scoring.completeness_floor = 0.0;
        config.scoring.uniqueness_floor = 0.0;
        config
    }

    /// Parses a configuration from JSON. Omitted fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Checks that every threshold is in range and the weights sum to 1.0.
    pub fn validate(&self) -> Result<()> {
        let unit_fields = [
            ("header.name_inference_coverage", self.header.name_inference_coverage),
            ("coercion.coverage_threshold", self.coercion.coverage_threshold),
            ("coercion.categorical_max_ratio", self.coercion.categorical_max_ratio),
            ("duplicates.ceiling", self.duplicates.ceiling),
            ("scoring.completeness_floor", self.scoring.completeness_floor),
            ("scoring.uniqueness_floor", self.scoring.uniqueness_floor),
            ("scoring.meaningful_names_bonus", self.scoring.meaningful_names_bonus),
            ("scoring.proper_types_bonus", self.scoring.proper_types_bonus),
            ("scoring.score_ceiling", self.scoring.score_ceiling),
        ];
        for (name, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(SheetError::Configuration(format!(
                    "{name} must be between 0.0 and 1.0, got {value}"
                )));
            }
        }

        let weights = self.scoring.weights;
        if weights.values().iter().any(|w| !(0.0..=1.0).contains(w)) {
            return Err(SheetError::Configuration(
                "score weights must each be between 0.0 and 1.0".to_string(),
            ));
        }
        if (weights.sum() - 1.0).abs() > 1e-9 {
            return Err(SheetError::Configuration(format!(
                "score weights must sum to 1.0, got {:.4}",
                weights.sum()
            )));
        }

        if self.coercion.sample_size == 0 {
            return Err(SheetError::Configuration(
                "coercion.sample_size must be greater than zero".to_string(),
            ));
        }
        if self.header.max_name_length == 0 {
            return Err(SheetError::Configuration(
                "header.max_name_length must be greater than zero".to_string(),
            ));
        }
        let bounds = &self.scoring.validity;
        if bounds.min_year > bounds.max_year {
            return Err(SheetError::Configuration(format!(
                "scoring.validity.min_year ({}) is after max_year ({})",
                bounds.min_year, bounds.max_year
            )));
        }
        if bounds.iqr_multiplier <= 0.0 || bounds.max_abs_numeric <= 0.0 {
            return Err(SheetError::Configuration(
                "scoring.validity bounds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug, Clone)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Replace the null-token set
    pub fn null_tokens<S: Into<String>>(mut self, tokens: impl IntoIterator<Item = S>) -> Self {
        self.config.normalizer.null_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Set the duplicate-ratio ceiling
    pub fn duplicate_ceiling(mut self, ceiling: f64) -> Self {
        self.config.duplicates.ceiling = ceiling;
        self
    }

    /// Set the type-detection coverage threshold
    pub fn coverage_threshold(mut self, threshold: f64) -> Self {
        self.config.coercion.coverage_threshold = threshold;
        self
    }

    /// Set the number of values sampled for type inference
    pub fn sample_size(mut self, size: usize) -> Self {
        self.config.coercion.sample_size = size;
        self
    }

    /// Set the categorical cardinality limit
    pub fn categorical_max_cardinality(mut self, limit: usize) -> Self {
        self.config.coercion.categorical_max_cardinality = limit;
        self
    }

    /// Set the completeness score floor
    pub fn completeness_floor(mut self, floor: f64) -> Self {
        self.config.scoring.completeness_floor = floor;
        self
    }

    /// Set the uniqueness score floor
    pub fn uniqueness_floor(mut self, floor: f64) -> Self {
        self.config.scoring.uniqueness_floor = floor;
        self
    }

    /// Set the dimension weights
    pub fn weights(mut self, weights: ScoreWeights) -> Self {
        self.config.scoring.weights = weights;
        self
    }

    /// Set the ambiguous-header policy
    pub fn ambiguous_header_policy(mut self, policy: AmbiguousHeaderPolicy) -> Self {
        self.config.header.ambiguous_policy = policy;
        self
    }

    /// Enable or disable blank row/column pruning
    pub fn prune_empty(mut self, enable: bool) -> Self {
        self.config.header.prune_empty = enable;
        self
    }

    /// Enable or disable encoding repair
    pub fn repair_encoding(mut self, enable: bool) -> Self {
        self.config.normalizer.repair_encoding = enable;
        self
    }

    /// Enable or disable cleaning suggestions
    pub fn suggestions(mut self, enable: bool) -> Self {
        self.config.suggestions = enable;
        self
    }

    /// Set the full scoring configuration
    pub fn scoring(mut self, scoring: ScoringConfig) -> Self {
        self.config.scoring = scoring;
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<PipelineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::lenient();
        assert!(config.validate().is_ok());
        assert_eq!(config.duplicates.ceiling, 0.2);
        assert_eq!(config.coercion.coverage_threshold, 0.8);
        assert_eq!(config.coercion.sample_size, 1000);
        assert_eq!(config.scoring.completeness_floor, 0.8);
        assert_eq!(config.scoring.uniqueness_floor, 0.9);
        assert!((config.scoring.weights.sum() - 1.0).abs() < 1e-12);
        assert_eq!(
            config.header.ambiguous_policy,
            AmbiguousHeaderPolicy::TreatAsHeader
        );
    }

    #[test]
    fn test_builder_overrides() {
        let config = PipelineConfig::builder()
            .null_tokens(["missing", "-"])
            .duplicate_ceiling(0.05)
            .sample_size(10)
            .prune_empty(false)
            .build()
            .unwrap();

        assert_eq!(config.normalizer.null_tokens, vec!["missing", "-"]);
        assert_eq!(config.duplicates.ceiling, 0.05);
        assert_eq!(config.coercion.sample_size, 10);
        assert!(!config.header.prune_empty);
        assert!(config.suggestions);
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let result = PipelineConfig::builder()
            .weights(ScoreWeights {
                completeness: 0.5,
                uniqueness: 0.5,
                consistency: 0.5,
                validity: 0.5,
            })
            .build();
        assert!(matches!(result, Err(SheetError::Configuration(_))));
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let result = PipelineConfig::builder().coverage_threshold(1.5).build();
        let err = result.unwrap_err();
        assert!(err.to_string().contains("coercion.coverage_threshold"));
    }

    #[test]
    fn test_null_tokens_case_insensitive() {
        let tokens = NormalizerConfig::default().null_token_set();
        assert!(tokens.is_null("N/A"));
        assert!(tokens.is_null(" NULL "));
        assert!(tokens.is_null("None"));
        assert!(tokens.is_null(""));
        assert!(tokens.is_null("   "));
        assert!(!tokens.is_null("0"));
        assert!(!tokens.is_null("Nancy"));
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            PipelineConfig::from_json_str(r#"{"duplicates": {"ceiling": 0.3}, "suggestions": true}"#)
                .unwrap();
        assert_eq!(config.duplicates.ceiling, 0.3);
        assert_eq!(config.coercion.coverage_threshold, 0.8);
    }

    #[test]
    fn test_from_json_rejects_bad_weights() {
        let result = PipelineConfig::from_json_str(
            r#"{"scoring": {"weights": {"completeness": 0.9}}}"#,
        );
        assert!(matches!(result, Err(SheetError::Configuration(_))));
    }

    #[test]
    fn test_strict_removes_floors() {
        let config = PipelineConfig::strict();
        assert_eq!(config.scoring.completeness_floor, 0.0);
        assert_eq!(config.scoring.uniqueness_floor, 0.0);
    }
}
