//! Composite data-quality scoring.
//!
//! The score is a weighted sum of four dimensions plus two small bonuses,
//! capped at the configured ceiling:
//!
//! | Dimension    | Default weight | Measures                                      |
//! |--------------|----------------|-----------------------------------------------|
//! | completeness | 0.35           | non-missing share of all cells (floor 0.80)   |
//! | uniqueness   | 0.15           | share of rows that are not duplicates (floor 0.90) |
//! | consistency  | 0.25           | values conforming to their column's type      |
//! | validity     | 0.25           | values inside lenient plausibility bounds     |
//!
//! Bonuses: +0.02 when every column name is meaningful, +0.03 when at least
//! one column carries a type other than free text.
//!
//! The scorer is a pure function of the table it is given, so scoring a
//! cleaned table twice always yields the same result.
//!
//! # Example
//!
//! ```rust
//! use sheet_guard::config::ScoringConfig;
//! use sheet_guard::core::{Column, SemanticType, Table};
//! use sheet_guard::scoring::{QualityGrade, QualityScorer};
//!
//! let table = Table::new(vec![
//!     Column::typed(
//!         "Region",
//!         SemanticType::Categorical,
//!         vec!["North".into(), "South".into(), "North".into()],
//!     ),
//!     Column::typed("Units", SemanticType::Integer, vec![12i64.into(), 7i64.into(), 9i64.into()]),
//! ])
//! .unwrap();
//!
//! let breakdown = QualityScorer::new(ScoringConfig::default()).score(&table);
//! assert_eq!(breakdown.final_score, 1.0);
//! assert_eq!(breakdown.quality_score().grade, QualityGrade::Excellent);
//! ```

use std::collections::HashMap;
use std::fmt;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::{ScoringConfig, ValidityBounds};
use crate::core::{Column, SemanticType, Table, Value};
use crate::patterns::{self, ValueShape};

/// Display tier of a quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    /// Score ≥ 0.99
    Excellent,
    /// Score ≥ 0.90
    High,
    /// Score ≥ 0.70
    Good,
    /// Anything lower
    NeedsReview,
}

impl QualityGrade {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.99 {
            QualityGrade::Excellent
        } else if score >= 0.90 {
            QualityGrade::High
        } else if score >= 0.70 {
            QualityGrade::Good
        } else {
            QualityGrade::NeedsReview
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QualityGrade::Excellent => "Excellent",
            QualityGrade::High => "High",
            QualityGrade::Good => "Good",
            QualityGrade::NeedsReview => "Needs review",
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Final quality score of a table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    /// Score in `[0, 1]`
    pub value: f64,
    pub grade: QualityGrade,
}

impl QualityScore {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            grade: QualityGrade::from_score(value),
        }
    }

    /// Score on a 0 to 100 scale.
    pub fn percent(&self) -> f64 {
        self.value * 100.0
    }
}

impl fmt::Display for QualityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}% ({})", self.percent(), self.grade)
    }
}

/// One weighted dimension of the score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    /// Measured value before flooring
    pub raw: f64,
    /// Configured floor
    pub floor: f64,
    /// `max(raw, floor)`
    pub score: f64,
    pub weight: f64,
}

impl DimensionScore {
    fn new(raw: f64, floor: f64, weight: f64) -> Self {
        Self {
            raw,
            floor,
            score: raw.max(floor),
            weight,
        }
    }

    fn zero(weight: f64) -> Self {
        Self {
            raw: 0.0,
            floor: 0.0,
            score: 0.0,
            weight,
        }
    }

    /// Contribution to the weighted sum.
    pub fn weighted(&self) -> f64 {
        self.score * self.weight
    }
}

/// Per-column measurements behind the consistency and validity dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnQuality {
    pub column: String,
    pub semantic_type: Option<SemanticType>,
    pub missing: usize,
    pub completeness: f64,
    pub consistency: f64,
    pub validity: f64,
}

/// Full score breakdown recorded in the diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub completeness: DimensionScore,
    pub uniqueness: DimensionScore,
    pub consistency: DimensionScore,
    pub validity: DimensionScore,
    /// Sum of the weighted dimensions, never above 1.0
    pub weighted_sum: f64,
    /// Whether the meaningful-names bonus was applied
    pub meaningful_names: bool,
    /// Whether the proper-types bonus was applied
    pub proper_types: bool,
    /// Total bonus added to the weighted sum
    pub bonus: f64,
    /// `clamp(weighted_sum + bonus, 0, ceiling)`
    pub final_score: f64,
    /// The table had no rows or no columns
    pub empty_table: bool,
    pub columns: Vec<ColumnQuality>,
}

impl ScoreBreakdown {
    pub fn quality_score(&self) -> QualityScore {
        QualityScore::new(self.final_score)
    }

    /// The dimensions with their names, in reporting order.
    pub fn dimensions(&self) -> [(&'static str, &DimensionScore); 4] {
        [
            ("completeness", &self.completeness),
            ("uniqueness", &self.uniqueness),
            ("consistency", &self.consistency),
            ("validity", &self.validity),
        ]
    }
}

/// Computes [`ScoreBreakdown`]s.
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    config: ScoringConfig,
}

impl QualityScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Scores a table. Tables with no rows or no columns score 0.
    #[instrument(skip_all, fields(rows = table.num_rows(), columns = table.num_columns()))]
    pub fn score(&self, table: &Table) -> ScoreBreakdown {
        let weights = self.config.weights;

        if table.is_empty() {
            info!("Scored empty table as 0");
            return ScoreBreakdown {
                completeness: DimensionScore::zero(weights.completeness),
                uniqueness: DimensionScore::zero(weights.uniqueness),
                consistency: DimensionScore::zero(weights.consistency),
                validity: DimensionScore::zero(weights.validity),
                weighted_sum: 0.0,
                meaningful_names: false,
                proper_types: false,
                bonus: 0.0,
                final_score: 0.0,
                empty_table: true,
                columns: Vec::new(),
            };
        }

        let columns: Vec<ColumnQuality> = table
            .columns()
            .iter()
            .map(|c| self.column_quality(c, table.num_rows()))
            .collect();

        let total_cells = table.num_cells() as f64;
        let missing: usize = columns.iter().map(|c| c.missing).sum();
        let completeness = DimensionScore::new(
            1.0 - missing as f64 / total_cells,
            self.config.completeness_floor,
            weights.completeness,
        );
        let uniqueness = DimensionScore::new(
            1.0 - table.duplicate_row_count() as f64 / table.num_rows() as f64,
            self.config.uniqueness_floor,
            weights.uniqueness,
        );
        let consistency = DimensionScore::new(
            mean(columns.iter().map(|c| c.consistency)),
            0.0,
            weights.consistency,
        );
        let validity = DimensionScore::new(
            mean(columns.iter().map(|c| c.validity)),
            0.0,
            weights.validity,
        );

        let weighted_sum = (completeness.weighted()
            + uniqueness.weighted()
            + consistency.weighted()
            + validity.weighted())
        .min(1.0);

        let meaningful_names = table.columns().iter().all(|c| {
            !patterns::is_placeholder_name(&c.name) && !patterns::is_synthesized_name(&c.name)
        });
        let proper_types = table
            .columns()
            .iter()
            .any(|c| c.semantic_type.is_some_and(|t| t != SemanticType::FreeText));

        let mut bonus = 0.0;
        if meaningful_names {
            bonus += self.config.meaningful_names_bonus;
        }
        if proper_types {
            bonus += self.config.proper_types_bonus;
        }
        let final_score = (weighted_sum + bonus).clamp(0.0, self.config.score_ceiling);

        debug!(
            completeness = completeness.raw,
            uniqueness = uniqueness.raw,
            consistency = consistency.raw,
            validity = validity.raw,
            "Measured quality dimensions"
        );
        info!(weighted_sum, bonus, final_score, "Scored table");

        ScoreBreakdown {
            completeness,
            uniqueness,
            consistency,
            validity,
            weighted_sum,
            meaningful_names,
            proper_types,
            bonus,
            final_score,
            empty_table: false,
            columns,
        }
    }

    fn column_quality(&self, column: &Column, rows: usize) -> ColumnQuality {
        let missing = column.missing_count();
        ColumnQuality {
            column: column.name.clone(),
            semantic_type: column.semantic_type,
            missing,
            completeness: if rows == 0 {
                0.0
            } else {
                1.0 - missing as f64 / rows as f64
            },
            consistency: consistency(column),
            validity: validity(column, &self.config.validity),
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        1.0
    } else {
        sum / count as f64
    }
}

/// Share of non-missing values conforming to the column type. Text columns
/// are measured by the share of their dominant value shape.
fn consistency(column: &Column) -> f64 {
    let present: Vec<&Value> = column.present().collect();
    if present.is_empty() {
        return 1.0;
    }

    match column.semantic_type {
        Some(ty) if !ty.is_textual() => {
            let conforming = present.iter().filter(|v| v.conforms_to(ty)).count();
            conforming as f64 / present.len() as f64
        }
        _ => {
            let mut shapes: HashMap<ValueShape, usize> = HashMap::new();
            for value in &present {
                let shape = patterns::shape_of(value).unwrap_or(ValueShape::Text);
                *shapes.entry(shape).or_insert(0) += 1;
            }
            let dominant = shapes.values().copied().max().unwrap_or(0);
            dominant as f64 / present.len() as f64
        }
    }
}

/// Share of non-missing values inside lenient plausibility bounds.
fn validity(column: &Column, bounds: &ValidityBounds) -> f64 {
    let present: Vec<&Value> = column.present().collect();
    if present.is_empty() {
        return 1.0;
    }

    let numbers: Vec<f64> = present.iter().filter_map(|v| v.as_f64()).collect();
    let fence = outlier_fence(&numbers, bounds);

    let valid = present
        .iter()
        .filter(|value| match value {
            Value::Integer(_) | Value::Float(_) => {
                let x = value.as_f64().unwrap_or(f64::NAN);
                x.is_finite()
                    && x.abs() <= bounds.max_abs_numeric
                    && fence.map_or(true, |(lo, hi)| (lo..=hi).contains(&x))
            }
            Value::Date(d) => (bounds.min_year..=bounds.max_year).contains(&d.year()),
            Value::DateTime(dt) => (bounds.min_year..=bounds.max_year).contains(&dt.year()),
            Value::Text(s) => s.chars().count() <= bounds.max_text_length,
            Value::Boolean(_) | Value::Missing => true,
        })
        .count();
    valid as f64 / present.len() as f64
}

/// Interquartile fence `[q1 - k*iqr, q3 + k*iqr]`, or `None` when there are
/// too few values or no spread.
fn outlier_fence(numbers: &[f64], bounds: &ValidityBounds) -> Option<(f64, f64)> {
    let mut sorted: Vec<f64> = numbers.iter().copied().filter(|x| x.is_finite()).collect();
    if sorted.is_empty() || sorted.len() < bounds.min_values_for_fence {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    if iqr <= 0.0 {
        return None;
    }
    let reach = bounds.iqr_multiplier * iqr;
    Some((q1 - reach, q3 + reach))
}

/// Linear-interpolated quantile of a sorted slice; 0.0 when empty.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn scorer() -> QualityScorer {
        QualityScorer::new(ScoringConfig::default())
    }

    fn date(y: i32) -> Value {
        Value::Date(NaiveDate::from_ymd_opt(y, 1, 1).unwrap())
    }

    #[test]
    fn test_clean_table_scores_maximum() {
        let table = Table::new(vec![
            Column::typed(
                "Name",
                SemanticType::FreeText,
                vec!["Ada".into(), "Grace".into(), "Linus".into()],
            ),
            Column::typed(
                "Sales",
                SemanticType::Integer,
                vec![1200i64.into(), 980i64.into(), 3000i64.into()],
            ),
            Column::typed(
                "Date",
                SemanticType::Temporal,
                vec![date(2023), date(2024), date(2024)],
            ),
        ])
        .unwrap();

        let breakdown = scorer().score(&table);
        assert!((breakdown.weighted_sum - 1.0).abs() < 1e-12);
        assert!(breakdown.meaningful_names);
        assert!(breakdown.proper_types);
        assert_eq!(breakdown.final_score, 1.0);
        assert_eq!(breakdown.quality_score().grade, QualityGrade::Excellent);
    }

    #[test]
    fn test_empty_table_scores_zero() {
        let breakdown = scorer().score(&Table::default());
        assert!(breakdown.empty_table);
        assert_eq!(breakdown.final_score, 0.0);

        let no_rows = Table::new(vec![Column::new("a", Vec::new())]).unwrap();
        assert!(scorer().score(&no_rows).empty_table);
    }

    #[test]
    fn test_completeness_floor() {
        let table = Table::new(vec![Column::typed(
            "Amount",
            SemanticType::Float,
            vec![Value::Float(1.0), Value::Missing, Value::Missing, Value::Missing],
        )])
        .unwrap();

        let breakdown = scorer().score(&table);
        assert_eq!(breakdown.completeness.raw, 0.25);
        assert_eq!(breakdown.completeness.score, 0.8);
    }

    #[test]
    fn test_uniqueness_floor_and_measurement() {
        let table = Table::new(vec![Column::typed(
            "Code",
            SemanticType::Categorical,
            vec!["a".into(), "a".into(), "a".into(), "b".into()],
        )])
        .unwrap();

        let breakdown = scorer().score(&table);
        assert_eq!(breakdown.uniqueness.raw, 0.5);
        assert_eq!(breakdown.uniqueness.score, 0.9);
    }

    #[test]
    fn test_synthesized_names_lose_bonus() {
        let table = Table::new(vec![Column::typed(
            "Column_0",
            SemanticType::FreeText,
            vec!["x".into(), "y".into()],
        )])
        .unwrap();

        let breakdown = scorer().score(&table);
        assert!(!breakdown.meaningful_names);
        assert!(!breakdown.proper_types);
        assert_eq!(breakdown.bonus, 0.0);
    }

    #[test]
    fn test_validity_flags_implausible_values() {
        let mut values: Vec<Value> = (1..=19).map(|i| Value::Integer(i * 10)).collect();
        values.push(Value::Integer(10_000_000));
        let numbers = Column::typed("Units", SemanticType::Integer, values);
        let years = Column::typed(
            "When",
            SemanticType::Temporal,
            (0..20).map(|i| if i == 0 { date(1850) } else { date(2020) }).collect(),
        );
        let table = Table::new(vec![numbers, years]).unwrap();

        let breakdown = scorer().score(&table);
        assert_eq!(breakdown.columns[0].validity, 0.95);
        assert_eq!(breakdown.columns[1].validity, 0.95);
    }

    #[test]
    fn test_text_consistency_uses_dominant_shape() {
        let column = Column::new(
            "mixed",
            vec!["1".into(), "2".into(), "3".into(), "abc".into()],
        );
        assert_eq!(consistency(&column), 0.75);

        let typed = Column::typed(
            "n",
            SemanticType::Integer,
            vec![Value::Integer(1), Value::text("x"), Value::Missing],
        );
        assert_eq!(consistency(&typed), 0.5);
    }

    #[test]
    fn test_score_respects_ceiling() {
        let config = ScoringConfig {
            score_ceiling: 0.9,
            ..ScoringConfig::default()
        };
        let table = Table::new(vec![Column::typed(
            "Units",
            SemanticType::Integer,
            vec![Value::Integer(1), Value::Integer(2)],
        )])
        .unwrap();
        assert_eq!(QualityScorer::new(config).score(&table).final_score, 0.9);
    }

    #[test]
    fn test_grades() {
        assert_eq!(QualityGrade::from_score(0.995), QualityGrade::Excellent);
        assert_eq!(QualityGrade::from_score(0.95), QualityGrade::High);
        assert_eq!(QualityGrade::from_score(0.7), QualityGrade::Good);
        assert_eq!(QualityGrade::from_score(0.5), QualityGrade::NeedsReview);
        assert_eq!(QualityScore::new(0.975).to_string(), "97.5% (High)");
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.5), 2.5);
        assert_eq!(quantile(&sorted, 0.0), 1.0);
        assert_eq!(quantile(&sorted, 1.0), 4.0);
    }

    #[test]
    fn test_zero_fence_minimum_scores_text_columns() {
        let mut config = ScoringConfig::default();
        config.validity.min_values_for_fence = 0;
        let table = Table::new(vec![
            Column::typed(
                "Name",
                SemanticType::FreeText,
                vec!["Ada".into(), "Grace".into()],
            ),
            Column::typed(
                "City",
                SemanticType::FreeText,
                vec!["London".into(), "Arlington".into()],
            ),
        ])
        .unwrap();

        let breakdown = QualityScorer::new(config).score(&table);
        assert_eq!(breakdown.validity.raw, 1.0);
        assert!(breakdown.final_score <= 1.0);
        assert_eq!(outlier_fence(&[], &ValidityBounds::default()), None);
        assert_eq!(quantile(&[], 0.5), 0.0);
    }
}
