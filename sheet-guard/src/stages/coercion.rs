//! Semantic type inference and conversion.
//!
//! For every column without a semantic type, the coercer samples a bounded
//! prefix of non-missing values and runs the [`TYPE_DETECTORS`] in order:
//! boolean, numeric, temporal. The first detector whose coverage reaches the
//! configured threshold converts the whole column. Columns no detector claims
//! stay text and are classified as categorical or free text.
//!
//! Cells that fail conversion in a converted column become
//! [`Value::Missing`] and are counted in the diagnostics; the stage never
//! fails on a bad cell.

use std::collections::HashSet;

use tracing::{debug, info, instrument};

use super::PipelineStage;
use crate::config::{CoercionConfig, NullTokens};
use crate::core::{Column, DiagnosticsBuilder, SemanticType, Table, TypeConversion, Value};
use crate::patterns::{self, ParsedNumber};

/// One entry of the type-detection strategy table.
#[derive(Debug, Clone, Copy)]
pub struct TypeDetector {
    pub name: &'static str,
    /// Returns the type this detector would assign and the share of the
    /// sample it recognizes
    pub evaluate: fn(&[&Value]) -> (SemanticType, f64),
    /// Converts one non-missing cell to the target type
    pub convert: fn(&Value, SemanticType) -> Option<Value>,
}

/// Type detectors in evaluation order.
pub const TYPE_DETECTORS: &[TypeDetector] = &[
    TypeDetector {
        name: "boolean",
        evaluate: |sample| {
            let matched = sample.iter().filter(|v| bool_of(v).is_some()).count();
            (SemanticType::Boolean, ratio(matched, sample.len()))
        },
        convert: |value, _| bool_of(value).map(Value::Boolean),
    },
    TypeDetector {
        name: "numeric",
        evaluate: evaluate_numeric,
        convert: convert_numeric,
    },
    TypeDetector {
        name: "temporal",
        evaluate: |sample| {
            let matched = sample.iter().filter(|v| temporal_of(v).is_some()).count();
            (SemanticType::Temporal, ratio(matched, sample.len()))
        },
        convert: |value, _| temporal_of(value),
    },
];

fn ratio(matched: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        matched as f64 / total as f64
    }
}

fn bool_of(value: &Value) -> Option<bool> {
    match value {
        Value::Text(s) => patterns::parse_bool(s),
        Value::Boolean(b) => Some(*b),
        Value::Integer(0) => Some(false),
        Value::Integer(1) => Some(true),
        _ => None,
    }
}

fn number_of(value: &Value) -> Option<ParsedNumber> {
    match value {
        Value::Text(s) => patterns::parse_number(s),
        Value::Integer(i) => Some(ParsedNumber {
            value: *i as f64,
            integral_literal: true,
            has_currency: false,
        }),
        Value::Float(f) if f.is_finite() => Some(ParsedNumber {
            value: *f,
            integral_literal: false,
            has_currency: false,
        }),
        _ => None,
    }
}

fn temporal_of(value: &Value) -> Option<Value> {
    match value {
        Value::Text(s) => patterns::parse_temporal(s),
        Value::Date(_) | Value::DateTime(_) => Some(value.clone()),
        _ => None,
    }
}

fn evaluate_numeric(sample: &[&Value]) -> (SemanticType, f64) {
    let parsed: Vec<ParsedNumber> = sample.iter().filter_map(|v| number_of(v)).collect();
    let with_currency = parsed.iter().filter(|n| n.has_currency).count();

    let semantic_type = if with_currency * 2 > parsed.len() {
        SemanticType::Currency
    } else if parsed.iter().all(|n| n.integral_literal) {
        SemanticType::Integer
    } else {
        SemanticType::Float
    };
    (semantic_type, ratio(parsed.len(), sample.len()))
}

fn convert_numeric(value: &Value, target: SemanticType) -> Option<Value> {
    match (target, value) {
        (SemanticType::Integer, Value::Integer(i)) => Some(Value::Integer(*i)),
        (SemanticType::Integer, _) => number_of(value).map(ParsedNumber::to_value),
        _ => number_of(value).map(|n| Value::Float(n.value)),
    }
}

/// Outcome of type inference for one column.
#[derive(Debug, Clone, Copy)]
pub struct Inference {
    pub semantic_type: SemanticType,
    /// Detector that claimed the column, `None` for text columns
    pub detector: Option<&'static TypeDetector>,
    pub coverage: f64,
    pub sampled: usize,
}

/// Infers column types and converts cells.
#[derive(Debug, Clone)]
pub struct TypeCoercer {
    config: CoercionConfig,
    null_tokens: NullTokens,
}

impl TypeCoercer {
    pub fn new(config: CoercionConfig, null_tokens: NullTokens) -> Self {
        Self {
            config,
            null_tokens,
        }
    }

    fn is_null(&self, value: &Value) -> bool {
        match value {
            Value::Missing => true,
            Value::Text(s) => self.null_tokens.is_null(s),
            _ => false,
        }
    }

    /// Infers the semantic type of a column without modifying it.
    pub fn infer(&self, column: &Column) -> Inference {
        let sample: Vec<&Value> = column
            .values
            .iter()
            .filter(|v| !self.is_null(v))
            .take(self.config.sample_size)
            .collect();

        if !sample.is_empty() {
            for detector in TYPE_DETECTORS {
                let (semantic_type, coverage) = (detector.evaluate)(&sample);
                debug!(
                    column = %column.name,
                    detector = detector.name,
                    coverage,
                    "Evaluated type detector"
                );
                if coverage >= self.config.coverage_threshold {
                    return Inference {
                        semantic_type,
                        detector: Some(detector),
                        coverage,
                        sampled: sample.len(),
                    };
                }
            }
        }

        Inference {
            semantic_type: self.classify_text(&sample),
            detector: None,
            coverage: 1.0,
            sampled: sample.len(),
        }
    }

    /// Categorical when the sample repeats a handful of values, free text
    /// otherwise.
    fn classify_text(&self, sample: &[&Value]) -> SemanticType {
        let distinct: HashSet<String> = sample
            .iter()
            .map(|v| v.to_string().trim().to_string())
            .collect();
        let distinct_ratio = ratio(distinct.len(), sample.len());

        if distinct.len() > 1
            && distinct.len() < self.config.categorical_max_cardinality
            && distinct_ratio < self.config.categorical_max_ratio
        {
            SemanticType::Categorical
        } else {
            SemanticType::FreeText
        }
    }

    /// Infers and applies the type of one untyped column.
    pub fn coerce_column(&self, column: &mut Column) -> TypeConversion {
        let inference = self.infer(column);
        let mut semantic_type = inference.semantic_type;
        let mut converted = 0;
        let mut failed = 0;

        if let Some(detector) = inference.detector {
            for value in column.values.iter_mut() {
                if self.is_null(value) {
                    *value = Value::Missing;
                    continue;
                }
                match (detector.convert)(value, semantic_type) {
                    Some(typed) => {
                        *value = typed;
                        converted += 1;
                    }
                    None => {
                        *value = Value::Missing;
                        failed += 1;
                    }
                }
            }

            // Fractional values outside the sample widen the column.
            if semantic_type == SemanticType::Integer
                && column.values.iter().any(|v| matches!(v, Value::Float(_)))
            {
                semantic_type = SemanticType::Float;
                for value in column.values.iter_mut() {
                    if let Value::Integer(i) = value {
                        *value = Value::Float(*i as f64);
                    }
                }
            }
        }

        column.semantic_type = Some(semantic_type);
        TypeConversion {
            column: column.name.clone(),
            semantic_type,
            detector: inference.detector.map(|d| d.name.to_string()),
            coverage: inference.coverage,
            sampled: inference.sampled,
            converted,
            failed,
        }
    }
}

impl PipelineStage for TypeCoercer {
    fn name(&self) -> &'static str {
        "coercion"
    }

    #[instrument(skip_all, fields(rows = table.num_rows(), columns = table.num_columns()))]
    fn apply(&self, mut table: Table, diagnostics: &mut DiagnosticsBuilder) -> Table {
        let mut converted_columns = 0;
        let mut failed_cells = 0;

        for column in table.columns_mut() {
            if column.semantic_type.is_some() {
                continue;
            }
            let conversion = self.coerce_column(column);
            debug!(
                column = %conversion.column,
                semantic_type = %conversion.semantic_type,
                coverage = conversion.coverage,
                converted = conversion.converted,
                failed = conversion.failed,
                "Assigned column type"
            );
            if conversion.is_conversion() {
                converted_columns += 1;
            }
            failed_cells += conversion.failed;
            diagnostics.record_conversion(conversion);
        }

        info!(converted_columns, failed_cells, "Coerced column types");
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizerConfig;
    use chrono::NaiveDate;

    fn coercer() -> TypeCoercer {
        TypeCoercer::new(
            CoercionConfig::default(),
            NormalizerConfig::default().null_token_set(),
        )
    }

    fn coerce(values: &[&str]) -> (Column, TypeConversion) {
        let mut column = Column::from_strs("c", values);
        let conversion = coercer().coerce_column(&mut column);
        (column, conversion)
    }

    #[test]
    fn test_currency_with_null_token() {
        let (column, conversion) = coerce(&["$1,200.50", "$980.00", "N/A", "$3,000"]);

        assert_eq!(column.semantic_type, Some(SemanticType::Currency));
        assert_eq!(
            column.values,
            vec![
                Value::Float(1200.5),
                Value::Float(980.0),
                Value::Missing,
                Value::Float(3000.0)
            ]
        );
        assert_eq!(column.missing_count(), 1);
        assert_eq!(conversion.converted, 3);
        assert_eq!(conversion.failed, 0);
        assert_eq!(conversion.coverage, 1.0);
    }

    #[test]
    fn test_integer_column() {
        let (column, conversion) = coerce(&["10", " 20 ", "1,000", "-5"]);
        assert_eq!(column.semantic_type, Some(SemanticType::Integer));
        assert_eq!(column.values[2], Value::Integer(1000));
        assert_eq!(conversion.detector.as_deref(), Some("numeric"));
    }

    #[test]
    fn test_float_column_widens_integers() {
        let (column, _) = coerce(&["1", "2.5", "3"]);
        assert_eq!(column.semantic_type, Some(SemanticType::Float));
        assert_eq!(column.values[0], Value::Float(1.0));
    }

    #[test]
    fn test_integer_widened_by_value_outside_sample() {
        let mut column = Column::from_strs("c", &["1", "2", "3", "4.5"]);
        let coercer = TypeCoercer::new(
            CoercionConfig {
                sample_size: 2,
                ..CoercionConfig::default()
            },
            NormalizerConfig::default().null_token_set(),
        );
        let conversion = coercer.coerce_column(&mut column);

        assert_eq!(conversion.semantic_type, SemanticType::Float);
        assert_eq!(column.values[3], Value::Float(4.5));
        assert!(column.values.iter().all(|v| matches!(v, Value::Float(_))));
    }

    #[test]
    fn test_boolean_before_numeric() {
        let (column, _) = coerce(&["1", "0", "1", "0"]);
        assert_eq!(column.semantic_type, Some(SemanticType::Boolean));

        let (column, _) = coerce(&["Yes", "no", "Y", "N", "on"]);
        assert_eq!(column.semantic_type, Some(SemanticType::Boolean));
        assert_eq!(column.values[0], Value::Boolean(true));
    }

    #[test]
    fn test_temporal_column() {
        let (column, _) = coerce(&["2024-01-05", "01/06/2024", "Jan 07, 2024"]);
        assert_eq!(column.semantic_type, Some(SemanticType::Temporal));
        assert_eq!(
            column.values[1],
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 6).unwrap())
        );
    }

    #[test]
    fn test_coverage_threshold_is_inclusive() {
        let (column, conversion) = coerce(&["1", "2", "3", "4", "oops"]);
        assert_eq!(column.semantic_type, Some(SemanticType::Integer));
        assert_eq!(conversion.failed, 1);
        assert_eq!(column.values[4], Value::Missing);
    }

    #[test]
    fn test_below_threshold_stays_text() {
        let (column, conversion) = coerce(&["1", "2", "three", "four", "5"]);
        assert!(column.semantic_type.is_some_and(|t| t.is_textual()));
        assert_eq!(column.values[2], Value::text("three"));
        assert!(!conversion.is_conversion());
        assert_eq!(conversion.converted, 0);
    }

    #[test]
    fn test_categorical_and_free_text() {
        let (column, _) = coerce(&[
            "north", "south", "north", "south", "north", "east", "north", "south",
        ]);
        assert_eq!(column.semantic_type, Some(SemanticType::Categorical));

        let (column, _) = coerce(&["Ada", "Grace", "Linus"]);
        assert_eq!(column.semantic_type, Some(SemanticType::FreeText));

        let (column, _) = coerce(&["same", "same", "same"]);
        assert_eq!(column.semantic_type, Some(SemanticType::FreeText));
    }

    #[test]
    fn test_percent_values_are_not_numeric() {
        let (column, _) = coerce(&["10%", "20%", "30%"]);
        assert!(column.semantic_type.is_some_and(|t| t.is_textual()));
    }

    #[test]
    fn test_typed_columns_are_skipped() {
        let table = Table::new(vec![Column::typed(
            "flag",
            SemanticType::FreeText,
            vec![Value::text("1"), Value::text("2")],
        )])
        .unwrap();
        let mut diagnostics = DiagnosticsBuilder::new(&table);
        let out = coercer().apply(table.clone(), &mut diagnostics);

        assert_eq!(out, table);
        assert!(diagnostics.finish(&out).conversions.is_empty());
    }

    #[test]
    fn test_all_missing_column_is_free_text() {
        let (column, conversion) = coerce(&["", "N/A"]);
        assert_eq!(column.semantic_type, Some(SemanticType::FreeText));
        assert_eq!(conversion.sampled, 0);
    }
}
