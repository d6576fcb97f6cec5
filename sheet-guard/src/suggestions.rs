//! Rule-based cleaning suggestions for a cleaned table.
//!
//! The pipeline never drops columns or guesses at semantic repairs on its
//! own. Instead, [`SuggestionEngine`] inspects the cleaned table and lists
//! follow-ups a person may want to act on: mostly-empty columns, constant
//! columns, dates stored as text and retained duplicates.
//!
//! ```rust
//! use sheet_guard::core::{Column, Table, Value};
//! use sheet_guard::suggestions::{SuggestionEngine, SuggestionKind};
//!
//! let table = Table::new(vec![Column::new(
//!     "notes",
//!     vec![Value::Missing, Value::Missing, Value::text("call back")],
//! )])
//! .unwrap();
//!
//! let suggestions = SuggestionEngine::default().suggest(&table, None);
//! assert_eq!(suggestions[0].kind, SuggestionKind::HighNulls);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::{Column, DuplicateAction, DuplicateReport, Table};

/// What a suggestion is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    /// More than half of the column is missing
    HighNulls,
    /// More than a tenth of the column is missing
    ModerateNulls,
    /// The column holds a single distinct value
    ConstantColumn,
    /// A text column whose name suggests it should hold dates
    PotentialDate,
    /// Duplicate rows were kept
    Duplicates,
}

/// How urgently a suggestion should be looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSeverity {
    High,
    Moderate,
    Low,
}

/// A single follow-up recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningSuggestion {
    pub kind: SuggestionKind,
    pub severity: SuggestionSeverity,
    /// Column the suggestion applies to, `None` for table-level suggestions
    pub column: Option<String>,
    /// Human-readable explanation
    pub message: String,
}

/// A per-column suggestion rule.
pub trait SuggestionRule: Send + Sync {
    /// Apply this rule to one column.
    fn apply(&self, column: &Column) -> Vec<CleaningSuggestion>;

    /// Get a human-readable name for this rule
    fn name(&self) -> &str;
}

/// Flags columns with many missing values.
#[derive(Debug, Clone)]
pub struct MissingValuesRule {
    high_threshold: f64,
    moderate_threshold: f64,
}

impl MissingValuesRule {
    pub fn new() -> Self {
        Self {
            high_threshold: 0.5,
            moderate_threshold: 0.1,
        }
    }

    pub fn with_thresholds(high: f64, moderate: f64) -> Self {
        Self {
            high_threshold: high.clamp(0.0, 1.0),
            moderate_threshold: moderate.clamp(0.0, 1.0),
        }
    }
}

impl Default for MissingValuesRule {
    fn default() -> Self {
        Self::new()
    }
}

impl SuggestionRule for MissingValuesRule {
    fn apply(&self, column: &Column) -> Vec<CleaningSuggestion> {
        if column.is_empty() {
            return Vec::new();
        }
        let share = column.missing_count() as f64 / column.len() as f64;

        let (kind, severity, action) = if share > self.high_threshold {
            (
                SuggestionKind::HighNulls,
                SuggestionSeverity::High,
                "consider dropping the column or filling it",
            )
        } else if share > self.moderate_threshold {
            (
                SuggestionKind::ModerateNulls,
                SuggestionSeverity::Moderate,
                "consider filling missing values",
            )
        } else {
            return Vec::new();
        };

        vec![CleaningSuggestion {
            kind,
            severity,
            column: Some(column.name.clone()),
            message: format!(
                "'{}' is {:.1}% missing; {action}",
                column.name,
                share * 100.0
            ),
        }]
    }

    fn name(&self) -> &str {
        "MissingValuesRule"
    }
}

/// Flags columns holding a single distinct value.
#[derive(Debug, Clone, Default)]
pub struct ConstantColumnRule;

impl SuggestionRule for ConstantColumnRule {
    fn apply(&self, column: &Column) -> Vec<CleaningSuggestion> {
        if column.len() < 2 || column.distinct_count() != 1 {
            return Vec::new();
        }
        vec![CleaningSuggestion {
            kind: SuggestionKind::ConstantColumn,
            severity: SuggestionSeverity::Low,
            column: Some(column.name.clone()),
            message: format!(
                "'{}' has a single distinct value and carries no information",
                column.name
            ),
        }]
    }

    fn name(&self) -> &str {
        "ConstantColumnRule"
    }
}

/// Flags text columns named like dates.
#[derive(Debug, Clone, Default)]
pub struct PotentialDateRule;

const DATE_NAME_HINTS: &[&str] = &["date", "time", "created", "updated"];

impl SuggestionRule for PotentialDateRule {
    fn apply(&self, column: &Column) -> Vec<CleaningSuggestion> {
        let is_text = column.semantic_type.map_or(true, |t| t.is_textual());
        let lowered = column.name.to_lowercase();
        if !is_text || !DATE_NAME_HINTS.iter().any(|hint| lowered.contains(hint)) {
            return Vec::new();
        }
        vec![CleaningSuggestion {
            kind: SuggestionKind::PotentialDate,
            severity: SuggestionSeverity::Moderate,
            column: Some(column.name.clone()),
            message: format!(
                "'{}' looks like a date column but is stored as text; check its format",
                column.name
            ),
        }]
    }

    fn name(&self) -> &str {
        "PotentialDateRule"
    }
}

/// Runs suggestion rules over every column of a table.
pub struct SuggestionEngine {
    rules: Vec<Box<dyn SuggestionRule>>,
}

impl SuggestionEngine {
    /// Creates an engine without rules.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a suggestion rule to the engine
    pub fn add_rule(mut self, rule: Box<dyn SuggestionRule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Generates suggestions for the table, most severe first.
    ///
    /// `duplicates` is the duplicate resolver's report for the run, if any.
    #[instrument(skip_all, fields(columns = table.num_columns()))]
    pub fn suggest(
        &self,
        table: &Table,
        duplicates: Option<&DuplicateReport>,
    ) -> Vec<CleaningSuggestion> {
        let mut suggestions = Vec::new();

        for column in table.columns() {
            for rule in &self.rules {
                let found = rule.apply(column);
                if !found.is_empty() {
                    debug!(
                        rule = rule.name(),
                        column = %column.name,
                        count = found.len(),
                        "Applied suggestion rule"
                    );
                }
                suggestions.extend(found);
            }
        }

        if let Some(report) = duplicates.filter(|r| r.action == DuplicateAction::Retained) {
            suggestions.push(CleaningSuggestion {
                kind: SuggestionKind::Duplicates,
                severity: SuggestionSeverity::Moderate,
                column: None,
                message: format!(
                    "{} duplicate rows were kept ({}); review whether they are repeated observations",
                    report.duplicate_rows, report.reason
                ),
            });
        }

        suggestions.sort_by_key(|s| s.severity);
        suggestions
    }
}

impl Default for SuggestionEngine {
    /// Engine with the missing-values, constant-column and potential-date
    /// rules.
    fn default() -> Self {
        Self::new()
            .add_rule(Box::new(MissingValuesRule::new()))
            .add_rule(Box::new(ConstantColumnRule))
            .add_rule(Box::new(PotentialDateRule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SemanticType, Value};

    fn column(name: &str, values: Vec<Value>) -> Column {
        Column::new(name, values)
    }

    #[test]
    fn test_missing_value_thresholds() {
        let rule = MissingValuesRule::new();

        let high = column("a", vec![Value::Missing, Value::Missing, Value::Integer(1)]);
        assert_eq!(rule.apply(&high)[0].kind, SuggestionKind::HighNulls);

        let mut values = vec![Value::Integer(1); 8];
        values.extend([Value::Missing, Value::Missing]);
        let moderate = column("b", values);
        let found = rule.apply(&moderate);
        assert_eq!(found[0].kind, SuggestionKind::ModerateNulls);
        assert!(found[0].message.contains("20.0%"));

        let fine = column("c", vec![Value::Integer(1); 10]);
        assert!(rule.apply(&fine).is_empty());
    }

    #[test]
    fn test_constant_column() {
        let constant = column("status", vec![Value::text("ok"); 3]);
        assert_eq!(
            ConstantColumnRule.apply(&constant)[0].kind,
            SuggestionKind::ConstantColumn
        );
        assert!(ConstantColumnRule
            .apply(&column("single", vec![Value::text("ok")]))
            .is_empty());
    }

    #[test]
    fn test_potential_date_only_for_text() {
        let text = Column::typed(
            "Created At",
            SemanticType::FreeText,
            vec![Value::text("last tuesday")],
        );
        assert_eq!(
            PotentialDateRule.apply(&text)[0].kind,
            SuggestionKind::PotentialDate
        );

        let typed = Column::typed("Created At", SemanticType::Temporal, vec![Value::Missing]);
        assert!(PotentialDateRule.apply(&typed).is_empty());
    }

    #[test]
    fn test_retained_duplicates_suggestion_and_ordering() {
        let table = Table::new(vec![column(
            "event",
            vec![Value::text("x"), Value::Missing, Value::Missing],
        )])
        .unwrap();
        let report = DuplicateReport {
            total_rows: 3,
            duplicate_rows: 1,
            ratio: 1.0 / 3.0,
            ceiling: 0.2,
            action: DuplicateAction::Retained,
            reason: "retained, ratio=0.33, above ceiling 0.20".to_string(),
        };

        // "x" is the only present value, so the column also reads as constant
        let suggestions = SuggestionEngine::default().suggest(&table, Some(&report));
        let kinds: Vec<_> = suggestions.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SuggestionKind::HighNulls,
                SuggestionKind::Duplicates,
                SuggestionKind::ConstantColumn,
            ]
        );
        assert_eq!(suggestions[0].severity, SuggestionSeverity::High);
        assert_eq!(suggestions[1].column, None);
        assert_eq!(suggestions[2].severity, SuggestionSeverity::Low);
    }
}
