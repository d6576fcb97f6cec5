//! Header detection and column-name repair.
//!
//! Readers that do not know whether a sheet has a header hand over every row
//! as data under positional names (`"0"`, `"1"`, ...). The resolver decides
//! whether row 0 is really a header, then makes sure every column ends up
//! with a unique, meaningful name.
//!
//! Both decisions are driven by ordered strategy tables:
//!
//! - [`HEADER_RULES`] classify row 0. The first rule that applies wins; when
//!   none applies the [`AmbiguousHeaderPolicy`] decides.
//! - [`NAME_RULES`] derive a descriptive name for a placeholder column from a
//!   sample of its values. The first rule reaching the coverage threshold
//!   wins; otherwise the column becomes `Column_<index>`.
//!
//! # Example
//!
//! ```rust
//! use sheet_guard::config::PipelineConfig;
//! use sheet_guard::core::{DiagnosticsBuilder, Table};
//! use sheet_guard::stages::{HeaderResolver, PipelineStage};
//!
//! let raw = Table::from_rows(vec![
//!     vec!["Region".to_string(), "Units".to_string()],
//!     vec!["North".to_string(), "12".to_string()],
//!     vec!["South".to_string(), "7".to_string()],
//! ])
//! .unwrap();
//!
//! let config = PipelineConfig::default();
//! let resolver = HeaderResolver::new(config.header.clone(), config.normalizer.null_token_set());
//! let mut diagnostics = DiagnosticsBuilder::new(&raw);
//! let table = resolver.apply(raw, &mut diagnostics);
//!
//! assert_eq!(table.column_names(), vec!["Region", "Units"]);
//! assert_eq!(table.num_rows(), 2);
//! ```

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use super::PipelineStage;
use crate::config::{AmbiguousHeaderPolicy, HeaderConfig, NullTokens};
use crate::core::{
    Column, DiagnosticsBuilder, HeaderAction, HeaderDecision, RenameReason, Table, Value,
};
use crate::patterns::{self, ValueShape};

/// Classification of row 0 produced by a header rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowVerdict {
    Header,
    Data,
}

/// Summary of row 0 against the rows below it.
///
/// Counts only consider non-blank row-0 cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderProbe {
    /// Number of columns
    pub width: usize,
    /// Row-0 cells that are not blank or null tokens
    pub non_blank: usize,
    /// Row-0 cells shaped like numbers, booleans or dates
    pub typed_cells: usize,
    /// Row-0 cells shaped like plain text
    pub text_cells: usize,
    /// Text cells containing a header keyword
    pub keyword_cells: usize,
    /// Text cells sitting on top of a column whose data is mostly typed
    pub text_over_typed: usize,
    /// Text cells that reappear verbatim further down their column
    pub recurring_cells: usize,
    /// Whether any row exists below row 0; keywords alone do not decide a
    /// lone row
    pub has_data_rows: bool,
}

impl HeaderProbe {
    /// Builds the probe from the first `probe_rows + 1` rows of the table.
    pub fn from_table(table: &Table, probe_rows: usize, null_tokens: &NullTokens) -> Self {
        let mut probe = HeaderProbe {
            width: table.num_columns(),
            has_data_rows: table.num_rows() > 1,
            ..Self::default()
        };

        for column in table.columns() {
            let Some(first) = column.values.first() else {
                continue;
            };
            if is_blank(first, null_tokens) {
                continue;
            }
            probe.non_blank += 1;

            let shape = patterns::shape_of(first).unwrap_or(ValueShape::Text);
            if shape.is_typed() {
                probe.typed_cells += 1;
                continue;
            }
            probe.text_cells += 1;

            let first_text = first.as_text().map(str::trim).unwrap_or_default();
            if patterns::contains_header_keyword(first_text) {
                probe.keyword_cells += 1;
            }

            let below: Vec<&Value> = column
                .values
                .iter()
                .skip(1)
                .filter(|v| !is_blank(v, null_tokens))
                .take(probe_rows)
                .collect();
            let typed_below = below
                .iter()
                .filter(|v| patterns::shape_of(v).is_some_and(|s| s.is_typed()))
                .count();
            if !below.is_empty() && typed_below * 2 > below.len() {
                probe.text_over_typed += 1;
            }
            if below
                .iter()
                .any(|v| v.as_text().map(str::trim) == Some(first_text))
            {
                probe.recurring_cells += 1;
            }
        }

        probe
    }

    /// More than half of the non-blank row-0 cells are plain text.
    pub fn text_majority(&self) -> bool {
        self.text_cells * 2 > self.non_blank
    }
}

/// One entry of the header strategy table.
#[derive(Debug, Clone, Copy)]
pub struct HeaderRule {
    pub name: &'static str,
    pub applies: fn(&HeaderProbe) -> bool,
    pub verdict: RowVerdict,
}

/// Header rules in evaluation order.
pub const HEADER_RULES: &[HeaderRule] = &[
    HeaderRule {
        name: "empty_first_row",
        applies: |p| p.non_blank == 0,
        verdict: RowVerdict::Data,
    },
    HeaderRule {
        name: "numeric_majority",
        applies: |p| p.typed_cells * 2 > p.non_blank,
        verdict: RowVerdict::Data,
    },
    HeaderRule {
        name: "distinct_from_data",
        applies: |p| p.text_majority() && p.text_over_typed * 2 > p.non_blank,
        verdict: RowVerdict::Header,
    },
    HeaderRule {
        name: "header_keywords",
        applies: |p| p.has_data_rows && p.text_majority() && p.keyword_cells * 2 >= p.non_blank,
        verdict: RowVerdict::Header,
    },
    HeaderRule {
        name: "values_recur_in_data",
        applies: |p| p.text_majority() && p.recurring_cells * 2 > p.text_cells,
        verdict: RowVerdict::Data,
    },
];

/// One entry of the placeholder-naming strategy table.
#[derive(Debug, Clone, Copy)]
pub struct NameRule {
    pub name: &'static str,
    /// Prefix of the generated name, e.g. `Date` for `Date_Column_3`
    pub prefix: &'static str,
    /// Share of the sample matching the rule
    pub coverage: fn(&[&Value]) -> f64,
}

fn share(sample: &[&Value], matches: impl Fn(&Value) -> bool) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    sample.iter().filter(|v| matches(**v)).count() as f64 / sample.len() as f64
}

/// Name rules in evaluation order.
pub const NAME_RULES: &[NameRule] = &[
    NameRule {
        name: "boolean_words",
        prefix: "Flag",
        coverage: |sample| {
            share(sample, |v| match v {
                Value::Boolean(_) => true,
                Value::Text(s) => patterns::is_boolean_word(s),
                _ => false,
            })
        },
    },
    NameRule {
        name: "currency_amounts",
        prefix: "Amount",
        coverage: |sample| {
            share(sample, |v| {
                v.as_text().is_some_and(|s| {
                    patterns::parse_number(s).is_some_and(|n| n.has_currency)
                })
            })
        },
    },
    NameRule {
        name: "date_like",
        prefix: "Date",
        coverage: |sample| {
            share(sample, |v| match v {
                Value::Date(_) | Value::DateTime(_) => true,
                Value::Text(s) => patterns::parse_temporal(s).is_some(),
                _ => false,
            })
        },
    },
    NameRule {
        name: "id_codes",
        prefix: "ID",
        coverage: |sample| {
            let distinct: HashSet<_> = sample.iter().map(|v| v.key()).collect();
            if distinct.len() != sample.len() {
                return 0.0;
            }
            share(sample, |v| v.as_text().is_some_and(patterns::is_id_code))
        },
    },
];

fn is_blank(value: &Value, null_tokens: &NullTokens) -> bool {
    match value {
        Value::Missing => true,
        Value::Text(s) => null_tokens.is_null(s),
        _ => false,
    }
}

/// Detects header rows and repairs column names.
#[derive(Debug, Clone)]
pub struct HeaderResolver {
    config: HeaderConfig,
    null_tokens: NullTokens,
}

impl HeaderResolver {
    pub fn new(config: HeaderConfig, null_tokens: NullTokens) -> Self {
        Self {
            config,
            null_tokens,
        }
    }

    /// Classifies row 0. Returns the decision and the name of the deciding
    /// rule, `None` when the ambiguity policy decided.
    pub fn detect(&self, table: &Table) -> (HeaderDecision, Option<&'static str>) {
        if table.num_rows() == 0 {
            return (HeaderDecision::NoRows, None);
        }

        let probe = HeaderProbe::from_table(table, self.config.probe_rows, &self.null_tokens);
        debug!(?probe, "Probed first row");

        match HEADER_RULES.iter().find(|rule| (rule.applies)(&probe)) {
            Some(rule) => {
                let decision = match rule.verdict {
                    RowVerdict::Header => HeaderDecision::Header,
                    RowVerdict::Data => HeaderDecision::Data,
                };
                (decision, Some(rule.name))
            }
            None => {
                let decision = match self.config.ambiguous_policy {
                    AmbiguousHeaderPolicy::TreatAsHeader => HeaderDecision::AmbiguousAsHeader,
                    AmbiguousHeaderPolicy::TreatAsData => HeaderDecision::AmbiguousAsData,
                };
                (decision, None)
            }
        }
    }

    /// Derives a name for a placeholder column from its content.
    pub fn infer_name(&self, column: &Column, index: usize) -> (String, RenameReason) {
        let sample: Vec<&Value> = column
            .values
            .iter()
            .filter(|v| !is_blank(v, &self.null_tokens))
            .take(self.config.name_sample_size)
            .collect();

        if !sample.is_empty() {
            for rule in NAME_RULES {
                let coverage = (rule.coverage)(&sample);
                if coverage >= self.config.name_inference_coverage {
                    return (
                        format!("{}_Column_{index}", rule.prefix),
                        RenameReason::ContentInferred {
                            rule: rule.name.to_string(),
                        },
                    );
                }
            }
        }
        (format!("Column_{index}"), RenameReason::PositionalFallback)
    }

    fn consume_header_row(&self, table: &mut Table, diagnostics: &mut DiagnosticsBuilder) {
        let Some(header_cells) = table.take_first_row() else {
            return;
        };
        for (index, (column, cell)) in table.columns_mut().iter_mut().zip(header_cells).enumerate()
        {
            if is_blank(&cell, &self.null_tokens) {
                continue;
            }
            let name = patterns::clean_header_name(&cell.to_string(), self.config.max_name_length);
            if patterns::is_placeholder_name(&name) || name == column.name {
                continue;
            }
            diagnostics.record_rename(HeaderAction {
                column_index: index,
                from: std::mem::replace(&mut column.name, name.clone()),
                to: name,
                reason: RenameReason::HeaderRow,
            });
        }
    }

    fn repair_placeholders(&self, table: &mut Table, diagnostics: &mut DiagnosticsBuilder) {
        for (index, column) in table.columns_mut().iter_mut().enumerate() {
            if !patterns::is_placeholder_name(&column.name) {
                continue;
            }
            let (name, reason) = self.infer_name(column, index);
            debug!(column_index = index, from = %column.name, to = %name, "Repaired placeholder name");
            diagnostics.record_rename(HeaderAction {
                column_index: index,
                from: std::mem::replace(&mut column.name, name.clone()),
                to: name,
                reason,
            });
        }
    }

    fn disambiguate(&self, table: &mut Table, diagnostics: &mut DiagnosticsBuilder) {
        let reserved: HashSet<String> = table.columns().iter().map(|c| c.name.clone()).collect();
        let mut assigned: HashSet<String> = HashSet::with_capacity(reserved.len());

        for (index, column) in table.columns_mut().iter_mut().enumerate() {
            if assigned.insert(column.name.clone()) {
                continue;
            }
            let mut suffix = 1;
            let name = loop {
                let candidate = format!("{}_{suffix}", column.name);
                if !reserved.contains(&candidate) && !assigned.contains(&candidate) {
                    break candidate;
                }
                suffix += 1;
            };
            assigned.insert(name.clone());
            diagnostics.record_rename(HeaderAction {
                column_index: index,
                from: std::mem::replace(&mut column.name, name.clone()),
                to: name,
                reason: RenameReason::Disambiguated,
            });
        }
    }
}

impl PipelineStage for HeaderResolver {
    fn name(&self) -> &'static str {
        "header"
    }

    #[instrument(skip_all, fields(rows = table.num_rows(), columns = table.num_columns()))]
    fn apply(&self, mut table: Table, diagnostics: &mut DiagnosticsBuilder) -> Table {
        let placeholders = table
            .columns()
            .iter()
            .filter(|c| patterns::is_placeholder_name(&c.name))
            .count();

        if placeholders * 2 > table.num_columns() {
            let (decision, rule) = self.detect(&table);
            diagnostics.record_header_decision(decision, rule);
            if decision.is_ambiguous() {
                warn!(
                    ?decision,
                    "No header rule matched first row, applied ambiguous-header policy"
                );
            }
            if decision.consumed_row() {
                self.consume_header_row(&mut table, diagnostics);
            }
        } else {
            diagnostics.record_header_decision(HeaderDecision::NamesPresent, None);
        }

        self.repair_placeholders(&mut table, diagnostics);
        self.disambiguate(&mut table, diagnostics);

        let report = diagnostics.header();
        info!(
            decision = ?report.decision,
            rule = report.rule.as_deref().unwrap_or("policy"),
            renames = report.actions.len(),
            "Resolved headers"
        );
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizerConfig;

    fn resolver(policy: AmbiguousHeaderPolicy) -> HeaderResolver {
        let config = HeaderConfig {
            ambiguous_policy: policy,
            ..HeaderConfig::default()
        };
        HeaderResolver::new(config, NormalizerConfig::default().null_token_set())
    }

    fn raw(rows: &[&[&str]]) -> Table {
        Table::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    fn run(table: Table, policy: AmbiguousHeaderPolicy) -> (Table, crate::core::Diagnostics) {
        let mut diagnostics = DiagnosticsBuilder::new(&table);
        let out = resolver(policy).apply(table, &mut diagnostics);
        let report = diagnostics.finish(&out);
        (out, report)
    }

    #[test]
    fn test_text_over_numeric_data_is_header() {
        let table = raw(&[
            &["Name", "Sales", "Date"],
            &["Ada", "1200", "2024-01-05"],
            &["Grace", "980", "2024-01-06"],
        ]);
        let (out, report) = run(table, AmbiguousHeaderPolicy::TreatAsHeader);

        assert_eq!(out.column_names(), vec!["Name", "Sales", "Date"]);
        assert_eq!(out.num_rows(), 2);
        assert_eq!(report.header.decision, HeaderDecision::Header);
        assert_eq!(report.header.rule.as_deref(), Some("distinct_from_data"));
    }

    #[test]
    fn test_numeric_first_row_is_data() {
        let table = raw(&[&["1", "2.5", "3"], &["4", "5.5", "6"]]);
        let (out, report) = run(table, AmbiguousHeaderPolicy::TreatAsHeader);

        assert_eq!(out.column_names(), vec!["Column_0", "Column_1", "Column_2"]);
        assert_eq!(out.num_rows(), 2);
        assert_eq!(report.header.decision, HeaderDecision::Data);
        assert_eq!(report.header.rule.as_deref(), Some("numeric_majority"));
        assert!(report
            .header
            .actions
            .iter()
            .all(|a| a.reason == RenameReason::PositionalFallback));
    }

    #[test]
    fn test_keyword_header_over_text_data() {
        let table = raw(&[
            &["Customer Name", "City"],
            &["Ada", "London"],
            &["Grace", "Arlington"],
        ]);
        let (out, report) = run(table, AmbiguousHeaderPolicy::TreatAsData);

        assert_eq!(out.column_names(), vec!["Customer Name", "City"]);
        assert_eq!(report.header.rule.as_deref(), Some("header_keywords"));
    }

    #[test]
    fn test_lone_keyword_row_is_ambiguous() {
        let lone = || raw(&[&["Customer Name", "Total"]]);

        let (out, report) = run(lone(), AmbiguousHeaderPolicy::TreatAsHeader);
        assert_eq!(out.column_names(), vec!["Customer Name", "Total"]);
        assert_eq!(out.num_rows(), 0);
        assert_eq!(report.header.decision, HeaderDecision::AmbiguousAsHeader);
        assert_eq!(report.header.rule, None);
        assert!(report.has_flag(crate::core::DiagnosticFlag::AmbiguousHeader));

        let (out, report) = run(lone(), AmbiguousHeaderPolicy::TreatAsData);
        assert_eq!(out.num_rows(), 1);
        assert_eq!(report.header.decision, HeaderDecision::AmbiguousAsData);
    }

    #[test]
    fn test_recurring_first_row_is_data() {
        let table = raw(&[&["red", "small"], &["blue", "large"], &["red", "small"]]);
        let (out, report) = run(table, AmbiguousHeaderPolicy::TreatAsHeader);

        assert_eq!(out.num_rows(), 3);
        assert_eq!(report.header.rule.as_deref(), Some("values_recur_in_data"));
    }

    #[test]
    fn test_ambiguous_treated_as_header() {
        let table = raw(&[&["alpha", "beta"], &["gamma", "delta"]]);
        let (out, report) = run(table, AmbiguousHeaderPolicy::TreatAsHeader);

        assert_eq!(out.column_names(), vec!["alpha", "beta"]);
        assert_eq!(out.num_rows(), 1);
        assert_eq!(report.header.decision, HeaderDecision::AmbiguousAsHeader);
        assert!(report.has_flag(crate::core::DiagnosticFlag::AmbiguousHeader));
    }

    #[test]
    fn test_ambiguous_treated_as_data() {
        let table = raw(&[&["alpha", "beta"], &["gamma", "delta"]]);
        let (out, report) = run(table, AmbiguousHeaderPolicy::TreatAsData);

        assert_eq!(out.column_names(), vec!["Column_0", "Column_1"]);
        assert_eq!(out.num_rows(), 2);
        assert_eq!(report.header.decision, HeaderDecision::AmbiguousAsData);
    }

    #[test]
    fn test_real_names_skip_probing() {
        let table = Table::new(vec![
            Column::from_strs("Sales", &["Region", "12"]),
            Column::from_strs("Region", &["Units", "North"]),
        ])
        .unwrap();
        let (out, report) = run(table, AmbiguousHeaderPolicy::TreatAsHeader);

        assert_eq!(out.num_rows(), 2);
        assert_eq!(report.header.decision, HeaderDecision::NamesPresent);
        assert!(report.header.actions.is_empty());
    }

    #[test]
    fn test_content_inferred_names() {
        let table = Table::new(vec![
            Column::from_strs("Name", &["Ada", "Grace", "Linus"]),
            Column::from_strs("", &["yes", "no", "yes"]),
            Column::from_strs("Unnamed: 2", &["$10.00", "$12.50", "$3"]),
            Column::from_strs("3", &["2024-01-01", "2024-02-01", "2024-03-01"]),
            Column::from_strs("4", &["INV-001", "INV-002", "INV-003"]),
        ])
        .unwrap();
        let (out, _) = run(table, AmbiguousHeaderPolicy::TreatAsHeader);

        assert_eq!(
            out.column_names(),
            vec![
                "Name",
                "Flag_Column_1",
                "Amount_Column_2",
                "Date_Column_3",
                "ID_Column_4"
            ]
        );
    }

    #[test]
    fn test_duplicate_names_are_suffixed() {
        let table = Table::new(vec![
            Column::from_strs("a", &["1"]),
            Column::from_strs("a", &["2"]),
            Column::from_strs("a_1", &["3"]),
            Column::from_strs("a", &["4"]),
        ])
        .unwrap();
        let (out, report) = run(table, AmbiguousHeaderPolicy::TreatAsHeader);

        assert_eq!(out.column_names(), vec!["a", "a_2", "a_1", "a_3"]);
        assert_eq!(
            report
                .header
                .actions
                .iter()
                .filter(|a| a.reason == RenameReason::Disambiguated)
                .count(),
            2
        );
    }

    #[test]
    fn test_blank_header_cells_fall_back() {
        let table = raw(&[
            &["Product", "", "Price"],
            &["Widget", "x", "10"],
            &["Gadget", "y", "12"],
        ]);
        let (out, _) = run(table, AmbiguousHeaderPolicy::TreatAsHeader);

        assert_eq!(out.column_names(), vec!["Product", "Column_1", "Price"]);
    }

    #[test]
    fn test_zero_rows() {
        let table = Table::new(vec![Column::new("0", Vec::new())]).unwrap();
        let (out, report) = run(table, AmbiguousHeaderPolicy::TreatAsHeader);

        assert_eq!(report.header.decision, HeaderDecision::NoRows);
        assert_eq!(out.column_names(), vec!["Column_0"]);
    }
}
