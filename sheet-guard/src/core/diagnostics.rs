//! Per-run diagnostics and the builder threaded through the pipeline stages.
//!
//! Every stage receives the [`DiagnosticsBuilder`] explicitly and records the
//! decisions it made. At the end of a run the builder is frozen into a
//! read-only [`Diagnostics`] value that is handed back to the caller.

use serde::{Deserialize, Serialize};

use super::table::Table;
use super::value::SemanticType;
use crate::scoring::ScoreBreakdown;
use crate::suggestions::CleaningSuggestion;

/// Outcome of header detection on row 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderDecision {
    /// Column names were already meaningful, row 0 was not probed
    NamesPresent,
    /// Row 0 was recognized as a header row and consumed
    Header,
    /// Row 0 was recognized as data; names were synthesized
    Data,
    /// No rule decided; the ambiguous-header policy treated row 0 as a header
    AmbiguousAsHeader,
    /// No rule decided; the ambiguous-header policy treated row 0 as data
    AmbiguousAsData,
    /// The table had no rows to probe
    NoRows,
}

impl HeaderDecision {
    /// Returns true if row 0 was consumed as a header.
    pub fn consumed_row(&self) -> bool {
        matches!(self, Self::Header | Self::AmbiguousAsHeader)
    }

    /// Returns true if the decision came from the ambiguity policy.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::AmbiguousAsHeader | Self::AmbiguousAsData)
    }
}

/// Why a column was renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RenameReason {
    /// Name taken from the detected header row
    HeaderRow,
    /// Name derived from the column content by a naming rule
    ContentInferred { rule: String },
    /// No rule matched, fell back to `Column_<index>`
    PositionalFallback,
    /// Suffix appended to resolve a name collision
    Disambiguated,
}

/// A single rename performed by the header resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderAction {
    /// Zero-based column position
    pub column_index: usize,
    /// Name before the action
    pub from: String,
    /// Name after the action
    pub to: String,
    /// Why the rename happened
    pub reason: RenameReason,
}

/// Header resolver summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderReport {
    /// Decision taken for row 0
    pub decision: HeaderDecision,
    /// Name of the rule that produced the decision, if any
    pub rule: Option<String>,
    /// Renames in the order they were applied
    pub actions: Vec<HeaderAction>,
}

impl Default for HeaderReport {
    fn default() -> Self {
        Self {
            decision: HeaderDecision::NamesPresent,
            rule: None,
            actions: Vec::new(),
        }
    }
}

/// Type assigned to one column by the type coercer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeConversion {
    /// Column name
    pub column: String,
    /// Semantic type assigned
    pub semantic_type: SemanticType,
    /// Detector that matched, `None` when the column stayed textual
    pub detector: Option<String>,
    /// Share of sampled non-missing values matching the adopted pattern
    pub coverage: f64,
    /// Number of non-missing values sampled
    pub sampled: usize,
    /// Cells converted to a typed value
    pub converted: usize,
    /// Cells that failed conversion and became missing
    pub failed: usize,
}

impl TypeConversion {
    /// Returns true if the column was converted beyond raw text.
    pub fn is_conversion(&self) -> bool {
        self.detector.is_some()
    }
}

/// Value normalizer counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationReport {
    /// Text cells whose surrounding whitespace was trimmed
    pub trimmed: usize,
    /// Cells mapped to the missing marker because they held a null token
    pub nulls_standardized: usize,
    /// Text cells whose mis-decoded sequences were repaired
    pub encoding_repaired: usize,
}

impl NormalizationReport {
    /// Total number of cells the normalizer changed.
    pub fn cells_changed(&self) -> usize {
        self.trimmed + self.nulls_standardized + self.encoding_repaired
    }
}

/// What the duplicate resolver did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateAction {
    /// No exact duplicates were present
    NoDuplicates,
    /// Duplicates were below the ceiling and removed
    Removed,
    /// Duplicates were at or above the ceiling and kept
    Retained,
}

/// Duplicate resolver decision and rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Rows before resolution
    pub total_rows: usize,
    /// Rows that exactly repeat an earlier row
    pub duplicate_rows: usize,
    /// `duplicate_rows / total_rows`
    pub ratio: f64,
    /// Configured ceiling
    pub ceiling: f64,
    /// Action taken
    pub action: DuplicateAction,
    /// Human-readable rationale
    pub reason: String,
}

impl Default for DuplicateReport {
    fn default() -> Self {
        Self {
            total_rows: 0,
            duplicate_rows: 0,
            ratio: 0.0,
            ceiling: 0.0,
            action: DuplicateAction::NoDuplicates,
            reason: String::new(),
        }
    }
}

/// Notable conditions attached to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticFlag {
    /// The cleaned table had no rows or no columns; the score is 0
    EmptyTable,
    /// The header decision came from the ambiguity policy
    AmbiguousHeader,
    /// Duplicates were retained because their ratio reached the ceiling
    DuplicatesRetained,
    /// At least one converted column lost cells that failed conversion
    ConversionFailures,
}

/// Read-only record of every decision taken during one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub input_rows: usize,
    pub input_columns: usize,
    pub output_rows: usize,
    pub output_columns: usize,
    /// Rows removed by pruning, header consumption and de-duplication
    pub rows_removed: usize,
    /// Columns removed by pruning
    pub columns_removed: usize,
    /// Blank rows and columns dropped before header detection
    pub pruned_rows: usize,
    pub pruned_columns: usize,
    pub header: HeaderReport,
    pub conversions: Vec<TypeConversion>,
    pub normalization: NormalizationReport,
    pub duplicates: DuplicateReport,
    pub score: Option<ScoreBreakdown>,
    pub flags: Vec<DiagnosticFlag>,
    pub suggestions: Vec<CleaningSuggestion>,
    pub input_fingerprint: String,
    pub output_fingerprint: String,
}

impl Diagnostics {
    /// Number of cells changed by the value normalizer.
    pub fn cells_changed(&self) -> usize {
        self.normalization.cells_changed()
    }

    /// Returns true if the given flag was raised.
    pub fn has_flag(&self, flag: DiagnosticFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Conversions that produced a non-text type.
    pub fn applied_conversions(&self) -> impl Iterator<Item = &TypeConversion> {
        self.conversions.iter().filter(|c| c.is_conversion())
    }
}

/// Accumulates diagnostics while a table moves through the stages.
#[derive(Debug, Clone)]
pub struct DiagnosticsBuilder {
    input_rows: usize,
    input_columns: usize,
    input_fingerprint: String,
    pruned_rows: usize,
    pruned_columns: usize,
    header: HeaderReport,
    conversions: Vec<TypeConversion>,
    normalization: NormalizationReport,
    duplicates: DuplicateReport,
    score: Option<ScoreBreakdown>,
    flags: Vec<DiagnosticFlag>,
    suggestions: Vec<CleaningSuggestion>,
}

impl DiagnosticsBuilder {
    /// Starts a fresh record for the given input table.
    pub fn new(input: &Table) -> Self {
        Self {
            input_rows: input.num_rows(),
            input_columns: input.num_columns(),
            input_fingerprint: input.fingerprint(),
            pruned_rows: 0,
            pruned_columns: 0,
            header: HeaderReport::default(),
            conversions: Vec::new(),
            normalization: NormalizationReport::default(),
            duplicates: DuplicateReport::default(),
            score: None,
            flags: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn record_pruning(&mut self, rows: usize, columns: usize) {
        self.pruned_rows += rows;
        self.pruned_columns += columns;
    }

    pub fn record_header_decision(&mut self, decision: HeaderDecision, rule: Option<&str>) {
        self.header.decision = decision;
        self.header.rule = rule.map(str::to_string);
        if decision.is_ambiguous() {
            self.flag(DiagnosticFlag::AmbiguousHeader);
        }
    }

    pub fn record_rename(&mut self, action: HeaderAction) {
        self.header.actions.push(action);
    }

    pub fn record_conversion(&mut self, conversion: TypeConversion) {
        if conversion.failed > 0 {
            self.flag(DiagnosticFlag::ConversionFailures);
        }
        self.conversions.push(conversion);
    }

    pub fn record_normalization(&mut self, report: NormalizationReport) {
        self.normalization = report;
    }

    pub fn record_duplicates(&mut self, report: DuplicateReport) {
        if report.action == DuplicateAction::Retained {
            self.flag(DiagnosticFlag::DuplicatesRetained);
        }
        self.duplicates = report;
    }

    pub fn record_score(&mut self, breakdown: ScoreBreakdown) {
        if breakdown.empty_table {
            self.flag(DiagnosticFlag::EmptyTable);
        }
        self.score = Some(breakdown);
    }

    pub fn record_suggestions(&mut self, suggestions: Vec<CleaningSuggestion>) {
        self.suggestions = suggestions;
    }

    /// Raises a flag once.
    pub fn flag(&mut self, flag: DiagnosticFlag) {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
    }

    /// Read access to the header report recorded so far.
    pub fn header(&self) -> &HeaderReport {
        &self.header
    }

    /// Read access to the duplicate report recorded so far.
    pub fn duplicates(&self) -> &DuplicateReport {
        &self.duplicates
    }

    /// Freezes the record against the cleaned output table.
    pub fn finish(self, output: &Table) -> Diagnostics {
        let output_rows = output.num_rows();
        let output_columns = output.num_columns();
        Diagnostics {
            input_rows: self.input_rows,
            input_columns: self.input_columns,
            output_rows,
            output_columns,
            rows_removed: self.input_rows.saturating_sub(output_rows),
            columns_removed: self.input_columns.saturating_sub(output_columns),
            pruned_rows: self.pruned_rows,
            pruned_columns: self.pruned_columns,
            header: self.header,
            conversions: self.conversions,
            normalization: self.normalization,
            duplicates: self.duplicates,
            score: self.score,
            flags: self.flags,
            suggestions: self.suggestions,
            input_fingerprint: self.input_fingerprint,
            output_fingerprint: output.fingerprint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Column;

    #[test]
    fn test_builder_counts_removed_rows() {
        let input = Table::new(vec![Column::from_strs("a", &["1", "2", "3"])]).unwrap();
        let output = Table::new(vec![Column::from_strs("a", &["1"])]).unwrap();

        let diagnostics = DiagnosticsBuilder::new(&input).finish(&output);
        assert_eq!(diagnostics.input_rows, 3);
        assert_eq!(diagnostics.output_rows, 1);
        assert_eq!(diagnostics.rows_removed, 2);
        assert_ne!(diagnostics.input_fingerprint, diagnostics.output_fingerprint);
    }

    #[test]
    fn test_flags_are_deduplicated() {
        let input = Table::default();
        let mut builder = DiagnosticsBuilder::new(&input);
        builder.flag(DiagnosticFlag::EmptyTable);
        builder.flag(DiagnosticFlag::EmptyTable);
        builder.record_header_decision(HeaderDecision::AmbiguousAsHeader, None);

        let diagnostics = builder.finish(&input);
        assert_eq!(
            diagnostics.flags,
            vec![DiagnosticFlag::EmptyTable, DiagnosticFlag::AmbiguousHeader]
        );
    }

    #[test]
    fn test_retained_duplicates_raise_flag() {
        let input = Table::default();
        let mut builder = DiagnosticsBuilder::new(&input);
        builder.record_duplicates(DuplicateReport {
            total_rows: 8,
            duplicate_rows: 2,
            ratio: 0.25,
            ceiling: 0.2,
            action: DuplicateAction::Retained,
            reason: "retained".to_string(),
        });
        assert!(builder
            .finish(&input)
            .has_flag(DiagnosticFlag::DuplicatesRetained));
    }
}
