//! Report formatting for pipeline results.
//!
//! Formatters turn a [`PipelineOutput`] into JSON for machines, colorized
//! text for terminals, or Markdown for documents. The cleaned table itself
//! is not rendered; reports cover the score, the column layout and the
//! diagnostics.
//!
//! # Examples
//!
//! ```rust
//! use sheet_guard::formatters::{FormatterConfig, HumanFormatter, ResultFormatter};
//! use sheet_guard::prelude::*;
//!
//! # fn main() -> sheet_guard::error::Result<()> {
//! let table = Table::from_rows(vec![
//!     vec!["id".into(), "paid".into()],
//!     vec!["1".into(), "yes".into()],
//! ])?;
//! let output = process(table, &PipelineConfig::default())?;
//!
//! let report = HumanFormatter::with_config(FormatterConfig::ci()).format(&output)?;
//! assert!(report.contains("Quality score"));
//! # Ok(())
//! # }
//! ```

use std::fmt::Write;

use serde::Serialize;

use crate::core::{Diagnostics, DuplicateAction, PipelineOutput, SemanticType};
use crate::prelude::*;
use crate::scoring::{QualityGrade, QualityScore};
use crate::suggestions::SuggestionSeverity;

/// Configuration options for formatting pipeline results.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include the per-dimension score breakdown
    pub include_scores: bool,
    /// Include header, conversion and duplicate decisions
    pub include_decisions: bool,
    /// Include cleaning suggestions
    pub include_suggestions: bool,
    /// Maximum number of list entries (renames, conversions, suggestions)
    /// to display (-1 for all)
    pub max_items: i32,
    /// Whether to use colorized output (for human formatter)
    pub use_colors: bool,
    /// Whether to include the input and output fingerprints
    pub include_fingerprints: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_scores: true,
            include_decisions: true,
            include_suggestions: true,
            max_items: -1,
            use_colors: true,
            include_fingerprints: false,
        }
    }
}

impl FormatterConfig {
    /// Creates a minimal configuration showing only the score summary.
    pub fn minimal() -> Self {
        Self {
            include_scores: true,
            include_decisions: false,
            include_suggestions: false,
            max_items: 0,
            use_colors: false,
            include_fingerprints: false,
        }
    }

    /// Creates a detailed configuration showing everything.
    pub fn detailed() -> Self {
        Self {
            include_scores: true,
            include_decisions: true,
            include_suggestions: true,
            max_items: -1,
            use_colors: true,
            include_fingerprints: true,
        }
    }

    /// Creates a configuration suitable for CI/CD environments.
    pub fn ci() -> Self {
        Self {
            include_scores: true,
            include_decisions: true,
            include_suggestions: true,
            max_items: 25,
            use_colors: false,
            include_fingerprints: true,
        }
    }

    /// Sets whether to include the score breakdown.
    pub fn with_scores(mut self, include: bool) -> Self {
        self.include_scores = include;
        self
    }

    /// Sets whether to include stage decisions.
    pub fn with_decisions(mut self, include: bool) -> Self {
        self.include_decisions = include;
        self
    }

    /// Sets the maximum number of list entries to display.
    pub fn with_max_items(mut self, max: i32) -> Self {
        self.max_items = max;
        self
    }

    /// Sets whether to use colorized output.
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn limit<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        if self.max_items < 0 {
            items
        } else {
            &items[..items.len().min(self.max_items as usize)]
        }
    }
}

/// Trait for formatting pipeline results into different output formats.
///
/// # Examples
///
/// ```rust
/// use sheet_guard::core::PipelineOutput;
/// use sheet_guard::formatters::ResultFormatter;
///
/// struct OneLine;
///
/// impl ResultFormatter for OneLine {
///     fn format(&self, output: &PipelineOutput) -> sheet_guard::prelude::Result<String> {
///         Ok(format!("{} rows, {}", output.table.num_rows(), output.score))
///     }
/// }
/// ```
pub trait ResultFormatter {
    /// Formats a pipeline result into a string representation.
    fn format(&self, output: &PipelineOutput) -> Result<String>;

    /// Formats a pipeline result with custom configuration.
    fn format_with_config(
        &self,
        output: &PipelineOutput,
        _config: &FormatterConfig,
    ) -> Result<String> {
        self.format(output)
    }
}

/// Formats pipeline results as structured JSON.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            pretty: true,
        }
    }

    /// Creates a new JSON formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonColumn<'a> {
    name: &'a str,
    semantic_type: Option<SemanticType>,
    missing: usize,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    score: &'a QualityScore,
    rows: usize,
    columns: Vec<JsonColumn<'a>>,
    diagnostics: Diagnostics,
}

impl ResultFormatter for JsonFormatter {
    fn format(&self, output: &PipelineOutput) -> Result<String> {
        self.format_with_config(output, &self.config)
    }

    fn format_with_config(
        &self,
        output: &PipelineOutput,
        config: &FormatterConfig,
    ) -> Result<String> {
        let report = JsonReport {
            score: &output.score,
            rows: output.table.num_rows(),
            columns: output
                .table
                .columns()
                .iter()
                .map(|c| JsonColumn {
                    name: &c.name,
                    semantic_type: c.semantic_type,
                    missing: c.missing_count(),
                })
                .collect(),
            diagnostics: filter_diagnostics(&output.diagnostics, config),
        };

        let json = if self.pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        };
        json.map_err(|e| SheetError::Serialization(format!("Failed to serialize report: {e}")))
    }
}

/// Formats pipeline results for console output.
#[derive(Debug, Clone)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    /// Creates a new human formatter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
        }
    }

    /// Creates a new human formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn grade_symbol(grade: QualityGrade) -> &'static str {
    match grade {
        QualityGrade::Excellent | QualityGrade::High => "✅",
        QualityGrade::Good => "⚠️",
        QualityGrade::NeedsReview => "❌",
    }
}

fn grade_color(grade: QualityGrade) -> &'static str {
    match grade {
        QualityGrade::Excellent | QualityGrade::High => "32",
        QualityGrade::Good => "33",
        QualityGrade::NeedsReview => "31",
    }
}

fn paint(text: &str, color: &str, use_colors: bool) -> String {
    if use_colors {
        format!("\x1b[{color}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

fn severity_label(severity: SuggestionSeverity) -> &'static str {
    match severity {
        SuggestionSeverity::High => "high",
        SuggestionSeverity::Moderate => "moderate",
        SuggestionSeverity::Low => "low",
    }
}

impl ResultFormatter for HumanFormatter {
    fn format(&self, output: &PipelineOutput) -> Result<String> {
        self.format_with_config(output, &self.config)
    }

    fn format_with_config(
        &self,
        output: &PipelineOutput,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut out = String::new();
        let diagnostics = &output.diagnostics;
        let grade = output.score.grade;

        writeln!(out)?;
        writeln!(
            out,
            "{} Quality score: {}",
            grade_symbol(grade),
            paint(&output.score.to_string(), grade_color(grade), config.use_colors)
        )?;
        writeln!(out)?;
        writeln!(
            out,
            "Table: {} rows x {} columns (input {} x {})",
            diagnostics.output_rows,
            diagnostics.output_columns,
            diagnostics.input_rows,
            diagnostics.input_columns
        )?;

        if config.include_scores {
            if let Some(breakdown) = &diagnostics.score {
                writeln!(out)?;
                writeln!(out, "📊 Score Breakdown:")?;
                for (name, dimension) in breakdown.dimensions() {
                    writeln!(
                        out,
                        "   {name}: {:.3} (raw {:.3}, floor {:.2}) x {:.2}",
                        dimension.score, dimension.raw, dimension.floor, dimension.weight
                    )?;
                }
                writeln!(out, "   Weighted sum: {:.3}", breakdown.weighted_sum)?;
                writeln!(
                    out,
                    "   Bonus: +{:.3} (meaningful names: {}, proper types: {})",
                    breakdown.bonus, breakdown.meaningful_names, breakdown.proper_types
                )?;
            }
        }

        if config.include_decisions {
            let header = &diagnostics.header;
            writeln!(out)?;
            writeln!(
                out,
                "🧭 Header: {:?} (rule: {})",
                header.decision,
                header.rule.as_deref().unwrap_or("none")
            )?;
            for action in config.limit(&header.actions) {
                writeln!(out, "   '{}' -> '{}' ({:?})", action.from, action.to, action.reason)?;
            }

            let conversions: Vec<_> = diagnostics.applied_conversions().collect();
            if !conversions.is_empty() {
                writeln!(out)?;
                writeln!(out, "🔁 Conversions:")?;
                for conversion in config.limit(&conversions) {
                    writeln!(
                        out,
                        "   {} -> {} (coverage {:.1}%, converted {}, failed {})",
                        conversion.column,
                        conversion.semantic_type,
                        conversion.coverage * 100.0,
                        conversion.converted,
                        conversion.failed
                    )?;
                }
            }

            let normalization = &diagnostics.normalization;
            writeln!(out)?;
            writeln!(
                out,
                "🧹 Normalization: {} trimmed, {} nulls standardized, {} encoding repairs",
                normalization.trimmed, normalization.nulls_standardized, normalization.encoding_repaired
            )?;

            let duplicates = &diagnostics.duplicates;
            let color = if duplicates.action == DuplicateAction::Retained {
                "33"
            } else {
                "32"
            };
            writeln!(
                out,
                "👥 Duplicates: {}",
                paint(&duplicates.reason, color, config.use_colors)
            )?;
        }

        if config.include_suggestions && !diagnostics.suggestions.is_empty() {
            let shown = config.limit(&diagnostics.suggestions);
            writeln!(out)?;
            writeln!(out, "💡 Suggestions:")?;
            for suggestion in shown {
                writeln!(
                    out,
                    "   [{}] {}",
                    severity_label(suggestion.severity),
                    suggestion.message
                )?;
            }
            if diagnostics.suggestions.len() > shown.len() {
                writeln!(
                    out,
                    "   ... and {} more suggestions",
                    diagnostics.suggestions.len() - shown.len()
                )?;
            }
        }

        if !diagnostics.flags.is_empty() {
            writeln!(out)?;
            writeln!(out, "🚩 Flags: {:?}", diagnostics.flags)?;
        }

        if config.include_fingerprints {
            writeln!(out)?;
            writeln!(out, "Input fingerprint:  {}", diagnostics.input_fingerprint)?;
            writeln!(out, "Output fingerprint: {}", diagnostics.output_fingerprint)?;
        }

        writeln!(out)?;
        Ok(out)
    }
}

/// Formats pipeline results as Markdown.
#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    config: FormatterConfig,
    heading_level: u8,
}

impl MarkdownFormatter {
    /// Creates a new Markdown formatter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            heading_level: 2,
        }
    }

    /// Creates a new Markdown formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            heading_level: 2,
        }
    }

    /// Sets the base heading level for the output.
    pub fn with_heading_level(mut self, level: u8) -> Self {
        self.heading_level = level.clamp(1, 6);
        self
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultFormatter for MarkdownFormatter {
    fn format(&self, output: &PipelineOutput) -> Result<String> {
        self.format_with_config(output, &self.config)
    }

    fn format_with_config(
        &self,
        output: &PipelineOutput,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut out = String::new();
        let diagnostics = &output.diagnostics;
        let h = "#".repeat(self.heading_level as usize);

        writeln!(
            out,
            "{h} {} Data Quality Report - {}",
            grade_symbol(output.score.grade),
            output.score
        )?;
        writeln!(out)?;
        writeln!(
            out,
            "**Rows:** {} (input {})  ",
            diagnostics.output_rows, diagnostics.input_rows
        )?;
        writeln!(
            out,
            "**Columns:** {} (input {})",
            diagnostics.output_columns, diagnostics.input_columns
        )?;

        writeln!(out)?;
        writeln!(out, "{h}# Columns")?;
        writeln!(out)?;
        writeln!(out, "| Column | Type | Missing |")?;
        writeln!(out, "|--------|------|---------|")?;
        for column in output.table.columns() {
            let ty = column.semantic_type.map_or("untyped", |t| t.type_name());
            writeln!(out, "| {} | {ty} | {} |", column.name, column.missing_count())?;
        }

        if config.include_scores {
            if let Some(breakdown) = &diagnostics.score {
                writeln!(out)?;
                writeln!(out, "{h}# Score")?;
                writeln!(out)?;
                writeln!(out, "| Dimension | Raw | Floor | Score | Weight |")?;
                writeln!(out, "|-----------|-----|-------|-------|--------|")?;
                for (name, d) in breakdown.dimensions() {
                    writeln!(
                        out,
                        "| {name} | {:.3} | {:.2} | {:.3} | {:.2} |",
                        d.raw, d.floor, d.score, d.weight
                    )?;
                }
                writeln!(out, "| bonus | | | {:.3} | |", breakdown.bonus)?;
                writeln!(out, "| **final** | | | **{:.3}** | |", breakdown.final_score)?;
            }
        }

        if config.include_decisions {
            writeln!(out)?;
            writeln!(out, "{h}# Decisions")?;
            writeln!(out)?;
            writeln!(
                out,
                "- **Header:** {:?} (rule: {})",
                diagnostics.header.decision,
                diagnostics.header.rule.as_deref().unwrap_or("none")
            )?;
            for action in config.limit(&diagnostics.header.actions) {
                writeln!(out, "  - `{}` → `{}`", action.from, action.to)?;
            }
            let conversions: Vec<_> = diagnostics.applied_conversions().collect();
            for conversion in config.limit(&conversions) {
                writeln!(
                    out,
                    "- **{}** converted to {} ({} failed)",
                    conversion.column, conversion.semantic_type, conversion.failed
                )?;
            }
            writeln!(out, "- **Duplicates:** {}", diagnostics.duplicates.reason)?;
        }

        if config.include_suggestions && !diagnostics.suggestions.is_empty() {
            writeln!(out)?;
            writeln!(out, "{h}# Suggestions")?;
            writeln!(out)?;
            for suggestion in config.limit(&diagnostics.suggestions) {
                writeln!(
                    out,
                    "- **{}:** {}",
                    severity_label(suggestion.severity),
                    suggestion.message
                )?;
            }
        }

        writeln!(out)?;
        Ok(out)
    }
}

/// Drops the parts of the diagnostics the configuration excludes.
fn filter_diagnostics(diagnostics: &Diagnostics, config: &FormatterConfig) -> Diagnostics {
    let mut filtered = diagnostics.clone();

    if !config.include_scores {
        filtered.score = None;
    }
    if !config.include_decisions {
        filtered.header.actions.clear();
        filtered.conversions.clear();
    } else if config.max_items >= 0 {
        let max = config.max_items as usize;
        filtered.header.actions.truncate(max);
        filtered.conversions.truncate(max);
    }
    if !config.include_suggestions {
        filtered.suggestions.clear();
    } else if config.max_items >= 0 {
        filtered.suggestions.truncate(config.max_items as usize);
    }
    if !config.include_fingerprints {
        filtered.input_fingerprint = String::new();
        filtered.output_fingerprint = String::new();
    }

    filtered
}
