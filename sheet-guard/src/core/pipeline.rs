//! Pipeline orchestration.
//!
//! A [`Pipeline`] owns one instance of every stage, configured once from a
//! [`PipelineConfig`], and can process any number of tables. Runs share no
//! state: each call gets a fresh [`DiagnosticsBuilder`].

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::diagnostics::{Diagnostics, DiagnosticsBuilder};
use super::table::Table;
use crate::config::PipelineConfig;
use crate::logging::{truncate_field, LogConfig};
use crate::prelude::*;
use crate::scoring::{QualityScore, QualityScorer};
use crate::stages::{
    DuplicateResolver, EmptyPruner, HeaderResolver, PipelineStage, TypeCoercer, ValueNormalizer,
};
use crate::suggestions::SuggestionEngine;
use crate::{log_repair, log_stage, perf_debug};

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    /// The cleaned table
    pub table: Table,
    /// Quality score of the cleaned table
    pub score: QualityScore,
    /// Everything the stages decided along the way
    pub diagnostics: Diagnostics,
}

/// Runs the cleaning stages and the quality scorer over tables.
///
/// # Examples
///
/// ```rust
/// use sheet_guard::config::PipelineConfig;
/// use sheet_guard::core::{Pipeline, Table};
/// use sheet_guard::logging::LogConfig;
///
/// # fn main() -> sheet_guard::error::Result<()> {
/// let pipeline = Pipeline::builder()
///     .config(PipelineConfig::builder().duplicate_ceiling(0.1).build()?)
///     .log_config(LogConfig::production())
///     .build()?;
///
/// let table = Table::from_rows(vec![
///     vec!["id".into(), "active".into()],
///     vec!["1".into(), "yes".into()],
///     vec!["2".into(), "no".into()],
/// ])?;
/// let output = pipeline.process(table)?;
/// assert_eq!(output.table.num_rows(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    log_config: LogConfig,
    stages: Vec<Box<dyn PipelineStage>>,
    scorer: QualityScorer,
}

impl Pipeline {
    /// Creates a pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Creates a pipeline from a configuration, validating it first.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// The configuration this pipeline was built with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Names of the stages in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    fn from_parts(config: PipelineConfig, log_config: LogConfig) -> Self {
        let null_tokens = config.normalizer.null_token_set();
        let mut stages: Vec<Box<dyn PipelineStage>> = Vec::with_capacity(6);

        if config.header.prune_empty {
            stages.push(Box::new(EmptyPruner::new(null_tokens.clone())));
        }
        stages.push(Box::new(HeaderResolver::new(
            config.header.clone(),
            null_tokens.clone(),
        )));
        stages.push(Box::new(TypeCoercer::new(
            config.coercion.clone(),
            null_tokens.clone(),
        )));
        stages.push(Box::new(ValueNormalizer::new(config.normalizer.clone())));
        // Second sweep for rows and columns emptied by failed conversions and
        // null tokens.
        if config.header.prune_empty {
            stages.push(Box::new(EmptyPruner::new(null_tokens)));
        }
        stages.push(Box::new(DuplicateResolver::new(config.duplicates.clone())));

        let scorer = QualityScorer::new(config.scoring.clone());
        Self {
            config,
            log_config,
            stages,
            scorer,
        }
    }

    /// Cleans and scores one table.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::EmptyInput`] when the table has no columns and
    /// [`SheetError::Structural`] when its columns differ in length.
    /// Malformed cells never cause an error.
    #[instrument(skip_all, fields(rows = table.num_rows(), columns = table.num_columns()))]
    pub fn process(&self, table: Table) -> Result<PipelineOutput> {
        if table.num_columns() == 0 {
            return Err(SheetError::EmptyInput);
        }
        table.check_shape()?;

        let start = Instant::now();
        let mut diagnostics = DiagnosticsBuilder::new(&table);
        let mut table = table;

        for stage in &self.stages {
            let (rows_before, columns_before) = (table.num_rows(), table.num_columns());
            table = stage.apply(table, &mut diagnostics);
            log_stage!(
                self.log_config,
                stage = stage.name(),
                rows_before,
                rows_after = table.num_rows(),
                columns_before,
                columns_after = table.num_columns(),
                "Stage complete"
            );
        }

        for action in &diagnostics.header().actions {
            log_repair!(
                self.log_config,
                column_index = action.column_index,
                from = %truncate_field(&action.from, self.log_config.max_field_length),
                to = %truncate_field(&action.to, self.log_config.max_field_length),
                reason = ?action.reason,
                "Renamed column"
            );
        }

        let breakdown = self.scorer.score(&table);
        if self.log_config.log_scores {
            info!(
                completeness = breakdown.completeness.score,
                uniqueness = breakdown.uniqueness.score,
                consistency = breakdown.consistency.score,
                validity = breakdown.validity.score,
                bonus = breakdown.bonus,
                final_score = breakdown.final_score,
                "Scored cleaned table"
            );
        }
        let score = breakdown.quality_score();
        diagnostics.record_score(breakdown);

        if self.config.suggestions {
            let suggestions =
                SuggestionEngine::default().suggest(&table, Some(diagnostics.duplicates()));
            perf_debug!(self.log_config, count = suggestions.len(), "Generated suggestions");
            diagnostics.record_suggestions(suggestions);
        }

        let diagnostics = diagnostics.finish(&table);
        info!(
            rows = diagnostics.output_rows,
            columns = diagnostics.output_columns,
            score = %score,
            duration_ms = start.elapsed().as_millis() as u64,
            "Pipeline complete"
        );

        Ok(PipelineOutput {
            table,
            score,
            diagnostics,
        })
    }

    /// Processes several named sheets and orders them by quality score,
    /// best first.
    ///
    /// Sheets that fail are collected in [`SheetRanking::failed`] instead of
    /// aborting the whole ranking. Ties keep their input order.
    #[instrument(skip_all, fields(sheets = sheets.len()))]
    pub fn rank_sheets<S: Into<String>>(&self, sheets: Vec<(S, Table)>) -> SheetRanking {
        let mut ranked = Vec::with_capacity(sheets.len());
        let mut failed = Vec::new();

        for (name, table) in sheets {
            let name = name.into();
            match self.process(table) {
                Ok(output) => ranked.push(RankedSheet { name, output }),
                Err(error) => {
                    warn!(sheet = %name, error = %error, "Sheet could not be processed");
                    failed.push(SheetFailure { name, error });
                }
            }
        }

        ranked.sort_by(|a, b| b.output.score.value.total_cmp(&a.output.score.value));
        SheetRanking { ranked, failed }
    }
}

/// Builder for [`Pipeline`].
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
    log_config: LogConfig,
}

impl PipelineBuilder {
    /// Sets the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the logging configuration.
    pub fn log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    /// Validates the configuration and builds the pipeline.
    pub fn build(self) -> Result<Pipeline> {
        self.config.validate()?;
        Ok(Pipeline::from_parts(self.config, self.log_config))
    }
}

/// A processed sheet and its name.
#[derive(Debug, Clone)]
pub struct RankedSheet {
    pub name: String,
    pub output: PipelineOutput,
}

/// A sheet the pipeline rejected.
#[derive(Debug)]
pub struct SheetFailure {
    pub name: String,
    pub error: SheetError,
}

/// Sheets ordered by quality score.
#[derive(Debug)]
pub struct SheetRanking {
    /// Successfully processed sheets, best score first
    pub ranked: Vec<RankedSheet>,
    pub failed: Vec<SheetFailure>,
}

impl SheetRanking {
    /// The highest-scoring sheet, if any sheet was processed.
    pub fn best(&self) -> Option<&RankedSheet> {
        self.ranked.first()
    }
}

/// Cleans and scores a table with the given configuration.
///
/// Shorthand for `Pipeline::new(config.clone())?.process(table)`.
pub fn process(table: Table, config: &PipelineConfig) -> Result<PipelineOutput> {
    Pipeline::new(config.clone())?.process(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, DiagnosticFlag, HeaderDecision, Value};

    fn raw(rows: &[&[&str]]) -> Table {
        Table::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_stage_order() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec!["prune", "header", "coercion", "normalize", "prune", "duplicates"]
        );

        let config = PipelineConfig::builder().prune_empty(false).build().unwrap();
        let pipeline = Pipeline::new(config).unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec!["header", "coercion", "normalize", "duplicates"]
        );
    }

    #[test]
    fn test_zero_columns_is_empty_input() {
        let err = process(Table::default(), &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, SheetError::EmptyInput));
    }

    #[test]
    fn test_ragged_columns_are_structural() {
        let mut table = raw(&[&["Name", "City"], &["Ada", "London"]]);
        table.columns_mut()[1].values.pop();

        let err = process(table, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, SheetError::Structural { .. }));
        assert!(err.to_string().contains("column '1' has 1 cells, expected 2"));
    }

    #[test]
    fn test_invalid_config_rejected_at_build() {
        let mut config = PipelineConfig::default();
        config.duplicates.ceiling = 2.0;
        assert!(matches!(
            Pipeline::new(config),
            Err(SheetError::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_rows_scores_zero() {
        let table = Table::new(vec![Column::new("a", Vec::new())]).unwrap();
        let output = process(table, &PipelineConfig::default()).unwrap();
        assert_eq!(output.score.value, 0.0);
        assert!(output.diagnostics.has_flag(DiagnosticFlag::EmptyTable));
    }

    #[test]
    fn test_failed_conversion_rows_are_swept() {
        let table = Table::new(vec![Column::new(
            "amount",
            vec![
                Value::text("10"),
                Value::text("20"),
                Value::text("30"),
                Value::text("40"),
                Value::text("forty"),
            ],
        )])
        .unwrap();
        let output = process(table, &PipelineConfig::default()).unwrap();

        assert_eq!(output.table.num_rows(), 4);
        assert_eq!(output.diagnostics.conversions[0].failed, 1);
        assert_eq!(output.diagnostics.pruned_rows, 1);
    }

    #[test]
    fn test_suggestions_toggle() {
        let table = raw(&[&["Name", "Notes"], &["Ada", ""], &["Grace", ""], &["Linus", "x"]]);

        let with = process(table.clone(), &PipelineConfig::default()).unwrap();
        assert!(!with.diagnostics.suggestions.is_empty());

        let config = PipelineConfig::builder().suggestions(false).build().unwrap();
        let without = process(table, &config).unwrap();
        assert!(without.diagnostics.suggestions.is_empty());
    }

    #[test]
    fn test_rank_sheets_orders_by_score_and_reports_failures() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let clean = raw(&[&["Name", "Units"], &["Ada", "3"], &["Grace", "5"]]);
        let sparse = raw(&[
            &["Name", "Units", "Notes"],
            &["Ada", "", ""],
            &["", "5", ""],
            &["Linus", "", "late"],
        ]);

        let ranking = pipeline.rank_sheets(vec![
            ("sparse", sparse),
            ("empty", Table::default()),
            ("clean", clean),
        ]);

        assert_eq!(ranking.best().map(|s| s.name.as_str()), Some("clean"));
        assert_eq!(ranking.ranked.len(), 2);
        assert_eq!(ranking.failed.len(), 1);
        assert_eq!(ranking.failed[0].name, "empty");
        assert!(ranking.ranked[0].output.score.value >= ranking.ranked[1].output.score.value);
    }

    #[test]
    fn test_header_detected_end_to_end() {
        let output = process(
            raw(&[&["Product", "Price"], &["Widget", "$9.99"], &["Gadget", "$19.50"]]),
            &PipelineConfig::default(),
        )
        .unwrap();
        assert_eq!(output.diagnostics.header.decision, HeaderDecision::Header);
        assert_eq!(output.table.column_names(), vec!["Product", "Price"]);
    }
}
