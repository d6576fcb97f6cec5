//! Exact-duplicate row handling.
//!
//! A low duplicate ratio usually means data-entry mistakes, so duplicates
//! are removed. A ratio at or above the configured ceiling more likely
//! reflects legitimately repeated observations, so every row is kept and the
//! decision is flagged in the diagnostics.

use tracing::{info, instrument, warn};

use super::PipelineStage;
use crate::config::DuplicateConfig;
use crate::core::{DiagnosticsBuilder, DuplicateAction, DuplicateReport, Table};

/// Removes or retains exact-duplicate rows depending on their ratio.
#[derive(Debug, Clone)]
pub struct DuplicateResolver {
    config: DuplicateConfig,
}

impl DuplicateResolver {
    pub fn new(config: DuplicateConfig) -> Self {
        Self { config }
    }

    /// Decides what to do with the table's duplicate rows without touching
    /// the table.
    pub fn assess(&self, table: &Table) -> DuplicateReport {
        let total_rows = table.num_rows();
        let duplicate_rows = table.duplicate_row_count();
        let ceiling = self.config.ceiling;
        let ratio = if total_rows == 0 {
            0.0
        } else {
            duplicate_rows as f64 / total_rows as f64
        };

        let (action, reason) = if duplicate_rows == 0 {
            (
                DuplicateAction::NoDuplicates,
                "no duplicate rows".to_string(),
            )
        } else if ratio < ceiling {
            (
                DuplicateAction::Removed,
                format!("removed, ratio={ratio:.2}, below ceiling {ceiling:.2}"),
            )
        } else {
            let position = if ratio > ceiling { "above" } else { "at" };
            (
                DuplicateAction::Retained,
                format!("retained, ratio={ratio:.2}, {position} ceiling {ceiling:.2}"),
            )
        };

        DuplicateReport {
            total_rows,
            duplicate_rows,
            ratio,
            ceiling,
            action,
            reason,
        }
    }
}

impl PipelineStage for DuplicateResolver {
    fn name(&self) -> &'static str {
        "duplicates"
    }

    #[instrument(skip_all, fields(rows = table.num_rows()))]
    fn apply(&self, mut table: Table, diagnostics: &mut DiagnosticsBuilder) -> Table {
        let report = self.assess(&table);

        match report.action {
            DuplicateAction::Removed => {
                let keep: Vec<bool> = table.duplicate_mask().into_iter().map(|d| !d).collect();
                table.retain_rows(&keep);
                info!(
                    removed = report.duplicate_rows,
                    ratio = report.ratio,
                    "Removed duplicate rows"
                );
            }
            DuplicateAction::Retained => {
                warn!(
                    duplicates = report.duplicate_rows,
                    ratio = report.ratio,
                    ceiling = report.ceiling,
                    "Duplicate ratio at or above ceiling, retaining all rows"
                );
            }
            DuplicateAction::NoDuplicates => {}
        }

        diagnostics.record_duplicates(report);
        table
    }
}
