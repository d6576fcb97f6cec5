//! Removal of rows and columns that carry no information.

use tracing::{debug, instrument};

use super::PipelineStage;
use crate::config::NullTokens;
use crate::core::{DiagnosticsBuilder, Table, Value};

/// Drops rows and columns whose every cell is empty.
///
/// A cell is empty when it is missing, whitespace-only text, or a null token.
/// A table without a single non-empty cell is returned unchanged.
#[derive(Debug, Clone)]
pub struct EmptyPruner {
    null_tokens: NullTokens,
}

impl EmptyPruner {
    pub fn new(null_tokens: NullTokens) -> Self {
        Self { null_tokens }
    }

    fn is_empty_cell(&self, value: &Value) -> bool {
        match value {
            Value::Missing => true,
            Value::Text(s) => self.null_tokens.is_null(s),
            _ => false,
        }
    }
}

impl PipelineStage for EmptyPruner {
    fn name(&self) -> &'static str {
        "prune"
    }

    #[instrument(skip_all, fields(rows = table.num_rows(), columns = table.num_columns()))]
    fn apply(&self, mut table: Table, diagnostics: &mut DiagnosticsBuilder) -> Table {
        let keep_rows: Vec<bool> = (0..table.num_rows())
            .map(|row| {
                table
                    .columns()
                    .iter()
                    .any(|c| !self.is_empty_cell(&c.values[row]))
            })
            .collect();

        // Nothing to anchor on: leave fully blank tables alone.
        if !keep_rows.iter().any(|k| *k) {
            diagnostics.record_pruning(0, 0);
            return table;
        }

        let dropped_rows = keep_rows.iter().filter(|k| !**k).count();
        if dropped_rows > 0 {
            table.retain_rows(&keep_rows);
        }

        let keep_columns: Vec<bool> = table
            .columns()
            .iter()
            .map(|c| c.values.iter().any(|v| !self.is_empty_cell(v)))
            .collect();
        let dropped_columns = keep_columns.iter().filter(|k| !**k).count();
        if dropped_columns > 0 {
            table.retain_columns(&keep_columns);
        }

        if dropped_rows > 0 || dropped_columns > 0 {
            debug!(dropped_rows, dropped_columns, "Pruned empty rows and columns");
        }
        diagnostics.record_pruning(dropped_rows, dropped_columns);
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizerConfig;
    use crate::core::Column;

    fn pruner() -> EmptyPruner {
        EmptyPruner::new(NormalizerConfig::default().null_token_set())
    }

    #[test]
    fn test_drops_blank_rows_and_columns() {
        let table = Table::new(vec![
            Column::from_strs("0", &["a", "", "c"]),
            Column::from_strs("1", &["", " ", "N/A"]),
            Column::from_strs("2", &["1", "", "3"]),
        ])
        .unwrap();
        let mut diagnostics = DiagnosticsBuilder::new(&table);

        let pruned = pruner().apply(table, &mut diagnostics);
        assert_eq!(pruned.num_rows(), 2);
        assert_eq!(pruned.column_names(), vec!["0", "2"]);

        let report = diagnostics.finish(&pruned);
        assert_eq!(report.pruned_rows, 1);
        assert_eq!(report.pruned_columns, 1);
    }

    #[test]
    fn test_all_blank_table_keeps_shape() {
        let table = Table::new(vec![
            Column::from_strs("0", &["", " "]),
            Column::from_strs("1", &["", ""]),
        ])
        .unwrap();
        let mut diagnostics = DiagnosticsBuilder::new(&table);

        let pruned = pruner().apply(table.clone(), &mut diagnostics);
        assert_eq!(pruned, table);
    }

    #[test]
    fn test_typed_cells_are_never_empty() {
        let table = Table::new(vec![Column::new(
            "flag",
            vec![Value::Boolean(false), Value::Missing],
        )])
        .unwrap();
        let mut diagnostics = DiagnosticsBuilder::new(&table);

        let pruned = pruner().apply(table, &mut diagnostics);
        assert_eq!(pruned.num_rows(), 1);
        assert_eq!(pruned.columns()[0].values, vec![Value::Boolean(false)]);
    }
}
