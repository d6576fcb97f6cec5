//! Cell-level cleanup of text values.
//!
//! The normalizer repairs common mis-decoded UTF-8 sequences, trims
//! surrounding whitespace and maps null-like tokens to [`Value::Missing`].
//! It never changes the shape of the table or the type of a column.

use tracing::{debug, info, instrument};

use super::PipelineStage;
use crate::config::{NormalizerConfig, NullTokens};
use crate::core::{DiagnosticsBuilder, NormalizationReport, Table, Value};

/// Mis-decoded sequences and their intended characters, longest first.
///
/// Only sequences with a single unambiguous reading are listed; a bare `â€`
/// could be the start of several quotes and is left alone.
pub const MOJIBAKE_REPAIRS: &[(&str, &str)] = &[
    ("â€™", "’"),
    ("â€˜", "‘"),
    ("â€œ", "“"),
    ("â€\u{9d}", "”"),
    ("â€“", "–"),
    ("â€”", "—"),
    ("â€¦", "…"),
    ("â€¢", "•"),
    ("â‚¬", "€"),
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ãª", "ê"),
    ("Ã¡", "á"),
    ("Ã\u{a0}", "à"),
    ("Ã\u{ad}", "í"),
    ("Ã³", "ó"),
    ("Ãº", "ú"),
    ("Ã±", "ñ"),
    ("Ã§", "ç"),
    ("Ã¼", "ü"),
    ("Ã¶", "ö"),
    ("Ã¤", "ä"),
    ("Ã‰", "É"),
    ("Â£", "£"),
    ("Â°", "°"),
    ("Â©", "©"),
    ("Â®", "®"),
    ("Â\u{a0}", "\u{a0}"),
];

/// Replaces known mojibake sequences until none remain.
///
/// Every replacement is shorter than the sequence it replaces, so the loop
/// terminates.
pub fn repair_encoding(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = MOJIBAKE_REPAIRS
            .iter()
            .fold(current.clone(), |acc, (broken, fixed)| {
                if acc.contains(broken) {
                    acc.replace(broken, fixed)
                } else {
                    acc
                }
            });
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Trims text, standardizes null tokens and repairs encoding artifacts.
#[derive(Debug, Clone)]
pub struct ValueNormalizer {
    config: NormalizerConfig,
    null_tokens: NullTokens,
}

impl ValueNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        let null_tokens = config.null_token_set();
        Self {
            config,
            null_tokens,
        }
    }

    /// Normalizes one cell in place, updating the counters.
    fn normalize_cell(&self, value: &mut Value, report: &mut NormalizationReport) {
        let Value::Text(original) = value else {
            return;
        };

        let repaired = if self.config.repair_encoding {
            repair_encoding(original)
        } else {
            original.clone()
        };
        let was_repaired = repaired != *original;

        if self.null_tokens.is_null(&repaired) {
            *value = Value::Missing;
            report.nulls_standardized += 1;
            return;
        }

        let cleaned = if self.config.trim_whitespace {
            repaired.trim().to_string()
        } else {
            repaired
        };
        if cleaned == *original {
            return;
        }

        if was_repaired {
            report.encoding_repaired += 1;
        } else {
            report.trimmed += 1;
        }
        *value = Value::Text(cleaned);
    }
}

impl PipelineStage for ValueNormalizer {
    fn name(&self) -> &'static str {
        "normalize"
    }

    #[instrument(skip_all, fields(rows = table.num_rows(), columns = table.num_columns()))]
    fn apply(&self, mut table: Table, diagnostics: &mut DiagnosticsBuilder) -> Table {
        let mut report = NormalizationReport::default();

        for column in table.columns_mut() {
            let before = report.cells_changed();
            for value in column.values.iter_mut() {
                self.normalize_cell(value, &mut report);
            }
            let changed = report.cells_changed() - before;
            if changed > 0 {
                debug!(column = %column.name, changed, "Normalized column values");
            }
        }

        info!(
            trimmed = report.trimmed,
            nulls_standardized = report.nulls_standardized,
            encoding_repaired = report.encoding_repaired,
            "Normalized values"
        );
        diagnostics.record_normalization(report);
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, SemanticType};

    fn normalize(values: &[&str]) -> (Vec<Value>, NormalizationReport) {
        let table = Table::new(vec![Column::from_strs("c", values)]).unwrap();
        let mut diagnostics = DiagnosticsBuilder::new(&table);
        let out = ValueNormalizer::new(NormalizerConfig::default()).apply(table, &mut diagnostics);
        let report = diagnostics.finish(&out).normalization;
        (out.into_columns().remove(0).values, report)
    }

    #[test]
    fn test_trims_outer_whitespace_only() {
        let (values, report) = normalize(&["  Ada  Lovelace ", "Grace"]);
        assert_eq!(values[0], Value::text("Ada  Lovelace"));
        assert_eq!(values[1], Value::text("Grace"));
        assert_eq!(report.trimmed, 1);
    }

    #[test]
    fn test_null_tokens_become_missing() {
        let (values, report) = normalize(&["N/A", "null", "  ", "", "None", "#N/A", "nan", "0"]);
        assert_eq!(values[..7].to_vec(), vec![Value::Missing; 7]);
        assert_eq!(values[7], Value::text("0"));
        assert_eq!(report.nulls_standardized, 7);
    }

    #[test]
    fn test_encoding_repair() {
        let (values, report) = normalize(&["Itâ€™s", "CafÃ©", "â€œquotedâ€\u{9d}", "Â£5"]);
        assert_eq!(values[0], Value::text("It’s"));
        assert_eq!(values[1], Value::text("Café"));
        assert_eq!(values[2], Value::text("“quoted”"));
        assert_eq!(values[3], Value::text("£5"));
        assert_eq!(report.encoding_repaired, 4);
    }

    #[test]
    fn test_unknown_corruption_is_left_alone() {
        let (values, report) = normalize(&["brokenâ€", "Ã"]);
        assert_eq!(values[0], Value::text("brokenâ€"));
        assert_eq!(values[1], Value::text("Ã"));
        assert_eq!(report.cells_changed(), 0);
    }

    #[test]
    fn test_repair_reaches_fixpoint() {
        assert_eq!(repair_encoding("ÃÂ©"), "é");
        let once = repair_encoding("ÃÂ©t");
        assert_eq!(repair_encoding(&once), once);
    }

    #[test]
    fn test_table_is_longest_first() {
        let lengths: Vec<usize> = MOJIBAKE_REPAIRS
            .iter()
            .map(|(broken, _)| broken.chars().count())
            .collect();
        assert!(lengths.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_typed_cells_untouched() {
        let table = Table::new(vec![Column::typed(
            "n",
            SemanticType::Integer,
            vec![Value::Integer(1), Value::Missing],
        )])
        .unwrap();
        let mut diagnostics = DiagnosticsBuilder::new(&table);
        let out = ValueNormalizer::new(NormalizerConfig::default())
            .apply(table.clone(), &mut diagnostics);
        assert_eq!(out, table);
    }
}
