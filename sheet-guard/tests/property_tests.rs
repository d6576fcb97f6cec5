//! Property-based tests for the cleaning pipeline.
//!
//! Random tables are drawn from a vocabulary of the cell shapes real exports
//! contain: integers, decimals, currency amounts, dates, boolean words, null
//! tokens, blanks, padded text and header-like words.
//!
//! ## Properties
//!
//! - Column names are unique after header resolution.
//! - The quality score stays inside `[0, ceiling]`.
//! - Cleaning a cleaned table changes neither the table nor the score.
//! - Type conversion only adds missing cells for values that fail to parse.

use std::collections::HashSet;

use proptest::prelude::*;
use sheet_guard::config::{CoercionConfig, PipelineConfig};
use sheet_guard::core::{process, Column, Table, Value};
use sheet_guard::stages::TypeCoercer;

fn cell() -> impl Strategy<Value = String> {
    prop_oneof![
        (0i64..1000).prop_map(|n| n.to_string()),
        (0u32..10_000).prop_map(|n| format!("{}.{:02}", n / 100, n % 100)),
        (1u32..5000).prop_map(|n| format!("${n}.00")),
        (1u32..28).prop_map(|d| format!("2024-03-{d:02}")),
        prop_oneof![Just("yes"), Just("no"), Just("true"), Just("false")].prop_map(String::from),
        prop_oneof![Just("N/A"), Just("null"), Just(""), Just("   ")].prop_map(String::from),
        prop_oneof![Just("North"), Just("South"), Just(" East "), Just("West")]
            .prop_map(String::from),
        prop_oneof![Just("Name"), Just("Total"), Just("Date"), Just("Status")]
            .prop_map(String::from),
        "[a-z]{1,8}",
    ]
}

fn raw_table() -> impl Strategy<Value = Table> {
    (1usize..6, 1usize..15).prop_flat_map(|(width, height)| {
        prop::collection::vec(prop::collection::vec(cell(), width), height)
            .prop_map(|rows| Table::from_rows(rows).unwrap())
    })
}

fn text_column() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(cell(), 1..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_column_names_are_unique(table in raw_table()) {
        let output = process(table, &PipelineConfig::default()).unwrap();
        let names = output.table.column_names();
        let distinct: HashSet<&str> = names.iter().copied().collect();
        prop_assert_eq!(distinct.len(), names.len(), "names: {:?}", names);
    }

    #[test]
    fn prop_score_within_bounds(table in raw_table()) {
        let config = PipelineConfig::default();
        let output = process(table, &config).unwrap();
        prop_assert!(output.score.value >= 0.0);
        prop_assert!(output.score.value <= config.scoring.score_ceiling);
    }

    #[test]
    fn prop_cleaning_is_idempotent(table in raw_table()) {
        let config = PipelineConfig::default();
        let first = process(table, &config).unwrap();
        let second = process(first.table.clone(), &config).unwrap();

        prop_assert_eq!(
            &first.diagnostics.output_fingerprint,
            &second.diagnostics.output_fingerprint
        );
        prop_assert_eq!(&first.table, &second.table);
        prop_assert_eq!(first.score.value, second.score.value);
        prop_assert!(second.diagnostics.conversions.is_empty());
    }

    #[test]
    fn prop_conversion_only_loses_failed_cells(cells in text_column()) {
        let coercer = TypeCoercer::new(
            CoercionConfig::default(),
            PipelineConfig::default().normalizer.null_token_set(),
        );
        let null_tokens = PipelineConfig::default().normalizer.null_token_set();
        let already_missing = cells.iter().filter(|c| null_tokens.is_null(c)).count();

        let mut column = Column::new(
            "values",
            cells.iter().map(|c| Value::text(c.as_str())).collect(),
        );
        let conversion = coercer.coerce_column(&mut column);

        if conversion.is_conversion() {
            prop_assert_eq!(column.missing_count(), already_missing + conversion.failed);
            prop_assert_eq!(
                conversion.converted + conversion.failed + already_missing,
                cells.len()
            );
        } else {
            prop_assert_eq!(column.missing_count(), 0);
        }
    }
}

#[test]
fn test_all_blank_table_survives() {
    let table = Table::from_rows(vec![vec!["".into(), " ".into()], vec!["null".into(), "".into()]])
        .unwrap();
    let output = process(table, &PipelineConfig::default()).unwrap();
    assert!(output.score.value >= 0.0 && output.score.value <= 1.0);
}
