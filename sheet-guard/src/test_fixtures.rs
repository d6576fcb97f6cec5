//! Common test fixtures for data-cleaning scenarios.
//!
//! These builders produce raw tables with the problems the pipeline is meant
//! to fix: header rows read as data, currency strings, null tokens, stray
//! whitespace, mis-decoded characters and repeated rows.

use crate::config::PipelineConfig;
use crate::core::{process, Column, PipelineOutput, Table, Value};
use crate::error::Result;

/// Builds a headerless table from string rows, the way a reader without
/// header detection would.
pub fn raw_table(rows: &[&[&str]]) -> Result<Table> {
    Table::from_rows(
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect(),
    )
}

/// Runs the pipeline with the default configuration.
pub fn run_default(table: Table) -> Result<PipelineOutput> {
    process(table, &PipelineConfig::default())
}

/// A sales export with a header row read as data, currency strings, null
/// tokens, padded text, one mis-decoded name and one repeated row.
pub fn messy_sales_table() -> Result<Table> {
    raw_table(&[
        &["Customer", "Region", "Order Date", "Total", "Paid"],
        &["  Ada Lovelace ", "North", "2024-01-05", "$1,200.50", "yes"],
        &["Grace Hopper", "South", "2024-01-09", "$980.00", "no"],
        &["RenÃ© Descartes", "North", "2024-02-14", "N/A", "yes"],
        &["Alan Turing", "East", "2024-02-20", "$3,000", "no"],
        &["Grace Hopper", "South", "2024-01-09", "$980.00", "no"],
        &["Edsger Dijkstra", "North", "2024-03-02", "$45.10", "yes"],
        &["Barbara Liskov", "South", "2024-03-11", "$610.00", "yes"],
        &["Donald Knuth", "East", "2024-03-15", "$1,050.00", "no"],
        &["Margaret Hamilton", "North", "2024-03-28", "$2,300.75", "yes"],
        &["John Backus", "East", "2024-04-02", "$120.00", "null"],
    ])
}

/// A fully populated table with caller-supplied meaningful names.
pub fn clean_named_table() -> Result<Table> {
    Table::with_header(
        vec!["Name".into(), "Sales".into(), "Date".into()],
        vec![
            vec!["Ada".into(), "1200".into(), "2024-01-05".into()],
            vec!["Grace".into(), "980".into(), "2024-01-09".into()],
            vec!["Alan".into(), "3000".into(), "2024-02-20".into()],
            vec!["Edsger".into(), "45".into(), "2024-03-02".into()],
            vec!["Barbara".into(), "610".into(), "2024-03-11".into()],
        ],
    )
}

/// Numeric data with no header row at all.
pub fn headerless_numeric_table() -> Result<Table> {
    raw_table(&[
        &["10", "2.5", "100"],
        &["11", "3.5", "200"],
        &["12", "4.5", "300"],
        &["13", "5.5", "400"],
    ])
}

/// A single integer column holding `unique` distinct values followed by
/// `duplicates` copies of the first one.
pub fn table_with_duplicates(unique: usize, duplicates: usize) -> Result<Table> {
    let values = (0..unique)
        .map(|i| Value::Integer(i as i64))
        .chain(std::iter::repeat(Value::Integer(0)).take(duplicates))
        .collect();
    Table::new(vec![Column::new("reading", values)])
}

/// Text-only table whose first row no header rule can classify.
pub fn ambiguous_header_table() -> Result<Table> {
    raw_table(&[
        &["alpha", "beta"],
        &["gamma", "delta"],
        &["epsilon", "zeta"],
        &["eta", "theta"],
    ])
}
