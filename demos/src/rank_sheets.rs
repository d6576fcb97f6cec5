//! Ranks several candidate sheets by quality score.
//!
//! A workbook often holds a raw export, a hand-edited copy and a scratch
//! sheet. Ranking them picks the one worth analysing.
//!
//! With the `xlsx` feature and a workbook path, every worksheet of the
//! workbook is ranked:
//!
//! ```text
//! cargo run --example rank_sheets --features xlsx -- book.xlsx
//! ```

use std::error::Error;

use sheet_guard::core::{Pipeline, SheetRanking, Table};
use sheet_guard::prelude::*;

fn raw(rows: &[&[&str]]) -> Result<Table> {
    Table::from_rows(
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect(),
    )
}

fn sample_sheets() -> Result<Vec<(&'static str, Table)>> {
    Ok(vec![
        (
            "scratch",
            raw(&[
                &["x", "", "todo"],
                &["", "", ""],
                &["n/a", "?", ""],
                &["", "12", "call back"],
            ])?,
        ),
        (
            "raw_export",
            raw(&[
                &["Product", "Price", "In Stock"],
                &["bolts", "$1.50", "yes"],
                &["nuts", "$0.75", "no"],
                &["washers", "N/A", "yes"],
                &["bolts", "$1.50", "yes"],
                &["screws", "$2.10", "null"],
            ])?,
        ),
        (
            "cleaned_copy",
            raw(&[
                &["Product", "Price", "In Stock"],
                &["bolts", "1.50", "yes"],
                &["nuts", "0.75", "no"],
                &["washers", "0.20", "yes"],
                &["screws", "2.10", "no"],
            ])?,
        ),
        ("empty", Table::default()),
    ])
}

#[cfg(feature = "xlsx")]
fn workbook_sheets(path: &str) -> Result<Vec<(String, Table)>> {
    sheet_guard::sources::XlsxSource::new(path).read_all()
}

fn print_ranking(ranking: &SheetRanking) {
    println!("Ranking:");
    for (position, sheet) in ranking.ranked.iter().enumerate() {
        println!(
            "  {}. {:<14} {} ({} rows x {} columns)",
            position + 1,
            sheet.name,
            sheet.output.score,
            sheet.output.table.num_rows(),
            sheet.output.table.num_columns()
        );
    }
    for failure in &ranking.failed {
        println!("  -  {:<14} skipped: {}", failure.name, failure.error);
    }
    if let Some(best) = ranking.best() {
        println!("\nBest sheet: {}", best.name);
    }
}

fn main() -> std::result::Result<(), Box<dyn Error>> {
    let pipeline = Pipeline::new(PipelineConfig::default())?;

    #[cfg(feature = "xlsx")]
    {
        if let Some(path) = std::env::args().nth(1) {
            print_ranking(&pipeline.rank_sheets(workbook_sheets(&path)?));
            return Ok(());
        }
    }

    print_ranking(&pipeline.rank_sheets(sample_sheets()?));
    Ok(())
}
