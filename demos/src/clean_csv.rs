//! Cleans a CSV export and prints the result in every report format.
//!
//! Pass a path to clean your own file:
//!
//! ```text
//! cargo run --example clean_csv -- exports/orders.csv
//! ```
//!
//! Without an argument a small messy export is written to a temporary
//! directory and cleaned instead.

use std::error::Error;
use std::fs;

use sheet_guard::formatters::{HumanFormatter, JsonFormatter, MarkdownFormatter};
use sheet_guard::interop::to_record_batch;
use sheet_guard::prelude::*;
use sheet_guard::sources::{CsvSource, TableSource};

const SAMPLE: &str = "\
Customer,Region,Order Date,Total,Paid
  Ada Lovelace ,North,2024-01-05,\"$1,200.50\",yes
Grace Hopper,South,2024-01-09,$980.00,no
RenÃ© Descartes,North,2024-02-14,N/A,yes
Alan Turing,East,2024-02-20,\"$3,000\",no
Grace Hopper,South,2024-01-09,$980.00,no
Edsger Dijkstra,North,2024-03-02,$45.10,yes
Barbara Liskov,South,2024-03-11,$610.00,yes
Donald Knuth,East,2024-03-15,\"$1,050.00\",no
Margaret Hamilton,North,2024-03-28,\"$2,300.75\",yes
John Backus,East,2024-04-02,$120.00,null
";

fn main() -> std::result::Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = match std::env::args().nth(1) {
        Some(path) => path.into(),
        None => {
            let path = dir.path().join("orders.csv");
            fs::write(&path, SAMPLE)?;
            path
        }
    };

    let source = CsvSource::new(&path);
    println!("Reading {}\n", source.description());
    let table = source.read()?;

    let output = process(table, &PipelineConfig::default())?;

    println!("=== Human-readable report ===");
    println!("{}", HumanFormatter::new().format(&output)?);

    println!("=== Markdown report ===");
    println!(
        "{}",
        MarkdownFormatter::with_config(FormatterConfig::minimal()).format(&output)?
    );

    println!("=== JSON report (CI preset) ===");
    println!(
        "{}",
        JsonFormatter::with_config(FormatterConfig::ci()).format(&output)?
    );

    let batch = to_record_batch(&output.table)?;
    println!("=== Arrow schema ===");
    for field in batch.schema().fields() {
        println!("  {}: {}", field.name(), field.data_type());
    }

    Ok(())
}
