//! Structured logging of pipeline decisions.
//!
//! Stage transitions, header repairs and scores are emitted as `tracing`
//! events. This example installs a JSON subscriber and runs the pipeline
//! with the verbose log preset, then again with the production preset.
//!
//! Override the filter with `RUST_LOG`, e.g. `RUST_LOG=sheet_guard=trace`.

use std::error::Error;

use sheet_guard::core::{Pipeline, Table};
use sheet_guard::logging::setup::{init_logging, LoggingConfig};
use sheet_guard::prelude::*;

fn messy_table() -> Result<Table> {
    Table::from_rows(vec![
        vec!["".into(), "Qty".into(), "Unit Price".into(), "".into()],
        vec!["bolts".into(), "12".into(), "$0.10".into(), "".into()],
        vec!["nuts".into(), "N/A".into(), "$0.05".into(), "".into()],
        vec!["washers".into(), "40".into(), "$0.02".into(), "".into()],
        vec!["".into(), "".into(), "".into(), "".into()],
    ])
}

fn main() -> std::result::Result<(), Box<dyn Error>> {
    init_logging(LoggingConfig::development().with_json_format(true))?;

    println!("--- verbose preset ---");
    let verbose = Pipeline::builder()
        .log_config(LogConfig::verbose())
        .build()?;
    let output = verbose.process(messy_table()?)?;
    println!("columns: {:?}", output.table.column_names());

    println!("--- production preset ---");
    let production = Pipeline::builder()
        .config(PipelineConfig::default())
        .log_config(LogConfig::production())
        .build()?;
    let output = production.process(messy_table()?)?;
    println!("score: {}", output.score);

    Ok(())
}
