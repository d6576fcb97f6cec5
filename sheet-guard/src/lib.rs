//! # sheet-guard - Spreadsheet Cleaning and Quality Scoring for Rust
//!
//! sheet-guard takes an already-parsed spreadsheet-like table, repairs its
//! headers, infers column types, cleans cell values, resolves duplicate rows
//! and scores the result. Every run returns the cleaned table, a composite
//! quality score and a structured diagnostics record explaining each
//! decision.
//!
//! ## Quick Start
//!
//! ```rust
//! use sheet_guard::prelude::*;
//!
//! # fn main() -> sheet_guard::error::Result<()> {
//! // A sheet exported without a header row recognized by the reader
//! let raw = Table::from_rows(vec![
//!     vec!["Customer".into(), "Signup Date".into(), "Spend".into()],
//!     vec!["  Ada ".into(), "2024-01-05".into(), "$1,200.50".into()],
//!     vec!["Grace".into(), "2024-02-11".into(), "N/A".into()],
//!     vec!["Linus".into(), "2024-03-20".into(), "$310".into()],
//! ])?;
//!
//! let output = process(raw, &PipelineConfig::default())?;
//!
//! assert_eq!(output.table.column_names(), vec!["Customer", "Signup Date", "Spend"]);
//! println!("Quality: {}", output.score);
//! for conversion in output.diagnostics.applied_conversions() {
//!     println!("{} -> {}", conversion.column, conversion.semantic_type);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! | Stage               | Does                                                          |
//! |---------------------|---------------------------------------------------------------|
//! | `EmptyPruner`       | drops rows and columns without a single non-empty cell        |
//! | `HeaderResolver`    | decides whether row 0 is a header, repairs placeholder names  |
//! | `TypeCoercer`       | infers integer/float/currency/boolean/temporal/text columns   |
//! | `ValueNormalizer`   | trims text, standardizes null tokens, repairs mojibake        |
//! | `DuplicateResolver` | removes exact duplicate rows unless they are too common       |
//! | `QualityScorer`     | completeness, uniqueness, consistency and validity + bonuses  |
//!
//! No stage fails on a malformed cell. Only structurally invalid input
//! (ragged rows, a table with no columns) and invalid configuration are
//! reported as errors.
//!
//! ## Architecture
//!
//! - **`core`**: `Table`, `Value`, `Pipeline` and the `Diagnostics` record
//! - **`stages`**: the cleaning stages and their strategy tables
//! - **`scoring`**: the quality scorer
//! - **`suggestions`**: follow-up recommendations for the cleaned table
//! - **`config`**: `PipelineConfig` and its builder
//! - **`sources`**: CSV (and, with the `xlsx` feature, Excel) readers
//! - **`interop`**: Arrow `RecordBatch` export
//! - **`formatters`**: human, JSON and Markdown reports
//! - **`logging`**: `tracing` configuration helpers
//!
//! ## Examples
//!
//! See the `demos` crate for complete programs:
//!
//! - `clean_csv.rs`: clean a CSV file and print a report
//! - `rank_sheets.rs`: pick the best sheet out of several candidates
//! - `structured_logging.rs`: JSON logs for a pipeline run

pub mod config;
pub mod core;
pub mod error;
pub mod formatters;
pub mod interop;
pub mod logging;
pub mod patterns;
pub mod prelude;
pub mod scoring;
pub mod sources;
pub mod stages;
pub mod suggestions;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
