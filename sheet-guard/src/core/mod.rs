//! Core types for the sheet-guard cleaning pipeline.
//!
//! ## Overview
//!
//! - **[`Table`]** / **[`Column`]** / **[`Value`]**: the in-memory table every
//!   stage consumes and returns
//! - **[`Pipeline`]**: runs the stages in order and scores the result
//! - **[`Diagnostics`]**: read-only record of every decision taken in a run,
//!   accumulated through a [`DiagnosticsBuilder`]
//!
//! ## Architecture
//!
//! ```text
//! Pipeline
//!     ├── EmptyPruner
//!     ├── HeaderResolver ──┐
//!     ├── TypeCoercer      │ record into
//!     ├── ValueNormalizer  ├──────────────> DiagnosticsBuilder
//!     ├── EmptyPruner      │                      │
//!     ├── DuplicateResolver┘                      │ finish
//!     └── QualityScorer ───────────────────> Diagnostics
//! ```
//!
//! ## Example
//!
//! ```rust
//! use sheet_guard::config::PipelineConfig;
//! use sheet_guard::core::{process, Table};
//!
//! # fn main() -> sheet_guard::error::Result<()> {
//! let raw = Table::from_rows(vec![
//!     vec!["Name".into(), "Sales".into()],
//!     vec!["Ada".into(), "$1,200".into()],
//!     vec!["Grace".into(), "$950".into()],
//! ])?;
//!
//! let output = process(raw, &PipelineConfig::default())?;
//! assert_eq!(output.table.column_names(), vec!["Name", "Sales"]);
//! assert!(output.score.value > 0.9);
//! # Ok(())
//! # }
//! ```

pub mod diagnostics;
pub mod pipeline;
pub mod table;
pub mod value;

pub use diagnostics::{
    DiagnosticFlag, Diagnostics, DiagnosticsBuilder, DuplicateAction, DuplicateReport,
    HeaderAction, HeaderDecision, HeaderReport, NormalizationReport, RenameReason,
    TypeConversion,
};
pub use pipeline::{
    process, Pipeline, PipelineBuilder, PipelineOutput, RankedSheet, SheetFailure, SheetRanking,
};
pub use table::{Column, Table};
pub use value::{SemanticType, Value, ValueKey};
