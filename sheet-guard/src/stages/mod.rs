//! Cleaning stages run by the [`Pipeline`](crate::core::Pipeline).
//!
//! Each stage takes ownership of the table, records what it did in the
//! [`DiagnosticsBuilder`] it is handed, and returns the table for the next
//! stage. Stages never fail: malformed cells degrade to missing values or
//! stay as text.
//!
//! ```text
//! raw table
//!   └─ EmptyPruner      drop blank rows/columns
//!   └─ HeaderResolver   detect header row, repair names
//!   └─ TypeCoercer      infer and convert column types
//!   └─ ValueNormalizer  trim, null tokens, encoding repair
//!   └─ EmptyPruner      sweep rows emptied by conversion
//!   └─ DuplicateResolver
//! cleaned table ──> QualityScorer
//! ```

pub mod coercion;
pub mod duplicates;
pub mod header;
pub mod normalize;
pub mod prune;

pub use coercion::{TypeCoercer, TypeDetector, TYPE_DETECTORS};
pub use duplicates::DuplicateResolver;
pub use header::{
    HeaderProbe, HeaderResolver, HeaderRule, NameRule, RowVerdict, HEADER_RULES, NAME_RULES,
};
pub use normalize::{ValueNormalizer, MOJIBAKE_REPAIRS};
pub use prune::EmptyPruner;

use crate::core::{DiagnosticsBuilder, Table};

/// A single table transformation in the cleaning pipeline.
pub trait PipelineStage: std::fmt::Debug + Send + Sync {
    /// Returns the name of the stage, used in spans and log events.
    fn name(&self) -> &'static str;

    /// Applies the stage to the table, recording its decisions.
    fn apply(&self, table: Table, diagnostics: &mut DiagnosticsBuilder) -> Table;
}
