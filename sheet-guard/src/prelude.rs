//! Prelude for commonly used types and traits in sheet-guard.

pub use crate::config::PipelineConfig;
pub use crate::core::{process, Pipeline, PipelineOutput, Table, Value};
pub use crate::error::{ErrorContext, Result, SheetError};
pub use crate::formatters::{FormatterConfig, ResultFormatter};
pub use crate::logging::LogConfig;
