//! Readers that turn files into [`Table`]s for the pipeline.
//!
//! The pipeline itself performs no I/O. These adapters sit on the caller's
//! side and keep cells raw: text stays text, blank fields stay blank, and
//! header handling is left to the header resolver unless a reader is told
//! the file has a header row.

use std::fmt::Debug;

use crate::prelude::*;

mod csv;
#[cfg(feature = "xlsx")]
mod xlsx;

pub use self::csv::{CsvOptions, CsvSource};
#[cfg(feature = "xlsx")]
pub use self::xlsx::{XlsxOptions, XlsxSource};

/// A source that can produce a table.
///
/// # Examples
///
/// ```rust,no_run
/// use sheet_guard::sources::{CsvSource, TableSource};
///
/// # fn main() -> sheet_guard::error::Result<()> {
/// let source = CsvSource::new("exports/orders.csv");
/// let table = source.read()?;
/// println!("{}: {} rows", source.description(), table.num_rows());
/// # Ok(())
/// # }
/// ```
pub trait TableSource: Debug + Send + Sync {
    /// Reads the source into a table.
    fn read(&self) -> Result<Table>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> String;
}

/// Pads `row` with missing cells up to `width`, or rejects it when it is
/// longer.
pub(crate) fn fit_row(row_idx: usize, mut row: Vec<Value>, width: usize) -> Result<Vec<Value>> {
    if row.len() > width {
        return Err(SheetError::structural_at(
            row_idx,
            format!("row {row_idx} has {} cells, expected at most {width}", row.len()),
        ));
    }
    row.resize(width, Value::Missing);
    Ok(row)
}

/// Column names for a header record: blank cells become positional
/// placeholders so the header resolver repairs them.
pub(crate) fn header_names(cells: impl IntoIterator<Item = String>) -> Vec<String> {
    cells
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            if name.trim().is_empty() {
                idx.to_string()
            } else {
                name
            }
        })
        .collect()
}
