//! Excel workbook source (feature `xlsx`).

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, DataType, Range, Reader};
use chrono::NaiveTime;
use tracing::{debug, instrument};

use super::{fit_row, header_names, TableSource};
use crate::prelude::*;

/// Largest integer an `f64` represents exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Options for reading workbooks.
#[derive(Debug, Clone, Default)]
pub struct XlsxOptions {
    /// Worksheet to read; the first sheet when `None`
    pub sheet: Option<String>,
    /// Whether the first row holds column names (default: false)
    pub has_header: bool,
}

/// Reads worksheets of an Excel (or ODS) workbook into [`Table`]s.
///
/// Typed cells are preserved: numbers, booleans and dates arrive as typed
/// [`Value`]s, while text cells stay raw for the pipeline to clean.
#[derive(Debug, Clone)]
pub struct XlsxSource {
    path: PathBuf,
    options: XlsxOptions,
}

impl XlsxSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            options: XlsxOptions::default(),
        }
    }

    pub fn with_options(mut self, options: XlsxOptions) -> Self {
        self.options = options;
        self
    }

    /// Selects the worksheet to read.
    pub fn sheet(mut self, name: impl Into<String>) -> Self {
        self.options.sheet = Some(name.into());
        self
    }

    /// Reads every worksheet, in workbook order.
    ///
    /// The result can be handed straight to
    /// [`Pipeline::rank_sheets`](crate::core::Pipeline::rank_sheets).
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn read_all(&self) -> Result<Vec<(String, Table)>> {
        let mut workbook = open_workbook_auto(&self.path).map_err(|e| self.error("open", e))?;
        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| self.error("read worksheet", e))?;
            let table = self.range_to_table(&range)?;
            debug!(sheet = %name, rows = table.num_rows(), "Read worksheet");
            sheets.push((name, table));
        }
        Ok(sheets)
    }

    fn error(&self, action: &str, err: calamine::Error) -> SheetError {
        SheetError::data_source(
            "XLSX",
            format!("Failed to {action} {}: {err}", self.path.display()),
        )
    }

    fn range_to_table(&self, range: &Range<Data>) -> Result<Table> {
        let width = range.width();
        let mut rows = range.rows();

        let names = if self.options.has_header {
            match rows.next() {
                Some(header) => header_names(header.iter().map(|cell| cell_value(cell).to_string())),
                None => Vec::new(),
            }
        } else {
            (0..width).map(|i| i.to_string()).collect()
        };

        let rows = rows
            .enumerate()
            .map(|(row_idx, row)| fit_row(row_idx, row.iter().map(cell_value).collect(), width))
            .collect::<Result<Vec<_>>>()?;

        Table::from_value_rows(names, rows)
    }
}

impl TableSource for XlsxSource {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn read(&self) -> Result<Table> {
        let mut workbook = open_workbook_auto(&self.path).map_err(|e| self.error("open", e))?;
        let sheet = match &self.options.sheet {
            Some(name) => name.clone(),
            None => workbook.sheet_names().into_iter().next().ok_or_else(|| {
                SheetError::data_source("XLSX", format!("{} has no worksheets", self.path.display()))
            })?,
        };
        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| self.error("read worksheet", e))?;
        self.range_to_table(&range)
    }

    fn description(&self) -> String {
        match &self.options.sheet {
            Some(sheet) => format!("Excel workbook: {} [{sheet}]", self.path.display()),
            None => format!("Excel workbook: {}", self.path.display()),
        }
    }
}

/// Converts one worksheet cell.
fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Missing,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Value::text(s.as_str()),
        Data::Int(i) => Value::Integer(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER => {
            Value::Integer(*f as i64)
        }
        Data::Float(f) => Value::Float(*f),
        Data::Bool(b) => Value::Boolean(*b),
        Data::DateTime(_) => match cell.as_datetime() {
            Some(dt) if dt.time() == NaiveTime::MIN => Value::Date(dt.date()),
            Some(dt) => Value::DateTime(dt),
            None => Value::Missing,
        },
    }
}
