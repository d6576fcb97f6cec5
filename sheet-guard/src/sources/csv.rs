//! CSV file source.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use tracing::{debug, instrument};

use super::{fit_row, header_names, TableSource};
use crate::prelude::*;

/// Options for reading CSV files.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter (default: `,`)
    pub delimiter: u8,
    /// Whether the first record holds column names (default: false; the
    /// header resolver decides)
    pub has_header: bool,
    /// Whether the reader trims fields (default: false; the value
    /// normalizer trims)
    pub trim: bool,
    /// Quote character (default: `"`)
    pub quote: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: false,
            trim: false,
            quote: b'"',
        }
    }
}

/// Reads a CSV file into a [`Table`].
///
/// Records may have different lengths: rows shorter than the table width are
/// padded with [`Value::Missing`], rows longer than the width are a
/// structural error. The width is the header's length when `has_header` is
/// set, otherwise the first record's length.
///
/// # Examples
///
/// ```rust
/// use sheet_guard::sources::{CsvOptions, CsvSource};
///
/// # fn main() -> sheet_guard::error::Result<()> {
/// let data = "name;qty\nbolts;12\nnuts\n";
/// let source = CsvSource::new("inline.csv").with_options(CsvOptions {
///     delimiter: b';',
///     has_header: true,
///     ..CsvOptions::default()
/// });
/// let table = source.read_from(data.as_bytes())?;
///
/// assert_eq!(table.column_names(), vec!["name", "qty"]);
/// assert_eq!(table.num_rows(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    options: CsvOptions,
}

impl CsvSource {
    /// Creates a CSV source with default options.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            options: CsvOptions::default(),
        }
    }

    /// Sets the reading options.
    pub fn with_options(mut self, options: CsvOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the field delimiter.
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.options.delimiter = delimiter;
        self
    }

    /// Declares whether the first record holds column names.
    pub fn has_header(mut self, has_header: bool) -> Self {
        self.options.has_header = has_header;
        self
    }

    /// Returns the path of this source.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads CSV data from any reader using this source's options.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn read_from<R: Read>(&self, reader: R) -> Result<Table> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .trim(if self.options.trim { Trim::All } else { Trim::None })
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = reader.records();
        let mut names: Option<Vec<String>> = None;
        if self.options.has_header {
            if let Some(record) = records.next() {
                names = Some(header_names(record?.iter().map(str::to_string)));
            }
        }

        let mut rows: Vec<Vec<Value>> = Vec::new();
        for (row_idx, record) in records.enumerate() {
            let record = record?;
            let width = match &names {
                Some(names) => names.len(),
                None => rows.first().map_or(record.len(), Vec::len),
            };
            let row = record.iter().map(|field| Value::from_raw(Some(field))).collect();
            rows.push(fit_row(row_idx, row, width)?);
        }

        let names = names.unwrap_or_else(|| {
            let width = rows.first().map_or(0, Vec::len);
            (0..width).map(|i| i.to_string()).collect()
        });

        debug!(rows = rows.len(), columns = names.len(), "Read CSV records");
        Table::from_value_rows(names, rows)
    }
}

impl TableSource for CsvSource {
    fn read(&self) -> Result<Table> {
        let file = File::open(&self.path).map_err(|e| {
            SheetError::data_source_with_source(
                "CSV",
                format!("Failed to open {}", self.path.display()),
                Box::new(e),
            )
        })?;
        self.read_from(file)
    }

    fn description(&self) -> String {
        format!("CSV file: {}", self.path.display())
    }
}
