//! In-memory column-major table.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::value::{SemanticType, Value, ValueKey};
use crate::prelude::*;

/// A named column of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name; unique within a table once headers are resolved
    pub name: String,
    /// Inferred semantic type, `None` until the type coercer has run
    pub semantic_type: Option<SemanticType>,
    /// Cells aligned by row index
    pub values: Vec<Value>,
}

impl Column {
    /// Creates an untyped column.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            semantic_type: None,
            values,
        }
    }

    /// Creates a column with a known semantic type.
    pub fn typed(name: impl Into<String>, semantic_type: SemanticType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            semantic_type: Some(semantic_type),
            values,
        }
    }

    /// Creates an untyped column of text cells.
    pub fn from_strs(name: impl Into<String>, values: &[&str]) -> Self {
        Self::new(name, values.iter().map(|s| Value::text(*s)).collect())
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of missing cells.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }

    /// Iterator over non-missing cells.
    pub fn present(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().filter(|v| !v.is_missing())
    }

    /// Number of distinct non-missing values.
    pub fn distinct_count(&self) -> usize {
        self.present().map(Value::key).collect::<HashSet<_>>().len()
    }
}

/// An ordered sequence of named columns with a uniform row count.
///
/// # Examples
///
/// ```rust
/// use sheet_guard::core::Table;
///
/// let table = Table::from_rows(vec![
///     vec!["Name".to_string(), "Sales".to_string()],
///     vec!["Ada".to_string(), "1200".to_string()],
/// ])
/// .unwrap();
///
/// assert_eq!(table.num_columns(), 2);
/// assert_eq!(table.num_rows(), 2);
/// assert_eq!(table.column_names(), vec!["0", "1"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    columns: Vec<Column>,
    num_rows: usize,
}

/// Unchecked serde form of [`Table`].
#[derive(Deserialize)]
struct RawTable {
    columns: Vec<Column>,
    num_rows: usize,
}

impl TryFrom<RawTable> for Table {
    type Error = SheetError;

    fn try_from(raw: RawTable) -> Result<Self> {
        let table = Table::new(raw.columns)?;
        if !table.columns.is_empty() && table.num_rows != raw.num_rows {
            return Err(SheetError::structural(format!(
                "num_rows is {} but columns have {} cells",
                raw.num_rows, table.num_rows
            )));
        }
        Ok(table)
    }
}

impl Table {
    /// Creates a table from columns, checking that all columns have the same
    /// length.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let num_rows = columns.first().map_or(0, Column::len);
        if let Some(bad) = columns.iter().find(|c| c.len() != num_rows) {
            return Err(SheetError::structural(format!(
                "column '{}' has {} cells, expected {num_rows}",
                bad.name,
                bad.len()
            )));
        }
        Ok(Self { columns, num_rows })
    }

    /// Checks that every column still holds exactly `num_rows` cells.
    ///
    /// Needed after callers edit cells through [`Table::columns_mut`].
    pub fn check_shape(&self) -> Result<()> {
        match self.columns.iter().find(|c| c.len() != self.num_rows) {
            Some(bad) => Err(SheetError::structural(format!(
                "column '{}' has {} cells, expected {}",
                bad.name,
                bad.len(),
                self.num_rows
            ))),
            None => Ok(()),
        }
    }

    /// Creates a table from raw rows with positional placeholder names
    /// (`"0"`, `"1"`, ...). Every row, including the first, is treated as
    /// data; the header resolver decides later whether row 0 is a header.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Result<Self> {
        let width = rows.first().map_or(0, Vec::len);
        let names = (0..width).map(|i| i.to_string()).collect();
        Self::with_header(names, rows)
    }

    /// Creates a table from caller-supplied column names and raw rows.
    pub fn with_header(names: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let width = names.len();
        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(rows.len())))
            .collect();

        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(SheetError::structural_at(
                    row_idx,
                    format!("row {row_idx} has {} cells, expected {width}", row.len()),
                ));
            }
            for (column, cell) in columns.iter_mut().zip(row) {
                column.values.push(Value::Text(cell));
            }
        }

        Self::new(columns)
    }

    /// Creates a table from rows of already-built values with the given names.
    pub fn from_value_rows(names: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let width = names.len();
        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(rows.len())))
            .collect();

        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(SheetError::structural_at(
                    row_idx,
                    format!("row {row_idx} has {} cells, expected {width}", row.len()),
                ));
            }
            for (column, cell) in columns.iter_mut().zip(row) {
                column.values.push(cell);
            }
        }

        Self::new(columns)
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Total number of cells.
    pub fn num_cells(&self) -> usize {
        self.num_rows * self.columns.len()
    }

    /// Returns true if the table has no columns or no rows.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.num_rows == 0
    }

    /// All columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Mutable access to the columns. Cell counts must not be changed through
    /// this handle; use [`Table::retain_rows`] to drop rows.
    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    /// Consumes the table, returning its columns.
    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| SheetError::ColumnNotFound {
                column: name.to_string(),
            })
    }

    /// Returns a copy of the cells in row `idx`.
    pub fn row(&self, idx: usize) -> Option<Vec<Value>> {
        (idx < self.num_rows).then(|| self.columns.iter().map(|c| c.values[idx].clone()).collect())
    }

    /// Hashable identity of row `idx`.
    pub fn row_key(&self, idx: usize) -> Vec<ValueKey> {
        self.columns.iter().map(|c| c.values[idx].key()).collect()
    }

    /// For every row, whether it exactly repeats an earlier row.
    pub fn duplicate_mask(&self) -> Vec<bool> {
        let mut seen = HashSet::with_capacity(self.num_rows);
        (0..self.num_rows)
            .map(|idx| !seen.insert(self.row_key(idx)))
            .collect()
    }

    /// Number of rows that exactly repeat an earlier row.
    pub fn duplicate_row_count(&self) -> usize {
        self.duplicate_mask().into_iter().filter(|d| *d).count()
    }

    /// Keeps only the rows for which `keep[row]` is true, preserving order.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.num_rows);
        for column in &mut self.columns {
            let mut flags = keep.iter();
            column.values.retain(|_| *flags.next().unwrap_or(&true));
        }
        self.num_rows = keep.iter().filter(|k| **k).count();
    }

    /// Removes the first row and returns its cells.
    pub fn take_first_row(&mut self) -> Option<Vec<Value>> {
        if self.num_rows == 0 {
            return None;
        }
        let row = self
            .columns
            .iter_mut()
            .map(|c| c.values.remove(0))
            .collect();
        self.num_rows -= 1;
        Some(row)
    }

    /// Keeps only the columns for which `keep[col]` is true.
    pub fn retain_columns(&mut self, keep: &[bool]) {
        let mut flags = keep.iter();
        self.columns.retain(|_| *flags.next().unwrap_or(&true));
        if self.columns.is_empty() {
            self.num_rows = 0;
        }
    }

    /// SHA-256 fingerprint over names, semantic types and cells.
    ///
    /// Two tables with the same fingerprint are identical for every purpose
    /// the pipeline cares about.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.num_rows.to_le_bytes());
        for column in &self.columns {
            hasher.update(column.name.as_bytes());
            hasher.update([0x1f]);
            let ty = column.semantic_type.map_or("untyped", |t| t.type_name());
            hasher.update(ty.as_bytes());
            hasher.update([0x1e]);
            for value in &column.values {
                hasher.update(value.kind_name().as_bytes());
                hasher.update([0x1d]);
                hasher.update(value.to_string().as_bytes());
                hasher.update([0x1c]);
            }
        }
        hex::encode(hasher.finalize())
    }
}
