//! Error types for the sheet-guard cleaning pipeline.
//!
//! The pipeline is a best-effort cleaner: malformed cells degrade to
//! [`Value::Missing`](crate::core::Value::Missing) or stay as text and are
//! reported through diagnostics. Only structural problems with the input,
//! configuration mistakes and adapter failures (file sources, Arrow export)
//! surface as a [`SheetError`].

use thiserror::Error;

/// The main error type for the sheet-guard library.
#[derive(Error, Debug)]
pub enum SheetError {
    /// The input is not a rectangular table.
    #[error("Structural error: {message}")]
    Structural {
        /// Human-readable description of the shape problem
        message: String,
        /// Zero-based row index where the problem was found, if known
        row: Option<usize>,
    },

    /// The input has no columns at all.
    #[error("Empty input: the table has no columns")]
    EmptyInput,

    /// Error related to pipeline configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from data source operations.
    #[error("Data source error: {message}")]
    DataSource {
        /// Type of data source (e.g., "CSV", "XLSX")
        source_type: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the CSV reader.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error when a required column is not found in the table.
    #[error("Column '{column}' not found in table")]
    ColumnNotFound { column: String },

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, SheetError>`.
///
/// # Examples
///
/// ```rust
/// use sheet_guard::error::Result;
///
/// fn clean_upload() -> Result<()> {
///     // cleaning logic here
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, SheetError>;

impl SheetError {
    /// Creates a structural error without a row location.
    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural {
            message: message.into(),
            row: None,
        }
    }

    /// Creates a structural error pointing at a specific row.
    pub fn structural_at(row: usize, message: impl Into<String>) -> Self {
        Self::Structural {
            message: message.into(),
            row: Some(row),
        }
    }

    /// Creates a new data source error.
    pub fn data_source(source_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new data source error with a source error.
    pub fn data_source_with_source(
        source_type: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Returns true for errors caused by the shape of the input table.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Structural { .. } | Self::EmptyInput)
    }
}

impl From<serde_json::Error> for SheetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::fmt::Error> for SheetError {
    fn from(_: std::fmt::Error) -> Self {
        Self::Internal("failed to write formatted output".to_string())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<SheetError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| match e.into() {
            SheetError::Internal(inner) => SheetError::Internal(format!("{msg}: {inner}")),
            other => SheetError::Internal(format!("{msg}: {other}")),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let msg = f();
            match e.into() {
                SheetError::Internal(inner) => SheetError::Internal(format!("{msg}: {inner}")),
                other => SheetError::Internal(format!("{msg}: {other}")),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_structural_error_display() {
        let err = SheetError::structural_at(3, "row 3 has 2 cells, expected 4");
        assert_eq!(
            err.to_string(),
            "Structural error: row 3 has 2 cells, expected 4"
        );
        assert!(err.is_input_error());
    }

    #[test]
    fn test_empty_input_display() {
        let err = SheetError::EmptyInput;
        assert_eq!(err.to_string(), "Empty input: the table has no columns");
        assert!(err.is_input_error());
    }

    #[test]
    fn test_data_source_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err =
            SheetError::data_source_with_source("CSV", "Could not open upload", Box::new(source));

        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "Data source error: Could not open upload");
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_error_context() {
        fn failing_operation() -> Result<()> {
            Err(SheetError::Internal("Something went wrong".to_string()))
        }

        let result = failing_operation().context("While exporting cleaned table");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("While exporting cleaned table"));
        assert!(err.to_string().contains("Something went wrong"));
    }

    #[test]
    fn test_with_context_wraps_io_error() {
        let io: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = io
            .with_context(|| "Reading sheet.csv".to_string())
            .unwrap_err();
        assert!(matches!(err, SheetError::Internal(_)));
        assert!(err.to_string().contains("Reading sheet.csv"));
    }
}
