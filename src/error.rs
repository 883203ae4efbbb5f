// In: src/error.rs

//! This module defines the single, unified error type for the entire bulkrow library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BulkrowError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to our library's logic)
    // =========================================================================
    #[error("Schema mismatch: column index {index} is out of range for a schema of {columns} columns")]
    SchemaMismatch { index: usize, columns: usize },

    #[error("No such column: '{0}'")]
    NoSuchColumn(String),

    #[error("Schema mismatch: page was built with row stride {page_stride}, this schema implies {schema_stride}")]
    ForeignSchemaPage {
        page_stride: usize,
        schema_stride: usize,
    },

    #[error("Wrong column type: column '{column}' is {actual}, accessed as {requested}")]
    ColumnTypeMismatch {
        column: String,
        actual: &'static str,
        requested: &'static str,
    },

    #[error("Lifecycle violation: {0}")]
    Lifecycle(&'static str),

    #[error("JSON type mismatch: expected {expected}, but the value is {actual}")]
    JsonTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Page format error: {0}")]
    PageFormatError(String),

    #[error("Task {index} of {count} failed: {message}")]
    TaskFailed {
        index: usize,
        count: usize,
        message: String,
    },

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === Resource Errors
    // =========================================================================
    /// Buffer allocation could not be satisfied. Always fatal to the current
    /// task; retry policy belongs to the host around `resume`.
    #[error("Buffer allocation of {requested} bytes failed: {reason}")]
    BufferAllocation { requested: usize, reason: String },

    // =========================================================================
    // === Parse/Format Errors (never silently defaulted)
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Timestamp parse error: '{text}': {reason}")]
    TimestampParse { text: String, reason: String },

    #[error("Wire value is not representable as JSON: {0}")]
    WireConversionError(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the underlying I/O subsystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically during document serialization.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}
