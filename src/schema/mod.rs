//! Record shape description shared by every page produced or consumed in a task.
//!
//! A `Schema` is constructed once when a pipeline task starts and handed out
//! read-only (behind an `Arc`) to both the `PageBuilder` and every
//! `PageReader`. The ordinal index of a column is its position; nothing is
//! mutable once the schema exists.

use serde::{Deserialize, Serialize};

use crate::error::BulkrowError;

pub mod column_type;

pub use column_type::{ColumnType, REFERENCE_SLOT_SIZE};

/// One named, typed column at a fixed ordinal position.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Column {
    index: usize,
    name: String,
    column_type: ColumnType,
}

impl Column {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }
}

/// An ordered, immutable sequence of columns.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Builds a schema from `(name, type)` pairs in column order.
    pub fn new<N, I>(columns: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, ColumnType)>,
    {
        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(index, (name, column_type))| Column {
                index,
                name: name.into(),
                column_type,
            })
            .collect();
        Self { columns }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The column at ordinal `index`, or a schema-mismatch error when the
    /// index is out of range.
    pub fn column(&self, index: usize) -> Result<&Column, BulkrowError> {
        self.columns.get(index).ok_or(BulkrowError::SchemaMismatch {
            index,
            columns: self.columns.len(),
        })
    }

    /// Looks a column up by name.
    pub fn lookup(&self, name: &str) -> Result<&Column, BulkrowError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| BulkrowError::NoSuchColumn(name.to_string()))
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Starts a fluent builder; equivalent to `Schema::new` for callers
    /// that assemble columns one at a time.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }
}

/// Collects `(name, type)` pairs in column order before freezing them
/// into a `Schema`.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    columns: Vec<(String, ColumnType)>,
}

impl SchemaBuilder {
    pub fn add(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push((name.into(), column_type));
        self
    }

    pub fn build(self) -> Schema {
        Schema::new(self.columns)
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
