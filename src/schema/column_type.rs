//! This module defines the canonical, type-safe representation of column types
//! used throughout the bulkrow pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The number of bytes a variable-length reference occupies in the fixed
/// region: a u32 offset plus a u32 length into the variable region.
pub const REFERENCE_SLOT_SIZE: usize = 8;

/// The canonical, closed set of column types.
///
/// Equality is by kind only; there is no structural payload to compare.
/// Each kind has a fixed storage size in a page's fixed-width region.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Boolean,
    Long,
    Double,
    String,
    Timestamp,
    Json,
}

impl ColumnType {
    /// Bytes occupied by this type's slot in the fixed-width region.
    ///
    /// `String`, `Timestamp` and `Json` store a reference there; their
    /// payload lives in the variable-length region.
    pub fn fixed_storage_size(&self) -> usize {
        match self {
            Self::Boolean => 1,
            Self::Long => 8,
            Self::Double => 8,
            Self::String | Self::Timestamp | Self::Json => REFERENCE_SLOT_SIZE,
        }
    }

    /// Returns `true` if this type's payload lives in the variable region.
    pub fn is_variable_length(&self) -> bool {
        matches!(self, Self::String | Self::Timestamp | Self::Json)
    }

    /// The canonical lowercase name, matching the serde representation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Long => "long",
            Self::Double => "double",
            Self::String => "string",
            Self::Timestamp => "timestamp",
            Self::Json => "json",
        }
    }
}

/// Provides the canonical string representation for a `ColumnType`.
impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // These string representations are part of the public contract.
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_storage_sizes_match_the_page_layout() {
        assert_eq!(ColumnType::Boolean.fixed_storage_size(), 1);
        assert_eq!(ColumnType::Long.fixed_storage_size(), 8);
        assert_eq!(ColumnType::Double.fixed_storage_size(), 8);
        assert_eq!(ColumnType::String.fixed_storage_size(), REFERENCE_SLOT_SIZE);
        assert_eq!(ColumnType::Timestamp.fixed_storage_size(), REFERENCE_SLOT_SIZE);
        assert_eq!(ColumnType::Json.fixed_storage_size(), REFERENCE_SLOT_SIZE);
    }

    #[test]
    fn test_equality_is_by_kind() {
        assert_eq!(ColumnType::Long, ColumnType::Long);
        assert_ne!(ColumnType::Long, ColumnType::Double);
    }
}
