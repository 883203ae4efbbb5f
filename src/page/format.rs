// In: src/page/format.rs

//! The binary layout of a page. This module is the single source of truth
//! for header geometry, per-row slot placement and slot encoding; the
//! builder and the reader both derive their offsets from here.
//!
//! Layout (all integers little-endian within one page):
//!
//! ```text
//! [ header:  record_count u32 | row_stride u32 ]
//! [ fixed:   record_count x row_stride bytes,
//!            each row = null bitmap (1 bit per column, set = null)
//!                     + one fixed slot per column ]
//! [ var:     concatenated payload bytes for string/timestamp/json values,
//!            referenced from fixed slots by (offset u32, length u32)
//!            relative to the start of the variable region ]
//! ```

use crate::error::BulkrowError;
use crate::schema::Schema;

/// Bytes of the page header: record count plus row stride.
pub const PAGE_HEADER_SIZE: usize = 8;

/// Derived per-row geometry for one schema: where the null bitmap ends and
/// where each column's fixed slot starts, relative to the row start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLayout {
    bitmap_bytes: usize,
    slot_offsets: Vec<usize>,
    stride: usize,
}

impl RowLayout {
    pub fn of(schema: &Schema) -> Self {
        let bitmap_bytes = schema.len().div_ceil(8);
        let mut slot_offsets = Vec::with_capacity(schema.len());
        let mut offset = bitmap_bytes;
        for column in schema.columns() {
            slot_offsets.push(offset);
            offset += column.column_type().fixed_storage_size();
        }
        Self {
            bitmap_bytes,
            slot_offsets,
            stride: offset,
        }
    }

    pub fn bitmap_bytes(&self) -> usize {
        self.bitmap_bytes
    }

    /// Offset of column `index`'s fixed slot, relative to the row start.
    /// The caller has already bounds-checked `index` against the schema.
    pub fn slot_offset(&self, index: usize) -> usize {
        self.slot_offsets[index]
    }

    /// Total bytes per row: null bitmap plus all fixed slots.
    pub fn stride(&self) -> usize {
        self.stride
    }
}

/// Writes the page header into the first `PAGE_HEADER_SIZE` bytes.
pub fn write_header(bytes: &mut [u8], record_count: u32, stride: u32) {
    bytes[0..4].copy_from_slice(&record_count.to_le_bytes());
    bytes[4..8].copy_from_slice(&stride.to_le_bytes());
}

/// Reads `(record_count, stride)` back out of a page's header.
pub fn read_header(bytes: &[u8]) -> Result<(u32, u32), BulkrowError> {
    if bytes.len() < PAGE_HEADER_SIZE {
        return Err(BulkrowError::PageFormatError(format!(
            "page of {} bytes is smaller than the {}-byte header",
            bytes.len(),
            PAGE_HEADER_SIZE
        )));
    }
    let record_count = bytemuck::pod_read_unaligned::<u32>(&bytes[0..4]);
    let stride = bytemuck::pod_read_unaligned::<u32>(&bytes[4..8]);
    Ok((record_count, stride))
}

/// Converts a variable-region position and payload length into the u32
/// slot fields, rejecting anything the reference encoding cannot hold.
pub fn checked_reference(offset: usize, length: usize) -> Result<(u32, u32), BulkrowError> {
    let offset = u32::try_from(offset).map_err(|_| {
        BulkrowError::PageFormatError(format!(
            "variable region offset {} exceeds the reference encoding",
            offset
        ))
    })?;
    let length = u32::try_from(length).map_err(|_| {
        BulkrowError::PageFormatError(format!(
            "variable payload of {} bytes exceeds the reference encoding",
            length
        ))
    })?;
    Ok((offset, length))
}

/// Writes a variable-region reference into a fixed slot.
pub fn write_reference(slot: &mut [u8], offset: u32, length: u32) {
    slot[0..4].copy_from_slice(&offset.to_le_bytes());
    slot[4..8].copy_from_slice(&length.to_le_bytes());
}

/// Reads a `(offset, length)` reference back out of a fixed slot.
pub fn read_reference(slot: &[u8]) -> (u32, u32) {
    let offset = bytemuck::pod_read_unaligned::<u32>(&slot[0..4]);
    let length = bytemuck::pod_read_unaligned::<u32>(&slot[4..8]);
    (offset, length)
}

//==================================================================================
// Unit Tests
//==================================================================================
