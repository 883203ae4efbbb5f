// In: src/page/builder.rs

//! The write side of the page format.
//!
//! A `PageBuilder` accumulates field values for the record currently being
//! assembled, commits rows with `add_record()`, and decides when a batch is
//! big enough to hand downstream. It holds exactly one buffer at a time;
//! dropping the builder without `finish()` returns that buffer to the pool
//! (via the buffer's own deterministic release) and discards any pending
//! uncommitted records. It never flushes on drop.

use std::sync::Arc;

use bitvec::prelude::*;

use crate::buffer::{Buffer, BufferAllocator};
use crate::config::PageBuilderConfig;
use crate::error::BulkrowError;
use crate::json::{JsonValue, WireValue};
use crate::schema::{ColumnType, Schema};
use crate::time::Timestamp;

use super::format::{self, RowLayout, PAGE_HEADER_SIZE};
use super::page::{Page, PageOutput};

/// A pending field value for the record being assembled. Variable-length
/// values carry their payload bytes plus the presumed size that feeds the
/// flush heuristic.
enum FieldValue {
    Boolean(bool),
    Long(i64),
    Double(f64),
    Variable { payload: Vec<u8>, presumed: usize },
}

pub struct PageBuilder {
    schema: Arc<Schema>,
    layout: RowLayout,
    allocator: BufferAllocator,
    config: PageBuilderConfig,
    output: Box<dyn PageOutput>,

    /// The one buffer this builder owns; `None` only after `finish()`.
    buffer: Option<Buffer>,
    /// Bytes of header + committed fixed rows.
    fixed_end: usize,
    record_count: u32,
    /// Variable region accumulated for the in-progress page; slot
    /// references are relative to its start, so no fix-up is needed later.
    var_bytes: Vec<u8>,
    /// Sum of presumed sizes of committed variable values.
    var_estimate: usize,

    // Current record scratch: one slot per column, bit set = null.
    values: Vec<Option<FieldValue>>,
    nulls: BitVec<u8, Lsb0>,

    finished: bool,
}

impl PageBuilder {
    pub fn new(
        allocator: BufferAllocator,
        schema: Arc<Schema>,
        output: Box<dyn PageOutput>,
    ) -> Result<Self, BulkrowError> {
        Self::with_config(allocator, schema, output, PageBuilderConfig::default())
    }

    pub fn with_config(
        allocator: BufferAllocator,
        schema: Arc<Schema>,
        output: Box<dyn PageOutput>,
        config: PageBuilderConfig,
    ) -> Result<Self, BulkrowError> {
        let layout = RowLayout::of(&schema);
        let buffer = allocator.allocate(config.page_allocation_bytes)?;
        let columns = schema.len();
        Ok(Self {
            schema,
            layout,
            allocator,
            config,
            output,
            buffer: Some(buffer),
            fixed_end: PAGE_HEADER_SIZE,
            record_count: 0,
            var_bytes: Vec::new(),
            var_estimate: 0,
            values: (0..columns).map(|_| None).collect(),
            nulls: bitvec![u8, Lsb0; 1; columns],
            finished: false,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    //==============================================================================
    // Setters
    //==============================================================================

    /// Explicitly nulls the column for the current record. Columns never
    /// set are null anyway; this also clears a previously set value.
    pub fn set_null(&mut self, index: usize) -> Result<(), BulkrowError> {
        self.ensure_open()?;
        self.schema.column(index)?;
        self.values[index] = None;
        self.nulls.set(index, true);
        Ok(())
    }

    pub fn set_boolean(&mut self, index: usize, value: bool) -> Result<(), BulkrowError> {
        self.set_field(index, ColumnType::Boolean, FieldValue::Boolean(value))
    }

    pub fn set_long(&mut self, index: usize, value: i64) -> Result<(), BulkrowError> {
        self.set_field(index, ColumnType::Long, FieldValue::Long(value))
    }

    pub fn set_double(&mut self, index: usize, value: f64) -> Result<(), BulkrowError> {
        self.set_field(index, ColumnType::Double, FieldValue::Double(value))
    }

    pub fn set_string(&mut self, index: usize, value: &str) -> Result<(), BulkrowError> {
        let payload = value.as_bytes().to_vec();
        let presumed = payload.len() + 4;
        self.set_field(
            index,
            ColumnType::String,
            FieldValue::Variable { payload, presumed },
        )
    }

    pub fn set_timestamp(&mut self, index: usize, value: Timestamp) -> Result<(), BulkrowError> {
        let mut payload = Vec::with_capacity(12);
        payload.extend_from_slice(&value.epoch_second().to_le_bytes());
        payload.extend_from_slice(&value.nano().to_le_bytes());
        self.set_field(
            index,
            ColumnType::Timestamp,
            FieldValue::Variable {
                payload,
                presumed: 12,
            },
        )
    }

    pub fn set_json(&mut self, index: usize, value: &JsonValue) -> Result<(), BulkrowError> {
        let presumed = value.presume_reference_size_in_bytes();
        let payload = value.to_json().into_bytes();
        self.set_field(
            index,
            ColumnType::Json,
            FieldValue::Variable { payload, presumed },
        )
    }

    /// Legacy wire-format entry point; normalized to `JsonValue` immediately
    /// so the page encoder has exactly one code path.
    pub fn set_json_wire(&mut self, index: usize, value: &WireValue) -> Result<(), BulkrowError> {
        let json = JsonValue::from_wire(value)?;
        self.set_json(index, &json)
    }

    fn set_field(
        &mut self,
        index: usize,
        requested: ColumnType,
        value: FieldValue,
    ) -> Result<(), BulkrowError> {
        self.ensure_open()?;
        let column = self.schema.column(index)?;
        if column.column_type() != requested {
            return Err(BulkrowError::ColumnTypeMismatch {
                column: column.name().to_string(),
                actual: column.column_type().name(),
                requested: requested.name(),
            });
        }
        self.values[index] = Some(value);
        self.nulls.set(index, false);
        Ok(())
    }

    //==============================================================================
    // Record and page lifecycle
    //==============================================================================

    /// Commits the current record, resets every column to unset, and eagerly
    /// flushes once the accumulated estimate passes the configured threshold.
    /// The threshold is advisory and checked only here, never mid-record, so
    /// a single oversized record still lands whole.
    pub fn add_record(&mut self) -> Result<(), BulkrowError> {
        self.ensure_open()?;
        let stride = self.layout.stride();

        if self.fixed_end + stride > self.held_buffer()?.capacity() {
            // The fixed region is out of room; hand off what we have.
            self.flush_committed()?;
            if self.fixed_end + stride > self.held_buffer()?.capacity() {
                // A single row wider than the standard allocation.
                self.buffer = Some(self.allocator.allocate(self.fixed_end + stride)?);
            }
        }

        self.write_row()?;
        self.record_count += 1;
        self.fixed_end += stride;
        for value in &mut self.values {
            if let Some(FieldValue::Variable { presumed, .. }) = value {
                self.var_estimate += *presumed;
            }
            *value = None;
        }
        self.nulls.fill(true);

        if self.fixed_end + self.var_estimate > self.config.flush_threshold_bytes {
            self.flush_committed()?;
        }
        Ok(())
    }

    /// Finalizes the committed records into an immutable page and pushes it
    /// downstream. Flushing with zero committed records is a no-op: no page
    /// is emitted and the held buffer is untouched.
    pub fn flush(&mut self) -> Result<(), BulkrowError> {
        self.ensure_open()?;
        self.flush_committed()
    }

    /// Flushes any pending partial page and signals end-of-stream. The
    /// builder is unusable afterwards; its buffer goes back to the pool.
    pub fn finish(&mut self) -> Result<(), BulkrowError> {
        self.ensure_open()?;
        self.flush_committed()?;
        self.output.finish()?;
        self.finished = true;
        self.buffer = None;
        Ok(())
    }

    fn flush_committed(&mut self) -> Result<(), BulkrowError> {
        if self.record_count == 0 {
            log::trace!("flush with no committed records: no page emitted");
            return Ok(());
        }

        let total = self.fixed_end + self.var_bytes.len();
        let mut buffer = self
            .buffer
            .take()
            .ok_or(BulkrowError::Lifecycle("builder buffer already released"))?;
        if buffer.capacity() < total {
            let mut bigger = self.allocator.allocate(total)?;
            bigger.bytes_mut()[..self.fixed_end]
                .copy_from_slice(&buffer.bytes_mut()[..self.fixed_end]);
            buffer = bigger;
        }

        format::write_header(
            buffer.bytes_mut(),
            self.record_count,
            self.layout.stride() as u32,
        );
        buffer.bytes_mut()[self.fixed_end..total].copy_from_slice(&self.var_bytes);
        buffer.set_limit(total);

        let page = Page::new(Arc::clone(&self.schema), buffer)?;
        log::debug!(
            "flushing page: records={} bytes={} estimate={}",
            self.record_count,
            total,
            self.fixed_end + self.var_estimate,
        );
        self.output.push(page)?;

        self.buffer = Some(self.allocator.allocate(self.config.page_allocation_bytes)?);
        self.fixed_end = PAGE_HEADER_SIZE;
        self.record_count = 0;
        self.var_bytes.clear();
        self.var_estimate = 0;
        Ok(())
    }

    /// Encodes the scratch row into the fixed region at `fixed_end`,
    /// spilling variable payloads into the pending variable region.
    fn write_row(&mut self) -> Result<(), BulkrowError> {
        let row_start = self.fixed_end;
        let stride = self.layout.stride();
        let bitmap_bytes = self.layout.bitmap_bytes();
        let buffer = self
            .buffer
            .as_mut()
            .ok_or(BulkrowError::Lifecycle("builder buffer already released"))?;
        let row = &mut buffer.bytes_mut()[row_start..row_start + stride];
        row.fill(0);
        row[..bitmap_bytes].copy_from_slice(self.nulls.as_raw_slice());

        for (index, value) in self.values.iter().enumerate() {
            let offset = self.layout.slot_offset(index);
            match value {
                None => {} // zeroed slot, bitmap already says null
                Some(FieldValue::Boolean(b)) => row[offset] = u8::from(*b),
                Some(FieldValue::Long(n)) => {
                    row[offset..offset + 8].copy_from_slice(&n.to_le_bytes())
                }
                Some(FieldValue::Double(d)) => {
                    row[offset..offset + 8].copy_from_slice(&d.to_bits().to_le_bytes())
                }
                Some(FieldValue::Variable { payload, .. }) => {
                    // A position or length past u32 cannot be referenced;
                    // failing beats writing a wrapped reference.
                    let (var_offset, length) =
                        format::checked_reference(self.var_bytes.len(), payload.len())?;
                    format::write_reference(&mut row[offset..offset + 8], var_offset, length);
                    self.var_bytes.extend_from_slice(payload);
                }
            }
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), BulkrowError> {
        if self.finished {
            return Err(BulkrowError::Lifecycle("page builder used after finish()"));
        }
        Ok(())
    }

    fn held_buffer(&self) -> Result<&Buffer, BulkrowError> {
        self.buffer
            .as_ref()
            .ok_or(BulkrowError::Lifecycle("builder buffer already released"))
    }
}

impl Drop for PageBuilder {
    fn drop(&mut self) {
        // The held buffer releases itself back to the pool. Committed but
        // unflushed records are discarded, per the disposal contract.
        if !self.finished && self.record_count > 0 {
            log::debug!(
                "page builder dropped with {} unflushed records; discarding",
                self.record_count
            );
        }
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
