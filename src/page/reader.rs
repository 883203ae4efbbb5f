// In: src/page/reader.rs

//! The read side of the page format: a finite, single-pass, non-restartable
//! cursor over one page's records, bound to the same schema the page was
//! built with. To re-read a page, open a new reader over it.

use std::sync::Arc;

use crate::error::BulkrowError;
use crate::json::JsonValue;
use crate::schema::{ColumnType, Schema};
use crate::time::Timestamp;

use super::format::{self, RowLayout, PAGE_HEADER_SIZE};
use super::page::Page;

pub struct PageReader<'a> {
    schema: Arc<Schema>,
    layout: RowLayout,
    bytes: &'a [u8],
    record_count: usize,
    var_start: usize,
    /// Record index of the cursor; `None` before the first `next_record()`.
    cursor: Option<usize>,
    exhausted: bool,
}

impl<'a> PageReader<'a> {
    /// Opens a reader over `page`. The page's recorded row stride must match
    /// what `schema` implies; a page built against a different schema is
    /// rejected up front rather than misread.
    pub fn new(schema: Arc<Schema>, page: &'a Page) -> Result<Self, BulkrowError> {
        let bytes = page.bytes();
        let (record_count, stride) = format::read_header(bytes)?;
        let layout = RowLayout::of(&schema);
        if stride as usize != layout.stride() {
            return Err(BulkrowError::ForeignSchemaPage {
                page_stride: stride as usize,
                schema_stride: layout.stride(),
            });
        }
        let var_start = PAGE_HEADER_SIZE + record_count as usize * layout.stride();
        if var_start > bytes.len() {
            return Err(BulkrowError::PageFormatError(format!(
                "fixed region ends at {} but the page has only {} bytes",
                var_start,
                bytes.len()
            )));
        }
        Ok(Self {
            schema,
            layout,
            bytes,
            record_count: record_count as usize,
            var_start,
            cursor: None,
            exhausted: false,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Advances to the next record. Returns `false` once the page is
    /// exhausted; after that, every field access is a lifecycle error.
    pub fn next_record(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        let next = self.cursor.map_or(0, |i| i + 1);
        if next >= self.record_count {
            self.exhausted = true;
            return false;
        }
        self.cursor = Some(next);
        true
    }

    //==============================================================================
    // Field accessors
    //==============================================================================

    pub fn is_null(&self, index: usize) -> Result<bool, BulkrowError> {
        self.schema.column(index)?;
        let row = self.current_row()?;
        Ok(row[index / 8] >> (index % 8) & 1 == 1)
    }

    /// Reads a boolean cell. The value of a null cell is the zeroed slot
    /// (`false`); callers distinguish null via `is_null`.
    pub fn get_boolean(&self, index: usize) -> Result<bool, BulkrowError> {
        let slot = self.slot(index, ColumnType::Boolean, 1)?;
        Ok(slot[0] != 0)
    }

    pub fn get_long(&self, index: usize) -> Result<i64, BulkrowError> {
        let slot = self.slot(index, ColumnType::Long, 8)?;
        Ok(bytemuck::pod_read_unaligned::<i64>(slot))
    }

    pub fn get_double(&self, index: usize) -> Result<f64, BulkrowError> {
        let slot = self.slot(index, ColumnType::Double, 8)?;
        Ok(f64::from_bits(bytemuck::pod_read_unaligned::<u64>(slot)))
    }

    /// Reads a string cell; a null cell reads as the empty string.
    pub fn get_string(&self, index: usize) -> Result<&'a str, BulkrowError> {
        let payload = self.var_payload(index, ColumnType::String)?;
        std::str::from_utf8(payload)
            .map_err(|e| BulkrowError::PageFormatError(format!("invalid UTF-8 payload: {}", e)))
    }

    /// Reads a timestamp cell; a null cell reads as the epoch.
    pub fn get_timestamp(&self, index: usize) -> Result<Timestamp, BulkrowError> {
        let payload = self.var_payload(index, ColumnType::Timestamp)?;
        if payload.is_empty() {
            return Ok(Timestamp::from_epoch_second(0));
        }
        if payload.len() != 12 {
            return Err(BulkrowError::PageFormatError(format!(
                "timestamp payload must be 12 bytes, got {}",
                payload.len()
            )));
        }
        let epoch_second = bytemuck::pod_read_unaligned::<i64>(&payload[0..8]);
        let nano = bytemuck::pod_read_unaligned::<u32>(&payload[8..12]);
        Ok(Timestamp::new(epoch_second, nano))
    }

    /// Reads and parses a JSON cell; a null cell reads as `JsonValue::Null`.
    /// Malformed payload text is a parse failure, never a silent null.
    pub fn get_json(&self, index: usize) -> Result<JsonValue, BulkrowError> {
        let payload = self.var_payload(index, ColumnType::Json)?;
        if payload.is_empty() {
            return Ok(JsonValue::Null);
        }
        let text = std::str::from_utf8(payload)
            .map_err(|e| BulkrowError::PageFormatError(format!("invalid UTF-8 payload: {}", e)))?;
        JsonValue::from_text(text)
    }

    //==============================================================================
    // Internals
    //==============================================================================

    fn current_row(&self) -> Result<&'a [u8], BulkrowError> {
        if self.exhausted {
            return Err(BulkrowError::Lifecycle("page reader is exhausted"));
        }
        let cursor = self.cursor.ok_or(BulkrowError::Lifecycle(
            "next_record() has not been called yet",
        ))?;
        let start = PAGE_HEADER_SIZE + cursor * self.layout.stride();
        Ok(&self.bytes[start..start + self.layout.stride()])
    }

    fn slot(
        &self,
        index: usize,
        requested: ColumnType,
        width: usize,
    ) -> Result<&'a [u8], BulkrowError> {
        let column = self.schema.column(index)?;
        if column.column_type() != requested {
            return Err(BulkrowError::ColumnTypeMismatch {
                column: column.name().to_string(),
                actual: column.column_type().name(),
                requested: requested.name(),
            });
        }
        let row = self.current_row()?;
        let offset = self.layout.slot_offset(index);
        Ok(&row[offset..offset + width])
    }

    fn var_payload(
        &self,
        index: usize,
        requested: ColumnType,
    ) -> Result<&'a [u8], BulkrowError> {
        let slot = self.slot(index, requested, 8)?;
        let (offset, length) = format::read_reference(slot);
        let start = self.var_start + offset as usize;
        let end = start + length as usize;
        if end > self.bytes.len() {
            return Err(BulkrowError::PageFormatError(format!(
                "variable reference ({}, {}) runs past the page end",
                offset, length
            )));
        }
        Ok(&self.bytes[start..end])
    }
}

//==================================================================================
// Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferAllocator;
    use crate::page::{PageBuilder, PageCollector, PageOutput};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedCollector(Rc<RefCell<PageCollector>>);

    impl PageOutput for SharedCollector {
        fn push(&mut self, page: Page) -> Result<(), BulkrowError> {
            self.0.borrow_mut().push(page)
        }
        fn finish(&mut self) -> Result<(), BulkrowError> {
            self.0.borrow_mut().finish()
        }
    }

    fn one_page(schema: &Arc<Schema>, build: impl FnOnce(&mut PageBuilder)) -> Page {
        let collector = SharedCollector::default();
        let handle = Rc::clone(&collector.0);
        let mut builder = PageBuilder::new(
            BufferAllocator::default(),
            Arc::clone(schema),
            Box::new(collector),
        )
        .unwrap();
        build(&mut builder);
        builder.finish().unwrap();
        drop(builder);
        let mut pages = Rc::try_unwrap(handle)
            .ok()
            .expect("builder dropped its output handle")
            .into_inner()
            .into_pages();
        assert_eq!(pages.len(), 1);
        pages.remove(0)
    }

    #[test]
    fn test_boolean_and_string_scenario_round_trips() {
        let schema = Arc::new(Schema::new([
            ("active", ColumnType::Boolean),
            ("name", ColumnType::String),
        ]));
        let page = one_page(&schema, |builder| {
            builder.set_boolean(0, false).unwrap();
            builder.set_string(1, "abc").unwrap();
            builder.add_record().unwrap();
        });

        let mut reader = PageReader::new(Arc::clone(&schema), &page).unwrap();
        assert!(reader.next_record());
        assert!(!reader.is_null(0).unwrap());
        assert!(!reader.get_boolean(0).unwrap());
        assert_eq!(reader.get_string(1).unwrap(), "abc");
        assert!(!reader.next_record());
        // The cursor stays exhausted; a second call is still false.
        assert!(!reader.next_record());
    }

    #[test]
    fn test_unset_columns_default_to_null() {
        let schema = Arc::new(Schema::new([
            ("a", ColumnType::Long),
            ("b", ColumnType::Long),
        ]));
        let page = one_page(&schema, |builder| {
            builder.set_long(0, 42).unwrap();
            builder.add_record().unwrap();
        });

        let mut reader = PageReader::new(Arc::clone(&schema), &page).unwrap();
        assert!(reader.next_record());
        assert!(!reader.is_null(0).unwrap());
        assert_eq!(reader.get_long(0).unwrap(), 42);
        assert!(reader.is_null(1).unwrap());
    }

    #[test]
    fn test_reads_before_first_next_and_after_exhaustion_fail() {
        let schema = Arc::new(Schema::new([("a", ColumnType::Long)]));
        let page = one_page(&schema, |builder| {
            builder.set_long(0, 1).unwrap();
            builder.add_record().unwrap();
        });

        let mut reader = PageReader::new(Arc::clone(&schema), &page).unwrap();
        assert!(matches!(
            reader.get_long(0),
            Err(BulkrowError::Lifecycle(_))
        ));

        assert!(reader.next_record());
        assert_eq!(reader.get_long(0).unwrap(), 1);
        assert!(!reader.next_record());
        assert!(matches!(
            reader.get_long(0),
            Err(BulkrowError::Lifecycle(_))
        ));
    }

    #[test]
    fn test_a_page_from_a_different_schema_is_rejected() {
        let written = Arc::new(Schema::new([("a", ColumnType::Long)]));
        let page = one_page(&written, |builder| {
            builder.set_long(0, 1).unwrap();
            builder.add_record().unwrap();
        });

        let other = Arc::new(Schema::new([
            ("a", ColumnType::Long),
            ("b", ColumnType::Boolean),
        ]));
        assert!(matches!(
            PageReader::new(other, &page),
            Err(BulkrowError::ForeignSchemaPage { .. })
        ));
    }

    #[test]
    fn test_wrong_typed_access_is_rejected() {
        let schema = Arc::new(Schema::new([("a", ColumnType::Long)]));
        let page = one_page(&schema, |builder| {
            builder.set_long(0, 1).unwrap();
            builder.add_record().unwrap();
        });

        let mut reader = PageReader::new(Arc::clone(&schema), &page).unwrap();
        assert!(reader.next_record());
        assert!(matches!(
            reader.get_boolean(0),
            Err(BulkrowError::ColumnTypeMismatch { .. })
        ));
        assert!(matches!(
            reader.get_long(9),
            Err(BulkrowError::SchemaMismatch { .. })
        ));
    }
}
