// In: src/page/page.rs

//! The immutable page artifact produced by `flush`/`finish` on a builder.

use std::sync::Arc;

use crate::buffer::Buffer;
use crate::error::BulkrowError;
use crate::schema::Schema;

use super::format;

/// One bounded batch of records in the fixed+variable binary layout,
/// self-contained in a single trimmed buffer.
///
/// A page's record count and bytes are fully determined at creation and
/// never mutated. Ownership follows the buffer: whichever consumer holds
/// the page holds its buffer, and dropping the page returns the buffer to
/// its allocator pool.
pub struct Page {
    schema: Arc<Schema>,
    buffer: Buffer,
    record_count: usize,
}

impl Page {
    /// Wraps a finalized buffer. The buffer's used prefix must already hold
    /// a complete header, fixed region and variable region.
    pub(crate) fn new(schema: Arc<Schema>, buffer: Buffer) -> Result<Self, BulkrowError> {
        // Sanity-check the header so downstream readers can trust it.
        let (record_count, stride) = format::read_header(buffer.as_slice())?;
        let fixed_end =
            format::PAGE_HEADER_SIZE + record_count as usize * stride as usize;
        if fixed_end > buffer.limit() {
            return Err(BulkrowError::PageFormatError(format!(
                "fixed region of {} bytes exceeds the {} bytes in the page",
                fixed_end,
                buffer.limit()
            )));
        }
        Ok(Self {
            schema,
            buffer,
            record_count: record_count as usize,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// The page's complete bytes: header, fixed region, variable region.
    pub fn bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("records", &self.record_count())
            .field("bytes", &self.buffer.limit())
            .finish()
    }
}

/// The interface a downstream stage (filter, formatter, writer adapter)
/// implements to receive completed pages. Each `push` is an ownership
/// transfer; `finish` signals end-of-stream.
pub trait PageOutput {
    fn push(&mut self, page: Page) -> Result<(), BulkrowError>;
    fn finish(&mut self) -> Result<(), BulkrowError>;
}

/// A `PageOutput` that simply accumulates pages; the seam used by tests and
/// by in-process stages that consume pages after the producer is done.
#[derive(Default)]
pub struct PageCollector {
    pages: Vec<Page>,
    finished: bool,
}

impl PageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_pages(self) -> Vec<Page> {
        self.pages
    }
}

impl PageOutput for PageCollector {
    fn push(&mut self, page: Page) -> Result<(), BulkrowError> {
        if self.finished {
            return Err(BulkrowError::Lifecycle(
                "page pushed to a finished collector",
            ));
        }
        self.pages.push(page);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), BulkrowError> {
        self.finished = true;
        Ok(())
    }
}
