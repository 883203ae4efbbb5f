// In: src/page/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Page Pipeline
// ====================================================================================
//
// `page` is the record-transfer core: it moves typed records between pipeline
// stages as immutable, self-contained binary batches.
//
// Data Flow (Write Side):
//
//   1. [Upstream Stage]              -> calls setters + add_record() per record
//         |
//   2. [PageBuilder]                 -> encodes rows into the fixed region,
//         |                            spills string/timestamp/json payloads
//         |                            into the pending variable region,
//         |                            flushes when the estimate crosses the
//         |                            configured threshold
//         |
//   3. [PageOutput::push(Page)]      -> ownership transfer to the next stage
//
// Data Flow (Read Side):
//
//   1. [Consumer Stage]              -> opens a PageReader over the Page with
//         |                            the same Schema the builder used
//   2. [PageReader]                  -> single-pass cursor decoding each row
//                                       by the schema-derived layout
//
// The binary layout itself lives in `format`; builder and reader never
// hard-code an offset.
//
// ====================================================================================

pub(crate) mod format;

mod builder;
mod page;
mod reader;

pub use builder::PageBuilder;
pub use format::{RowLayout, PAGE_HEADER_SIZE};
pub use page::{Page, PageCollector, PageOutput};
pub use reader::PageReader;
