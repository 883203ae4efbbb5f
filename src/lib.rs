//! This file is the root of the `bulkrow` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of the library (`schema`, `page`,
//!     `json`, `plugin`, etc.) so the Rust compiler knows they exist.
//! 2.  Re-exporting the small, stable public surface that pipeline stages
//!     (readers, filters, writers) build against.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod buffer;
pub mod config;
pub mod error;
pub mod json;
pub mod page;
pub mod plugin;
pub mod schema;
pub mod time;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use buffer::{Buffer, BufferAllocator};
pub use config::{ConfigDiff, ConfigSource, PageBuilderConfig, TaskReport, TaskSource};
pub use error::BulkrowError;
pub use json::{EntityType, JsonValue, WireValue};
pub use page::{Page, PageBuilder, PageOutput, PageReader};
pub use schema::{Column, ColumnType, Schema, SchemaBuilder};
pub use time::Timestamp;
