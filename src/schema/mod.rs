//! Schema export handling.
//!
//! Layout:
//! - `locator.rs`: picks the newest `<version>.json` in a schema directory
//! - `export.rs`: Room export model and its `createSql` extraction

pub mod export;
pub mod locator;

pub use export::SchemaExport;
pub use locator::{SchemaFile, find_latest};
