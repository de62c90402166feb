//! Database module: population engine and the collations it registers.
//!
//! Layout:
//! - `populator.rs`: overwrite/merge passes, one transaction per pass
//! - `collation.rs`: `LOCALIZED`/`UNICODE` text comparison strategies

pub mod collation;
pub mod populator;

pub use collation::{
    COLLATION_NAMES, Locale, LocaleCollator, OrdinalCollator, SharedCollator, TextCollator,
    collator_for,
};
pub use populator::{DatabasePopulator, remove_database};
