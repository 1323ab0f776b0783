//! Input schema for the tabular feeds
//!
//! Declares the loosely-typed row shape (`RawRecord`) and the column catalog
//! with every recognized column name, type, and synonym chain. The rest of
//! the pipeline never reads a raw cell directly.

pub mod columns;
mod raw_record;

pub use columns::{stressor_label, StressorFlag};
pub use raw_record::*;
