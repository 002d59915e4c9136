//! Input/output helpers.
//!
//! - series discovery (`discover`)
//! - CSV row source (`ingest`)
//! - long-format CSV export (`export`)
//! - results JSON read/write (`results`)

pub mod discover;
pub mod export;
pub mod ingest;
pub mod results;

pub use discover::*;
pub use export::*;
pub use ingest::*;
pub use results::*;
