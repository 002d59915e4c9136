//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the experiment configuration and its row-layout contract (`ExperimentConfig`)
//! - raw measurement rows (`RawRow`)
//! - ordered per-sample tables (`CtValues`, `IgGDifferential`, `FinalRatios`)

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
