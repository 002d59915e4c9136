//! Data sources that are not plate exports from disk.

pub mod simulate;

pub use simulate::*;
