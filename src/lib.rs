//! `chip-qpcr` library crate.
//!
//! The binary (`chipq`) is a thin wrapper around this library so that:
//!
//! - the quantification core is testable without spawning processes
//! - series can be quantified from memory as well as from disk
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod quant;
pub mod report;
pub mod tui;
