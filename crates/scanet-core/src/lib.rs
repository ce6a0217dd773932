//! Shared types for SCANet.
//!
//! Record and statistic types exchanged between the parser, the store and
//! the reporting layer, plus the error type and command-line settings.

pub mod error;
pub mod models;
pub mod settings;

pub use error::{Result, ScanetError};
