//! Data layer for SCANet.
//!
//! Parses capture exports, stores the records in SQLite, and computes the
//! statistics consumed by chart and report renderers.

pub mod aggregator;
pub mod analysis;
pub mod parser;
pub mod query;
pub mod store;

pub use scanet_core as core;
