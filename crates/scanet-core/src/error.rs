use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by SCANet.
///
/// Malformed capture content never shows up here: the parser drops what it
/// cannot use. Errors are reserved for I/O and storage failures.
#[derive(Error, Debug)]
pub enum ScanetError {
    /// A capture file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The SQLite store at `path` could not be opened.
    #[error("Failed to open store {path}: {source}")]
    StoreOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A statement against an already-open store failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A JSON document could not be parsed or produced.
    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the SCANet crates.
pub type Result<T> = std::result::Result<T, ScanetError>;
