use clap::{CommandFactory, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, ScanetError};

/// Default number of rows returned by the ranked statistics.
pub const DEFAULT_TOP_LIMIT: usize = 10;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// WiFi security analysis for airodump-style capture exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "scanet",
    about = "WiFi security analysis for airodump-style capture exports",
    version
)]
pub struct Settings {
    /// SQLite store path (defaults to ~/.scanet/scanet.db)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Number of rows in ranked statistics (1-100)
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub limit: u32,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations exposed by the command line.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Parse a capture file (or a directory of them), store it and print statistics
    Analyze {
        /// Capture export file or directory
        path: PathBuf,
    },
    /// Print statistics for the current store contents
    Stats,
    /// Run an ad hoc SQL query against the store
    Query {
        /// SQL text; sample queries are listed when omitted
        sql: Option<String>,
    },
    /// Delete every stored access point, station and probe
    Reset,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.scanet/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&home_dir())
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".scanet").join("last_used.json")
    }

    /// Load persisted params from the default path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load persisted params from an explicit path.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and resolve defaults. Nothing is written; see
    /// [`Settings::persist_last_used`].
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation. Accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            return Self::resolve_defaults(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if settings.db.is_none() {
            settings.db = last.db;
        }
        if !is_arg_explicitly_set(&matches, "limit") {
            if let Some(v) = last.limit {
                settings.limit = v;
            }
        }

        Self::resolve_defaults(settings)
    }

    /// Save these settings as the new last-used params, or delete the saved
    /// file when `--clear` was given.
    pub fn persist_last_used(&self) -> Result<()> {
        self.persist_last_used_at(&LastUsedParams::config_path())
    }

    pub fn persist_last_used_at(&self, config_path: &Path) -> Result<()> {
        if self.clear {
            LastUsedParams::clear_at(config_path)
        } else {
            LastUsedParams::from(self).save_to(config_path)
        }
    }

    /// Reject settings that clap cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        let db = self.db_path();
        if db.is_dir() {
            return Err(ScanetError::Config(format!(
                "store path {} is a directory",
                db.display()
            )));
        }
        Ok(())
    }

    /// Store path after defaults have been applied.
    pub fn db_path(&self) -> PathBuf {
        self.db.clone().unwrap_or_else(default_db_path)
    }

    /// Ranked statistic limit as a row count.
    pub fn top_limit(&self) -> usize {
        self.limit as usize
    }

    /// Fill the store path and apply the `--debug` flag.
    fn resolve_defaults(mut settings: Settings) -> Settings {
        if settings.db.is_none() {
            settings.db = Some(default_db_path());
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            db: s.db.clone(),
            limit: Some(s.limit),
        }
    }
}

// ── Helpers ────────────────────────────────────────────────────────────────────

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// `~/.scanet/scanet.db`
pub fn default_db_path() -> PathBuf {
    home_dir().join(".scanet").join("scanet.db")
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
