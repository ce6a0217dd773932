//! SQLite storage for parsed capture records.
//!
//! Access points are keyed by BSSID and replaced when seen again. Stations
//! and their probes are appended on every ingestion, so repeated ingestion
//! of the same capture yields repeated station rows.
//!
//! Every operation opens its own connection and drops it before returning,
//! on success and on error alike. Nothing holds a connection between calls.
//! Each new connection applies the idempotent schema first, so a handle
//! pointed at a fresh file reads as an empty store.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, Transaction};
use scanet_core::error::{Result, ScanetError};
use scanet_core::models::{AccessPointRecord, StationRecord};
use serde::Serialize;
use tracing::{debug, info};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS ap (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        BSSID TEXT NOT NULL UNIQUE,
        PWR INTEGER,
        Beacons INTEGER,
        Data INTEGER,
        per_s INTEGER,
        CH INTEGER,
        MB INTEGER,
        ENC TEXT,
        CIPHER TEXT,
        AUTH TEXT,
        ESSID TEXT,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS sta (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        station TEXT NOT NULL,
        first_seen TEXT,
        last_seen TEXT,
        power INTEGER,
        packets INTEGER,
        bssid TEXT,
        probed_essids TEXT,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS probes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        station_id INTEGER NOT NULL REFERENCES sta(id),
        probe TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_ap_bssid ON ap(BSSID);
    CREATE INDEX IF NOT EXISTS idx_ap_channel ON ap(CH);
    CREATE INDEX IF NOT EXISTS idx_ap_essid ON ap(ESSID);
    CREATE INDEX IF NOT EXISTS idx_sta_bssid ON sta(bssid);
    CREATE INDEX IF NOT EXISTS idx_sta_station ON sta(station);
    CREATE INDEX IF NOT EXISTS idx_probes_station_id ON probes(station_id);
"#;

/// Rows written by one [`Store::ingest_stations`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StationIngest {
    pub stations: usize,
    pub probes: usize,
}

/// Current row count of each relation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub access_points: i64,
    pub stations: i64,
    pub probes: i64,
}

/// Handle to an on-disk store. Holds only the path.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Create a handle without touching the file. The schema is applied on
    /// first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a handle and make sure the schema exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(path);
        store.create_schema()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the `ap`, `sta` and `probes` relations and their indexes if
    /// absent. Safe to call on every run.
    pub fn create_schema(&self) -> Result<()> {
        self.connect().map(drop)
    }

    /// Insert or replace access points keyed by BSSID.
    ///
    /// A later record for the same BSSID fully supersedes the stored row.
    /// Returns the number of records written.
    pub fn ingest_access_points(&self, records: &[AccessPointRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let written = self.with_transaction(|tx| write_access_points(tx, records))?;
        info!("Stored {} access points in {}", written, self.path.display());
        Ok(written)
    }

    /// Append one station row per record, plus one probe row per probed
    /// network name owned by that station row.
    pub fn ingest_stations(&self, records: &[StationRecord]) -> Result<StationIngest> {
        if records.is_empty() {
            return Ok(StationIngest::default());
        }

        let ingest = self.with_transaction(|tx| write_stations(tx, records))?;
        info!(
            "Stored {} stations with {} probes in {}",
            ingest.stations,
            ingest.probes,
            self.path.display()
        );
        Ok(ingest)
    }

    /// Ingest both record streams in a single transaction. Either everything
    /// is stored or nothing is.
    pub fn ingest(
        &self,
        access_points: &[AccessPointRecord],
        stations: &[StationRecord],
    ) -> Result<(usize, StationIngest)> {
        if access_points.is_empty() && stations.is_empty() {
            return Ok((0, StationIngest::default()));
        }

        let (written, ingest) = self.with_transaction(|tx| {
            let written = write_access_points(tx, access_points)?;
            let ingest = write_stations(tx, stations)?;
            Ok((written, ingest))
        })?;
        info!(
            "Stored {} access points, {} stations and {} probes in {}",
            written,
            ingest.stations,
            ingest.probes,
            self.path.display()
        );
        Ok((written, ingest))
    }

    /// Delete every row from all three relations.
    pub fn reset(&self) -> Result<()> {
        self.with_transaction(|tx| {
            tx.execute_batch("DELETE FROM probes; DELETE FROM sta; DELETE FROM ap;")?;
            Ok(())
        })?;
        info!("Reset store {}", self.path.display());
        Ok(())
    }

    pub fn table_counts(&self) -> Result<TableCounts> {
        self.with_connection(|conn| {
            let count = |table: &str| -> rusqlite::Result<i64> {
                conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
            };
            Ok(TableCounts {
                access_points: count("ap")?,
                stations: count("sta")?,
                probes: count("probes")?,
            })
        })
    }

    // ── Connection scope ──────────────────────────────────────────────────────

    /// Run `f` on a fresh connection that is closed when this returns.
    pub(crate) fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        let conn = self.connect()?;
        f(&conn)
    }

    /// Run `f` inside a transaction on a fresh connection. The transaction
    /// commits only if `f` succeeds; otherwise it rolls back on drop.
    pub(crate) fn with_transaction<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    fn connect(&self) -> Result<Connection> {
        debug!("Opening store {}", self.path.display());
        let conn = Connection::open(&self.path).map_err(|source| ScanetError::StoreOpen {
            path: self.path.clone(),
            source,
        })?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }
}

// ── Writers ───────────────────────────────────────────────────────────────────

fn write_access_points(tx: &Transaction<'_>, records: &[AccessPointRecord]) -> Result<usize> {
    let mut stmt = tx.prepare_cached(
        "INSERT OR REPLACE INTO ap
         (BSSID, PWR, Beacons, Data, per_s, CH, MB, ENC, CIPHER, AUTH, ESSID)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )?;
    for ap in records {
        stmt.execute(params![
            ap.bssid,
            ap.power,
            ap.beacons,
            ap.data,
            ap.per_second,
            ap.channel,
            ap.max_rate,
            ap.encryption,
            ap.cipher,
            ap.auth,
            ap.essid,
        ])?;
    }
    Ok(records.len())
}

fn write_stations(tx: &Transaction<'_>, records: &[StationRecord]) -> Result<StationIngest> {
    let mut sta_stmt = tx.prepare_cached(
        "INSERT INTO sta
         (station, first_seen, last_seen, power, packets, bssid, probed_essids)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    let mut probe_stmt =
        tx.prepare_cached("INSERT INTO probes (station_id, probe) VALUES (?1, ?2)")?;

    let mut ingest = StationIngest::default();
    for sta in records {
        sta_stmt.execute(params![
            sta.station,
            sta.first_seen,
            sta.last_seen,
            sta.power,
            sta.packets,
            sta.bssid,
            sta.probed_essids,
        ])?;
        let station_id = tx.last_insert_rowid();

        for probe in &sta.probes {
            probe_stmt.execute(params![station_id, probe])?;
        }
        ingest.stations += 1;
        ingest.probes += sta.probes.len();
    }
    Ok(ingest)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
