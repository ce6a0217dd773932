//! Ingestion and report pipeline.
//!
//! Ties the parser, the store and the aggregator together: capture files go
//! in, an [`IngestSummary`] comes out, and [`build_report`] assembles every
//! statistic the report renderers consume.

use std::path::{Path, PathBuf};

use chrono::Utc;
use scanet_core::error::Result;
use scanet_core::models::{ApStats, ApTableRow, GraphEdge, StationStats, StationTableRow};
use serde::Serialize;
use tracing::{info, warn};

use crate::aggregator::{self, DEFAULT_TABLE_LIMIT};
use crate::parser::{find_capture_files, parse_file};
use crate::store::Store;

// ── Public types ──────────────────────────────────────────────────────────────

/// Outcome of ingesting one capture file.
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    /// Capture file that was ingested.
    pub source: PathBuf,
    /// Access point records written (inserted or replaced).
    pub access_points: usize,
    /// Station rows appended.
    pub stations: usize,
    /// Probe rows appended.
    pub probes: usize,
    /// RFC 3339 timestamp of the ingestion.
    pub ingested_at: String,
    /// Wall-clock seconds spent reading and parsing.
    pub parse_time_seconds: f64,
    /// Wall-clock seconds spent writing to the store.
    pub store_time_seconds: f64,
}

/// Metadata produced alongside a report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// RFC 3339 timestamp when this report was generated.
    pub generated_at: String,
    /// Store the report was computed from.
    pub store: PathBuf,
    /// Row limit applied to ranked statistics.
    pub top_limit: usize,
}

/// Every statistic consumed by chart and report renderers.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub metadata: ReportMetadata,
    pub ap_stats: ApStats,
    pub station_stats: StationStats,
    pub network_graph: Vec<GraphEdge>,
    pub access_point_table: Vec<ApTableRow>,
    pub station_table: Vec<StationTableRow>,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Parse one capture file and store its records.
///
/// 1. Read and parse the file.
/// 2. Ensure the schema exists.
/// 3. In one transaction, replace access points by BSSID and append
///    stations with their probes.
pub fn ingest_capture(store: &Store, path: &Path) -> Result<IngestSummary> {
    let parse_start = std::time::Instant::now();
    let (access_points, stations) = parse_file(path)?;
    let parse_time = parse_start.elapsed().as_secs_f64();

    if access_points.is_empty() && stations.is_empty() {
        warn!("No capture records found in {}", path.display());
    }

    let store_start = std::time::Instant::now();
    store.create_schema()?;
    let (ap_written, station_ingest) = store.ingest(&access_points, &stations)?;
    let store_time = store_start.elapsed().as_secs_f64();

    Ok(IngestSummary {
        source: path.to_path_buf(),
        access_points: ap_written,
        stations: station_ingest.stations,
        probes: station_ingest.probes,
        ingested_at: Utc::now().to_rfc3339(),
        parse_time_seconds: parse_time,
        store_time_seconds: store_time,
    })
}

/// Ingest every capture file found at `path` (a file or a directory), in
/// path order. Stops at the first file that fails.
pub fn ingest_path(store: &Store, path: &Path) -> Result<Vec<IngestSummary>> {
    let files = find_capture_files(path);
    let mut summaries = Vec::with_capacity(files.len());

    for file in &files {
        let summary = ingest_capture(store, file)?;
        info!(
            "Ingested {}: {} access points, {} stations, {} probes",
            file.display(),
            summary.access_points,
            summary.stations,
            summary.probes
        );
        summaries.push(summary);
    }

    Ok(summaries)
}

/// Compute the full report on a single connection.
pub fn build_report(store: &Store, top_limit: usize) -> Result<StatsReport> {
    store.with_connection(|conn| {
        Ok(StatsReport {
            metadata: ReportMetadata {
                generated_at: Utc::now().to_rfc3339(),
                store: store.path().to_path_buf(),
                top_limit,
            },
            ap_stats: aggregator::ap_stats(conn, top_limit)?,
            station_stats: aggregator::station_stats(conn, top_limit)?,
            network_graph: aggregator::network_graph_edges(conn)?,
            access_point_table: aggregator::strongest_access_points(conn, DEFAULT_TABLE_LIMIT)?,
            station_table: aggregator::strongest_stations(conn, DEFAULT_TABLE_LIMIT)?,
        })
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
