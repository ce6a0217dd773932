//! Read-only statistics over the store.
//!
//! Every method recomputes from current store contents on its own
//! connection. Nothing is cached.
//!
//! Rankings sort by count only. Rows with equal counts come back in whatever
//! order SQLite produces, which is not stable across versions or store
//! histories.

use rusqlite::{params, Connection};
use scanet_core::error::Result;
use scanet_core::models::{
    ApStats, ApTableRow, ChannelCount, EncryptionCount, EssidClientCount, GraphEdge,
    ProbedNetworkCount, StationProbeCount, StationStats, StationTableRow,
};

use crate::store::Store;

/// Default number of rows in the report tables.
pub const DEFAULT_TABLE_LIMIT: usize = 50;

/// Characters of the BSSID kept when naming a hidden network's node.
const FALLBACK_NAME_PREFIX_LEN: usize = 8;

// ── StatsAggregator ───────────────────────────────────────────────────────────

/// Statistic queries consumed by charts and reports.
pub struct StatsAggregator<'a> {
    store: &'a Store,
}

impl<'a> StatsAggregator<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn total_access_points(&self) -> Result<i64> {
        self.store.with_connection(total_access_points)
    }

    /// Access point count per channel, ascending by channel. Access points
    /// without a channel are left out.
    pub fn access_points_by_channel(&self) -> Result<Vec<ChannelCount>> {
        self.store.with_connection(access_points_by_channel)
    }

    /// Access point count per encryption label, most common first.
    pub fn access_points_by_encryption(&self) -> Result<Vec<EncryptionCount>> {
        self.store.with_connection(access_points_by_encryption)
    }

    /// Named networks ranked by distinct associated stations. Networks with
    /// no stations are included with a count of zero.
    pub fn top_essids_by_client_count(&self, limit: usize) -> Result<Vec<EssidClientCount>> {
        self.store
            .with_connection(|conn| top_essids_by_client_count(conn, limit))
    }

    pub fn total_stations(&self) -> Result<i64> {
        self.store.with_connection(total_stations)
    }

    /// Stations that probed for more than one network, most probes first.
    pub fn multi_probe_stations(&self, limit: usize) -> Result<Vec<StationProbeCount>> {
        self.store
            .with_connection(|conn| multi_probe_stations(conn, limit))
    }

    /// Probed network names ranked by how often they were probed.
    pub fn most_probed_networks(&self, limit: usize) -> Result<Vec<ProbedNetworkCount>> {
        self.store
            .with_connection(|conn| most_probed_networks(conn, limit))
    }

    /// Access point to station edges. Only stations associated with a
    /// captured access point and having a non-empty address appear.
    pub fn network_graph_edges(&self) -> Result<Vec<GraphEdge>> {
        self.store.with_connection(network_graph_edges)
    }

    /// All access point statistics, computed on one connection.
    pub fn ap_stats(&self, limit: usize) -> Result<ApStats> {
        self.store.with_connection(|conn| ap_stats(conn, limit))
    }

    /// All station statistics, computed on one connection.
    pub fn station_stats(&self, limit: usize) -> Result<StationStats> {
        self.store.with_connection(|conn| station_stats(conn, limit))
    }

    /// Access points ordered by signal power, strongest first.
    pub fn strongest_access_points(&self, limit: usize) -> Result<Vec<ApTableRow>> {
        self.store
            .with_connection(|conn| strongest_access_points(conn, limit))
    }

    /// Stations ordered by signal power, strongest first, with the ESSID of
    /// their access point when it was captured.
    pub fn strongest_stations(&self, limit: usize) -> Result<Vec<StationTableRow>> {
        self.store
            .with_connection(|conn| strongest_stations(conn, limit))
    }
}

/// ESSID when non-empty, else `AP_` and the start of the BSSID.
pub fn essid_or_fallback(bssid: &str, essid: Option<&str>) -> String {
    match essid {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            let prefix: String = bssid.chars().take(FALLBACK_NAME_PREFIX_LEN).collect();
            format!("AP_{}", prefix)
        }
    }
}

// ── Queries ───────────────────────────────────────────────────────────────────

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

pub(crate) fn total_access_points(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM ap", [], |r| r.get(0))?)
}

pub(crate) fn total_stations(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM sta", [], |r| r.get(0))?)
}

pub(crate) fn access_points_by_channel(conn: &Connection) -> Result<Vec<ChannelCount>> {
    let mut stmt = conn.prepare(
        "SELECT CH, COUNT(*) FROM ap
         WHERE CH IS NOT NULL
         GROUP BY CH
         ORDER BY CH",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok(ChannelCount {
                channel: r.get(0)?,
                count: r.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn access_points_by_encryption(conn: &Connection) -> Result<Vec<EncryptionCount>> {
    let mut stmt = conn.prepare(
        "SELECT ENC, COUNT(*) AS count FROM ap
         GROUP BY ENC
         ORDER BY count DESC",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok(EncryptionCount {
                encryption: r.get(0)?,
                count: r.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn top_essids_by_client_count(
    conn: &Connection,
    limit: usize,
) -> Result<Vec<EssidClientCount>> {
    let mut stmt = conn.prepare(
        "SELECT ap.ESSID, COUNT(DISTINCT sta.station) AS clients
         FROM ap
         LEFT JOIN sta ON ap.BSSID = sta.bssid
         WHERE ap.ESSID != ''
         GROUP BY ap.ESSID
         ORDER BY clients DESC
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![sql_limit(limit)], |r| {
            Ok(EssidClientCount {
                essid: r.get(0)?,
                clients: r.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn multi_probe_stations(
    conn: &Connection,
    limit: usize,
) -> Result<Vec<StationProbeCount>> {
    let mut stmt = conn.prepare(
        "SELECT sta.station, COUNT(probes.probe) AS probe_count
         FROM sta
         LEFT JOIN probes ON sta.id = probes.station_id
         GROUP BY sta.station
         HAVING probe_count > 1
         ORDER BY probe_count DESC
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![sql_limit(limit)], |r| {
            Ok(StationProbeCount {
                station: r.get(0)?,
                probes: r.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn most_probed_networks(
    conn: &Connection,
    limit: usize,
) -> Result<Vec<ProbedNetworkCount>> {
    let mut stmt = conn.prepare(
        "SELECT probe, COUNT(*) AS count
         FROM probes
         WHERE probe IS NOT NULL
         GROUP BY probe
         ORDER BY count DESC
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![sql_limit(limit)], |r| {
            Ok(ProbedNetworkCount {
                network: r.get(0)?,
                count: r.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn network_graph_edges(conn: &Connection) -> Result<Vec<GraphEdge>> {
    let mut stmt = conn.prepare(
        "SELECT ap.BSSID, ap.ESSID, sta.station
         FROM ap
         JOIN sta ON ap.BSSID = sta.bssid
         WHERE sta.station != ''",
    )?;
    let rows = stmt
        .query_map([], |r| {
            let bssid: String = r.get(0)?;
            let essid: Option<String> = r.get(1)?;
            Ok(GraphEdge {
                ap_name: essid_or_fallback(&bssid, essid.as_deref()),
                ap: bssid,
                station: r.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn strongest_access_points(conn: &Connection, limit: usize) -> Result<Vec<ApTableRow>> {
    let mut stmt = conn.prepare(
        "SELECT BSSID, ESSID, CH, ENC, CIPHER, AUTH, PWR, Beacons, Data
         FROM ap
         ORDER BY PWR DESC
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![sql_limit(limit)], |r| {
            Ok(ApTableRow {
                bssid: r.get(0)?,
                essid: r.get(1)?,
                channel: r.get(2)?,
                encryption: r.get(3)?,
                cipher: r.get(4)?,
                auth: r.get(5)?,
                power: r.get(6)?,
                beacons: r.get(7)?,
                data: r.get(8)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn strongest_stations(conn: &Connection, limit: usize) -> Result<Vec<StationTableRow>> {
    let mut stmt = conn.prepare(
        "SELECT sta.station, sta.power, sta.packets, sta.bssid, ap.ESSID, sta.probed_essids
         FROM sta
         LEFT JOIN ap ON sta.bssid = ap.BSSID
         ORDER BY sta.power DESC
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![sql_limit(limit)], |r| {
            Ok(StationTableRow {
                station: r.get(0)?,
                power: r.get(1)?,
                packets: r.get(2)?,
                bssid: r.get(3)?,
                essid: r.get(4)?,
                probed_essids: r.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn ap_stats(conn: &Connection, limit: usize) -> Result<ApStats> {
    Ok(ApStats {
        total_aps: total_access_points(conn)?,
        aps_by_channel: access_points_by_channel(conn)?,
        aps_by_encryption: access_points_by_encryption(conn)?,
        top_essids_by_clients: top_essids_by_client_count(conn, limit)?,
    })
}

pub(crate) fn station_stats(conn: &Connection, limit: usize) -> Result<StationStats> {
    Ok(StationStats {
        total_stations: total_stations(conn)?,
        multi_probe_stations: multi_probe_stations(conn, limit)?,
        most_probed_networks: most_probed_networks(conn, limit)?,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
