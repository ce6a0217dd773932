use serde::{Deserialize, Serialize};

/// One row of the access-point section of a capture export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPointRecord {
    /// Hardware address of the access point. Unique key in the store.
    pub bssid: String,
    /// Signal power in dBm.
    pub power: Option<i64>,
    /// Number of beacon frames seen.
    pub beacons: Option<i64>,
    /// Number of data frames seen.
    pub data: Option<i64>,
    /// Data packets per second over the last interval.
    pub per_second: Option<i64>,
    /// Radio channel.
    pub channel: Option<i64>,
    /// Maximum advertised bit rate.
    pub max_rate: Option<i64>,
    /// Encryption suite label, e.g. `WPA2`, `OPN`.
    pub encryption: String,
    /// Cipher label, e.g. `CCMP`.
    pub cipher: String,
    /// Authentication label, e.g. `PSK`.
    pub auth: String,
    /// Network name. Empty for hidden networks.
    pub essid: String,
}

/// One row of the station section of a capture export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationRecord {
    /// Hardware address of the client radio.
    pub station: String,
    /// First-seen timestamp, kept verbatim.
    pub first_seen: String,
    /// Last-seen timestamp, kept verbatim.
    pub last_seen: String,
    /// Signal power in dBm.
    pub power: Option<i64>,
    /// Number of packets seen from this station.
    pub packets: Option<i64>,
    /// BSSID the station is associated with, if any. Not guaranteed to
    /// match a captured access point.
    pub bssid: Option<String>,
    /// The probed-networks field with quotes stripped.
    pub probed_essids: String,
    /// Individual network names parsed out of `probed_essids`, in order.
    #[serde(default)]
    pub probes: Vec<String>,
}

// ── Aggregate rows ────────────────────────────────────────────────────────────

/// Number of access points on one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCount {
    pub channel: i64,
    pub count: i64,
}

/// Number of access points using one encryption label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionCount {
    pub encryption: Option<String>,
    pub count: i64,
}

/// Distinct client stations seen on access points sharing an ESSID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssidClientCount {
    pub essid: String,
    pub clients: i64,
}

/// A station address with the number of probes it sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationProbeCount {
    pub station: String,
    pub probes: i64,
}

/// How often a network name was probed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbedNetworkCount {
    pub network: String,
    pub count: i64,
}

/// An access point to station relationship used for topology graphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// BSSID of the access point.
    pub ap: String,
    /// ESSID, or `AP_` plus a BSSID prefix for hidden networks.
    pub ap_name: String,
    /// Station address.
    pub station: String,
}

/// Access point statistics consumed by charts and reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApStats {
    pub total_aps: i64,
    pub aps_by_channel: Vec<ChannelCount>,
    pub aps_by_encryption: Vec<EncryptionCount>,
    pub top_essids_by_clients: Vec<EssidClientCount>,
}

/// Station statistics consumed by charts and reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationStats {
    pub total_stations: i64,
    pub multi_probe_stations: Vec<StationProbeCount>,
    pub most_probed_networks: Vec<ProbedNetworkCount>,
}

// ── Report tables ─────────────────────────────────────────────────────────────

/// An access point row as shown in report tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApTableRow {
    pub bssid: String,
    pub essid: Option<String>,
    pub channel: Option<i64>,
    pub encryption: Option<String>,
    pub cipher: Option<String>,
    pub auth: Option<String>,
    pub power: Option<i64>,
    pub beacons: Option<i64>,
    pub data: Option<i64>,
}

/// A station row as shown in report tables, with the ESSID of its access
/// point when that access point was captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationTableRow {
    pub station: String,
    pub power: Option<i64>,
    pub packets: Option<i64>,
    pub bssid: Option<String>,
    pub essid: Option<String>,
    pub probed_essids: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_record_probes_default_when_absent() {
        let json = r#"{
            "station": "AA:BB:CC:DD:EE:FF",
            "first_seen": "2024-01-01 10:00:00",
            "last_seen": "2024-01-01 10:05:00",
            "power": -40,
            "packets": 12,
            "bssid": null,
            "probed_essids": ""
        }"#;
        let record: StationRecord = serde_json::from_str(json).unwrap();
        assert!(record.probes.is_empty());
        assert!(record.bssid.is_none());
    }

    #[test]
    fn test_stats_default_is_empty() {
        let ap = ApStats::default();
        assert_eq!(ap.total_aps, 0);
        assert!(ap.aps_by_channel.is_empty());

        let sta = StationStats::default();
        assert_eq!(sta.total_stations, 0);
        assert!(sta.most_probed_networks.is_empty());
    }

    #[test]
    fn test_encryption_count_serializes_null_label() {
        let row = EncryptionCount {
            encryption: None,
            count: 3,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert!(value["encryption"].is_null());
        assert_eq!(value["count"], 3);
    }
}
