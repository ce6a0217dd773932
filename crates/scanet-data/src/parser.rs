//! Capture export discovery and parsing.
//!
//! An export holds an access-point section and a station section separated
//! by a blank line. Each section starts with a header line and continues
//! with comma-separated rows. Columns are positional; the header text is only
//! used to recognise which section a block belongs to.

use std::path::{Path, PathBuf};

use scanet_core::error::{Result, ScanetError};
use scanet_core::models::{AccessPointRecord, StationRecord};
use tracing::{debug, warn};

/// First token of the access-point section header.
pub const AP_HEADER_TOKEN: &str = "BSSID";
/// First token of the station section header.
pub const STATION_HEADER_TOKEN: &str = "Station MAC";
/// Minimum number of columns an access-point row must have.
pub const AP_COLUMN_COUNT: usize = 11;
/// Minimum number of columns a station row must have.
pub const STATION_COLUMN_COUNT: usize = 7;

/// Station BSSID placeholder written for unassociated clients.
const NOT_ASSOCIATED: &str = "(not associated)";

// ── Public API ────────────────────────────────────────────────────────────────

/// Find capture exports under `path`, sorted by path.
///
/// A file path is returned as-is. A directory is walked recursively for
/// `.csv` files, skipping the `.kismet.csv` and `.log.csv` side exports.
pub fn find_capture_files(path: &Path) -> Vec<PathBuf> {
    if !path.exists() {
        warn!("Capture path does not exist: {}", path.display());
        return Vec::new();
    }
    if path.is_file() {
        return vec![path.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_capture_export(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Read a capture export from disk and parse it.
///
/// Invalid UTF-8 is replaced rather than rejected; only a failure to read
/// the file is an error.
pub fn parse_file(path: &Path) -> Result<(Vec<AccessPointRecord>, Vec<StationRecord>)> {
    let bytes = std::fs::read(path).map_err(|source| ScanetError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(parse(&text))
}

/// Parse the text of a capture export into access-point and station records.
///
/// Missing sections yield empty vectors. Rows with too few columns are
/// dropped. Record order follows line order.
pub fn parse(text: &str) -> (Vec<AccessPointRecord>, Vec<StationRecord>) {
    let mut ap_block: Option<Vec<&str>> = None;
    let mut station_block: Option<Vec<&str>> = None;

    for block in split_blocks(text) {
        let Some(first) = block.first() else {
            continue;
        };
        let header = first.trim_start_matches('\u{feff}');
        if header.starts_with(AP_HEADER_TOKEN) {
            ap_block = Some(block);
        } else if header.starts_with(STATION_HEADER_TOKEN) {
            station_block = Some(block);
        }
    }

    let access_points = ap_block
        .map(|b| parse_rows(&b, AP_COLUMN_COUNT, "access point", map_access_point))
        .unwrap_or_default();
    let stations = station_block
        .map(|b| parse_rows(&b, STATION_COLUMN_COUNT, "station", map_station))
        .unwrap_or_default();

    (access_points, stations)
}

/// Split one line into trimmed fields.
///
/// A double quote toggles quoted mode and is not kept; commas inside quotes
/// do not split.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    parts.push(current.trim().to_string());
    parts
}

/// Split a probed-networks field into individual network names.
///
/// Empty names are discarded; duplicates are kept.
pub fn parse_probe_list(field: &str) -> Vec<String> {
    field
        .split(',')
        .map(|essid| essid.trim().trim_matches('"').trim())
        .filter(|essid| !essid.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn is_capture_export(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".csv") && !name.ends_with(".kismet.csv") && !name.ends_with(".log.csv")
}

/// Group non-blank lines into blocks separated by blank lines.
fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(trimmed);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// Parse the data rows of a block (everything after the header line).
fn parse_rows<T>(
    block: &[&str],
    columns: usize,
    section: &str,
    map: impl Fn(&[String]) -> T,
) -> Vec<T> {
    let data_lines = block.get(1..).unwrap_or_default();
    let mut records = Vec::with_capacity(data_lines.len());

    for line in data_lines {
        let parts = split_fields(line);
        if parts.len() >= columns {
            records.push(map(&parts[..columns]));
        }
    }

    debug!(
        "{} section: {} rows read, {} accepted, {} dropped",
        section,
        data_lines.len(),
        records.len(),
        data_lines.len() - records.len(),
    );

    records
}

fn map_access_point(parts: &[String]) -> AccessPointRecord {
    AccessPointRecord {
        bssid: parts[0].clone(),
        power: coerce_int(&parts[1]),
        beacons: coerce_int(&parts[2]),
        data: coerce_int(&parts[3]),
        per_second: coerce_int(&parts[4]),
        channel: coerce_int(&parts[5]),
        max_rate: coerce_int(&parts[6]),
        encryption: parts[7].clone(),
        cipher: parts[8].clone(),
        auth: parts[9].clone(),
        essid: strip_quotes(&parts[10]),
    }
}

fn map_station(parts: &[String]) -> StationRecord {
    let probed_essids = strip_quotes(&parts[6]);
    let probes = parse_probe_list(&probed_essids);

    StationRecord {
        station: parts[0].clone(),
        first_seen: parts[1].clone(),
        last_seen: parts[2].clone(),
        power: coerce_int(&parts[3]),
        packets: coerce_int(&parts[4]),
        bssid: normalize_bssid(&parts[5]),
        probed_essids,
        probes,
    }
}

fn strip_quotes(field: &str) -> String {
    field.replace('"', "").trim().to_string()
}

/// `None` for an empty or unassociated BSSID.
fn normalize_bssid(field: &str) -> Option<String> {
    let bssid = field.trim();
    if bssid.is_empty() || bssid == NOT_ASSOCIATED {
        None
    } else {
        Some(bssid.to_string())
    }
}

/// Integer text, or finite decimal text truncated toward zero. Anything else
/// is `None`.
fn coerce_int(field: &str) -> Option<i64> {
    let field = field.trim();
    if let Ok(n) = field.parse::<i64>() {
        return Some(n);
    }
    field
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
        .map(|f| f.trunc() as i64)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const AP_HEADER: &str = "BSSID, PWR, Beacons, #Data, #/s, CH, MB, ENC, CIPHER, AUTH, ESSID";
    const STATION_HEADER: &str =
        "Station MAC, First time seen, Last time seen, Power, # packets, BSSID, Probed ESSIDs";

    fn sample_capture() -> String {
        [
            "",
            AP_HEADER,
            "00:11:22:33:44:55, -45, 120, 30, 2, 6, 54, WPA2, CCMP, PSK, HomeNet",
            "66:77:88:99:AA:BB, -70, 15, 0, 0, 11, 130, OPN, , , \"Cafe, Free WiFi\"",
            "",
            STATION_HEADER,
            "AA:AA:AA:AA:AA:01, 2024-01-01 10:00:00, 2024-01-01 10:05:00, -50, 42, 00:11:22:33:44:55, HomeNet",
            "AA:AA:AA:AA:AA:02, 2024-01-01 10:01:00, 2024-01-01 10:02:00, -80, 7, (not associated), \"Office,Guest\"",
            "",
        ]
        .join("\r\n")
    }

    // ── parse ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_two_sections() {
        let (aps, stations) = parse(&sample_capture());
        assert_eq!(aps.len(), 2);
        assert_eq!(stations.len(), 2);

        let ap = &aps[0];
        assert_eq!(ap.bssid, "00:11:22:33:44:55");
        assert_eq!(ap.power, Some(-45));
        assert_eq!(ap.beacons, Some(120));
        assert_eq!(ap.data, Some(30));
        assert_eq!(ap.per_second, Some(2));
        assert_eq!(ap.channel, Some(6));
        assert_eq!(ap.max_rate, Some(54));
        assert_eq!(ap.encryption, "WPA2");
        assert_eq!(ap.cipher, "CCMP");
        assert_eq!(ap.auth, "PSK");
        assert_eq!(ap.essid, "HomeNet");

        let sta = &stations[0];
        assert_eq!(sta.station, "AA:AA:AA:AA:AA:01");
        assert_eq!(sta.first_seen, "2024-01-01 10:00:00");
        assert_eq!(sta.last_seen, "2024-01-01 10:05:00");
        assert_eq!(sta.power, Some(-50));
        assert_eq!(sta.packets, Some(42));
        assert_eq!(sta.bssid.as_deref(), Some("00:11:22:33:44:55"));
        assert_eq!(sta.probes, vec!["HomeNet".to_string()]);
    }

    #[test]
    fn test_parse_quoted_essid_with_comma() {
        let (aps, _) = parse(&sample_capture());
        assert_eq!(aps[1].essid, "Cafe, Free WiFi");
        assert_eq!(aps[1].cipher, "");
    }

    #[test]
    fn test_parse_quoted_probe_list() {
        let (_, stations) = parse(&sample_capture());
        let sta = &stations[1];
        assert!(sta.bssid.is_none());
        assert_eq!(sta.probed_essids, "Office,Guest");
        assert_eq!(sta.probes, vec!["Office".to_string(), "Guest".to_string()]);
    }

    #[test]
    fn test_parse_preserves_line_order() {
        let (aps, stations) = parse(&sample_capture());
        assert_eq!(aps[0].bssid, "00:11:22:33:44:55");
        assert_eq!(aps[1].bssid, "66:77:88:99:AA:BB");
        assert_eq!(stations[0].station, "AA:AA:AA:AA:AA:01");
        assert_eq!(stations[1].station, "AA:AA:AA:AA:AA:02");
    }

    #[test]
    fn test_parse_short_lines_dropped() {
        let text = [
            AP_HEADER,
            "00:11:22:33:44:55, -45, 120",
            "66:77:88:99:AA:BB, -70, 15, 0, 0, 11, 130, OPN, , , Open",
            "",
            STATION_HEADER,
            "AA:AA:AA:AA:AA:01, 2024-01-01 10:00:00, -50",
        ]
        .join("\n");
        let (aps, stations) = parse(&text);
        assert_eq!(aps.len(), 1);
        assert_eq!(aps[0].bssid, "66:77:88:99:AA:BB");
        assert!(stations.is_empty());
    }

    #[test]
    fn test_parse_extra_columns_truncated() {
        let text = [
            AP_HEADER,
            "00:11:22:33:44:55, -45, 120, 30, 2, 6, 54, WPA2, CCMP, PSK, HomeNet, extra, columns",
        ]
        .join("\n");
        let (aps, _) = parse(&text);
        assert_eq!(aps.len(), 1);
        assert_eq!(aps[0].essid, "HomeNet");
    }

    #[test]
    fn test_parse_numeric_coercion_failure_is_none() {
        let text = [
            AP_HEADER,
            "00:11:22:33:44:55, n/a, 120, , 2, 6, 54e., WPA2, CCMP, PSK, HomeNet",
        ]
        .join("\n");
        let (aps, _) = parse(&text);
        assert_eq!(aps[0].power, None);
        assert_eq!(aps[0].data, None);
        assert_eq!(aps[0].max_rate, None);
        assert_eq!(aps[0].beacons, Some(120));
    }

    #[test]
    fn test_parse_missing_sections() {
        let (aps, stations) = parse("");
        assert!(aps.is_empty());
        assert!(stations.is_empty());

        let (aps, stations) = parse("garbage line\nmore garbage\n");
        assert!(aps.is_empty());
        assert!(stations.is_empty());

        let only_stations = [
            STATION_HEADER,
            "AA:AA:AA:AA:AA:01, t1, t2, -50, 42, 00:11:22:33:44:55, ",
        ]
        .join("\n");
        let (aps, stations) = parse(&only_stations);
        assert!(aps.is_empty());
        assert_eq!(stations.len(), 1);
        assert!(stations[0].probes.is_empty());
    }

    #[test]
    fn test_parse_header_only_sections() {
        let text = format!("{}\n\n{}\n", AP_HEADER, STATION_HEADER);
        let (aps, stations) = parse(&text);
        assert!(aps.is_empty());
        assert!(stations.is_empty());
    }

    #[test]
    fn test_parse_ignores_byte_order_mark() {
        let text = format!(
            "\u{feff}{}\n00:11:22:33:44:55, -45, 120, 30, 2, 6, 54, WPA2, CCMP, PSK, HomeNet\n",
            AP_HEADER
        );
        let (aps, _) = parse(&text);
        assert_eq!(aps.len(), 1);
    }

    // ── split_fields ──────────────────────────────────────────────────────────

    #[test]
    fn test_split_fields_trims_and_keeps_empty() {
        assert_eq!(split_fields(" a , ,b "), vec!["a", "", "b"]);
    }

    #[test]
    fn test_split_fields_quoted_comma() {
        let parts = split_fields(r#"x, "Cafe, Free WiFi", y"#);
        assert_eq!(parts, vec!["x", "Cafe, Free WiFi", "y"]);
    }

    // ── parse_probe_list ──────────────────────────────────────────────────────

    #[test]
    fn test_parse_probe_list() {
        assert_eq!(
            parse_probe_list(r#" "Home" ,, Work ,Home"#),
            vec!["Home", "Work", "Home"]
        );
        assert!(parse_probe_list("").is_empty());
        assert!(parse_probe_list(" , ").is_empty());
    }

    // ── coerce_int ────────────────────────────────────────────────────────────

    #[test]
    fn test_coerce_int() {
        assert_eq!(coerce_int("-1"), Some(-1));
        assert_eq!(coerce_int(" 54 "), Some(54));
        assert_eq!(coerce_int("54.9"), Some(54));
        assert_eq!(coerce_int(""), None);
        assert_eq!(coerce_int("NaN"), None);
        assert_eq!(coerce_int("inf"), None);
        assert_eq!(coerce_int("54e"), None);
    }

    // ── files ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_file_reads_lossy_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump-01.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(sample_capture().as_bytes()).unwrap();
        file.write_all(&[0xff, 0xfe, b'\n']).unwrap();

        let (aps, stations) = parse_file(&path).unwrap();
        assert_eq!(aps.len(), 2);
        assert_eq!(stations.len(), 2);
    }

    #[test]
    fn test_parse_file_missing_is_error() {
        let err = parse_file(Path::new("/tmp/does-not-exist-scanet-xyz.csv")).unwrap_err();
        assert!(matches!(err, ScanetError::FileRead { .. }));
    }

    #[test]
    fn test_find_capture_files_filters_side_exports() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("site-b");
        std::fs::create_dir_all(&sub).unwrap();
        for name in ["b-01.csv", "a-01.csv", "a-01.kismet.csv", "a-01.log.csv", "notes.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::write(sub.join("c-01.csv"), "").unwrap();

        let files = find_capture_files(dir.path());
        let names: Vec<&str> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a-01.csv", "b-01.csv", "c-01.csv"]);
    }

    #[test]
    fn test_find_capture_files_single_file_and_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump-01.csv");
        std::fs::write(&path, "").unwrap();
        assert_eq!(find_capture_files(&path), vec![path]);

        assert!(find_capture_files(Path::new("/tmp/does-not-exist-scanet-dir")).is_empty());
    }
}
