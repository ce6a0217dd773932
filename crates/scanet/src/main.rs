mod bootstrap;

use anyhow::Result;
use scanet_core::settings::{Command, Settings};
use scanet_data::analysis::{build_report, ingest_path};
use scanet_data::query::{AdHocQuery, QueryRows};
use scanet_data::store::Store;

const SAMPLE_QUERIES: [&str; 2] = [
    "SELECT CH, COUNT(*) FROM ap GROUP BY CH;",
    "SELECT ESSID, COUNT(DISTINCT station) FROM ap JOIN sta ON ap.BSSID = sta.bssid GROUP BY ESSID;",
];

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();
    settings.validate()?;
    let db_path = settings.db_path();

    bootstrap::ensure_directories(&db_path)?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    if let Err(e) = settings.persist_last_used() {
        tracing::warn!("Failed to update saved settings: {}", e);
    }

    tracing::info!("SCANet v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!("Store: {}", db_path.display());

    let store = Store::open(&db_path)?;

    match &settings.command {
        Command::Analyze { path } => {
            tracing::info!("Analyzing {}...", path.display());
            let summaries = ingest_path(&store, path)?;
            if summaries.is_empty() {
                anyhow::bail!("No capture files found at {}", path.display());
            }

            let counts = store.table_counts()?;
            tracing::info!(
                "Store now holds {} access points, {} stations, {} probes",
                counts.access_points,
                counts.stations,
                counts.probes
            );

            let report = build_report(&store, settings.top_limit())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Stats => {
            let report = build_report(&store, settings.top_limit())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Query { sql: Some(sql) } => {
            let rows = AdHocQuery::new(&store).run(sql)?;
            print_rows(&rows);
        }

        Command::Query { sql: None } => {
            println!("Available sample queries:");
            for (i, query) in SAMPLE_QUERIES.iter().enumerate() {
                println!("{}. {}", i + 1, query);
            }
        }

        Command::Reset => {
            store.reset()?;
            println!("Store {} reset", db_path.display());
        }
    }

    Ok(())
}

/// Print query results as ` | `-separated columns under a header rule.
fn print_rows(rows: &QueryRows) {
    if rows.is_empty() {
        println!("No results found.");
        return;
    }

    let header = rows.columns.join(" | ");
    println!("{}", header);
    println!("{}", "-".repeat(header.len()));

    for row in &rows.rows {
        let values: Vec<String> = row.iter().map(format_cell).collect();
        println!("{}", values.join(" | "));
    }
}

fn format_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "None".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
