//! Ad hoc SQL against the store.
//!
//! Kept apart from [`crate::aggregator`] so callers can gate or audit it on
//! its own. The SQL is executed as given, without any sanitization. Never
//! pass untrusted input.

use rusqlite::types::ValueRef;
use scanet_core::error::Result;
use serde::Serialize;
use tracing::info;

use crate::store::Store;

/// Column names and rows returned by an ad hoc query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl QueryRows {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Unrestricted query capability over a [`Store`].
pub struct AdHocQuery<'a> {
    store: &'a Store,
}

impl<'a> AdHocQuery<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Execute one SQL statement and collect every row it returns.
    ///
    /// Statements that return nothing (e.g. `UPDATE`) still run and yield
    /// an empty result.
    pub fn run(&self, sql: &str) -> Result<QueryRows> {
        info!("Running ad hoc query against {}", self.store.path().display());
        self.store.with_connection(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let width = columns.len();

            let mut rows = Vec::new();
            let mut cursor = stmt.query([])?;
            while let Some(row) = cursor.next()? {
                let mut values = Vec::with_capacity(width);
                for i in 0..width {
                    values.push(to_json(row.get_ref(i)?));
                }
                rows.push(values);
            }

            Ok(QueryRows { columns, rows })
        })
    }
}

fn to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => {
            serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
        ValueRef::Blob(bytes) => {
            serde_json::Value::String(bytes.iter().map(|b| format!("{:02x}", b)).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{ap, temp_store};
    use serde_json::json;

    #[test]
    fn test_run_returns_columns_and_rows() {
        let (_dir, store) = temp_store();
        let mut hidden = ap("00:00:00:00:00:02", 6, "WPA2", "");
        hidden.power = None;
        store
            .ingest_access_points(&[ap("00:00:00:00:00:01", 1, "OPN", "Open"), hidden])
            .unwrap();

        let result = AdHocQuery::new(&store)
            .run("SELECT BSSID, CH, PWR, ESSID FROM ap ORDER BY BSSID")
            .unwrap();
        assert_eq!(result.columns, vec!["BSSID", "CH", "PWR", "ESSID"]);
        assert_eq!(
            result.rows,
            vec![
                vec![json!("00:00:00:00:00:01"), json!(1), json!(-60), json!("Open")],
                vec![json!("00:00:00:00:00:02"), json!(6), json!(null), json!("")],
            ]
        );
    }

    #[test]
    fn test_run_real_and_blob_values() {
        let (_dir, store) = temp_store();
        let result = AdHocQuery::new(&store)
            .run("SELECT 1.5 AS ratio, x'00ff' AS raw")
            .unwrap();
        assert_eq!(result.rows, vec![vec![json!(1.5), json!("00ff")]]);
    }

    #[test]
    fn test_run_empty_result() {
        let (_dir, store) = temp_store();
        let result = AdHocQuery::new(&store).run("SELECT * FROM sta").unwrap();
        assert!(result.is_empty());
        assert!(result.columns.contains(&"station".to_string()));
    }

    #[test]
    fn test_run_invalid_sql_is_error() {
        let (_dir, store) = temp_store();
        assert!(AdHocQuery::new(&store).run("SELEKT nonsense").is_err());
    }
}
