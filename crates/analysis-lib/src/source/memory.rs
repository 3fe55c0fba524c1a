//! In-process telemetry source backed by named row tables

use super::{async_trait, Frame, Query, TelemetrySource};
use crate::models::TelemetryRecord;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use tracing::debug;

type Row = BTreeMap<String, f64>;

/// On-disk layout of a telemetry dump: `{"tables": {"meminfo": [{...}, ...]}}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryDump {
    pub tables: HashMap<String, Vec<Row>>,
}

/// Telemetry source holding every table in memory
#[derive(Debug, Default)]
pub struct MemorySource {
    tables: HashMap<String, Vec<Row>>,
    queries: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dump(dump: TelemetryDump) -> Self {
        Self {
            tables: dump.tables,
            queries: AtomicUsize::new(0),
        }
    }

    /// Load a JSON telemetry dump from disk
    pub async fn from_path(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read telemetry dump {}", path.display()))?;
        let dump: TelemetryDump = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse telemetry dump {}", path.display()))?;
        Ok(Self::from_dump(dump))
    }

    /// Append raw rows to a table
    pub fn with_rows(mut self, table: &str, rows: impl IntoIterator<Item = Row>) -> Self {
        self.tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
        self
    }

    /// Append telemetry records to a table, flattening their metric values
    pub fn with_records(self, table: &str, records: &[TelemetryRecord]) -> Self {
        let rows = records.iter().map(|r| {
            let mut row = r.values.clone();
            row.insert("job_id".to_string(), r.job_id as f64);
            row.insert("component_id".to_string(), r.component_id as f64);
            row.insert("timestamp".to_string(), r.timestamp as f64);
            row
        });
        self.with_rows(table, rows)
    }

    /// Register a job in an accounting table
    pub fn with_job(self, table: &str, job_id: u64, job_start: i64, job_end: i64) -> Self {
        let row: Row = [
            ("job_id".to_string(), job_id as f64),
            ("job_start".to_string(), job_start as f64),
            ("job_end".to_string(), job_end as f64),
        ]
        .into_iter()
        .collect();
        self.with_rows(table, [row])
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Number of selects answered so far
    pub fn queries_served(&self) -> usize {
        self.queries.load(AtomicOrdering::Relaxed)
    }
}

#[async_trait]
impl TelemetrySource for MemorySource {
    async fn select(&self, query: &Query) -> Result<Frame> {
        self.queries.fetch_add(1, AtomicOrdering::Relaxed);

        let Some(rows) = self.tables.get(&query.table) else {
            debug!(table = %query.table, "Unknown table, returning empty frame");
            return Ok(Frame::empty(query.columns.as_slice()));
        };

        let mut matched: Vec<&Row> = rows
            .iter()
            .filter(|row| {
                query.conditions.iter().all(|c| {
                    row.get(&c.field)
                        .map(|v| c.op.matches(*v, c.value))
                        .unwrap_or(false)
                })
            })
            .collect();

        if !query.order_by.is_empty() {
            matched.sort_by(|a, b| compare_rows(a, b, &query.order_by));
        }
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        let mut columns = Vec::with_capacity(query.columns.len());
        for name in &query.columns {
            let values = matched
                .iter()
                .map(|row| {
                    row.get(name).copied().with_context(|| {
                        format!("column {} missing in table {}", name, query.table)
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            columns.push((name.clone(), values));
        }

        Frame::from_columns(columns)
    }
}

fn compare_rows(a: &Row, b: &Row, keys: &[String]) -> Ordering {
    for key in keys {
        let lhs = a.get(key).copied().unwrap_or(f64::NAN);
        let rhs = b.get(key).copied().unwrap_or(f64::NAN);
        match lhs.partial_cmp(&rhs).unwrap_or(Ordering::Equal) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Comparator;
    use std::io::Write;

    fn record(job_id: u64, component_id: u64, timestamp: i64, mem_total: f64) -> TelemetryRecord {
        TelemetryRecord {
            job_id,
            component_id,
            timestamp,
            values: [("MemTotal".to_string(), mem_total)].into_iter().collect(),
        }
    }

    fn source() -> MemorySource {
        MemorySource::new().with_records(
            "meminfo",
            &[
                record(42, 2, 102, 1000.0),
                record(42, 1, 101, 1000.0),
                record(0, 3, 100, 2000.0),
                record(7, 1, 103, 500.0),
            ],
        )
    }

    #[tokio::test]
    async fn test_select_filters_and_orders() {
        let source = source();
        let query = Query::select(&["component_id", "timestamp"])
            .from("meminfo")
            .filter("job_id", Comparator::Eq, 42.0)
            .order_by(&["timestamp"]);

        let frame = source.select(&query).await.unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.column("component_id").unwrap(), &[1.0, 2.0]);
        assert_eq!(source.queries_served(), 1);
    }

    #[tokio::test]
    async fn test_select_limit() {
        let query = Query::select(&["timestamp"])
            .from("meminfo")
            .filter("job_id", Comparator::Ge, 1.0)
            .order_by(&["timestamp"])
            .limit(2);

        let frame = source().select(&query).await.unwrap();
        assert_eq!(frame.column("timestamp").unwrap(), &[101.0, 102.0]);
    }

    #[tokio::test]
    async fn test_unknown_table_is_empty() {
        let query = Query::select(&["job_start"]).from("mt-slurm");
        let frame = source().select(&query).await.unwrap();
        assert!(frame.is_empty());
        assert!(frame.column("job_start").is_some());
    }

    #[tokio::test]
    async fn test_missing_projected_column_fails() {
        let query = Query::select(&["MemAvailable"]).from("meminfo");
        assert!(source().select(&query).await.is_err());
    }

    #[tokio::test]
    async fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"tables": {{"mt-slurm": [{{"job_id": 42, "job_start": 100, "job_end": 110}}]}}}}"#
        )
        .unwrap();

        let source = MemorySource::from_path(file.path()).await.unwrap();
        let query = Query::select(&["job_start", "job_end"])
            .from("mt-slurm")
            .filter("job_id", Comparator::Eq, 42.0);
        let frame = source.select(&query).await.unwrap();
        assert_eq!(frame.column("job_end").unwrap(), &[110.0]);
    }
}
