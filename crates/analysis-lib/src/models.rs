//! Core data models for the analysis pipelines

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved job_id for samples taken while no job ran on the node
pub const IDLE_JOB_ID: u64 = 0;

/// One telemetry sample as stored by the telemetry source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub job_id: u64,
    pub component_id: u64,
    /// Epoch seconds
    pub timestamp: i64,
    /// Named metric values (MemTotal, MemAvailable, ...)
    pub values: BTreeMap<String, f64>,
}

impl TelemetryRecord {
    pub fn value(&self, metric: &str) -> Option<f64> {
        self.values.get(metric).copied()
    }
}

/// Time range of a request, in epoch seconds
///
/// An `end` of zero or less leaves the range open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Window with no upper bound
    pub fn since(start: i64) -> Self {
        Self { start, end: 0 }
    }

    pub fn upper_bound(&self) -> Option<i64> {
        (self.end > 0).then_some(self.end)
    }
}

/// Ordered (timestamp, value) samples of one metric on one component
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    pub timestamps: Vec<i64>,
    pub values: Vec<f64>,
}

impl Series {
    pub fn from_points(points: impl IntoIterator<Item = (i64, f64)>) -> Self {
        let (timestamps, values) = points.into_iter().unzip();
        Self { timestamps, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}

/// Activity window of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobWindow {
    pub job_id: u64,
    pub start: i64,
    /// `None` while the job is still running
    pub end: Option<i64>,
}

/// Memory utilization ratio derived from one telemetry sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtilizationSample {
    pub job_id: u64,
    pub component_id: u64,
    pub timestamp: i64,
    /// (MemTotal - MemAvailable) / MemTotal
    pub ratio: f64,
}

/// Time series handed back to the dashboard
///
/// Serializes as `{"target": ..., "datapoints": [[value, epoch_ms], ...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSeries {
    pub target: String,
    pub datapoints: Vec<(f64, i64)>,
}

impl OutputSeries {
    pub fn new(target: impl Into<String>, values: &[f64], timestamps_ms: &[i64]) -> Self {
        Self {
            target: target.into(),
            datapoints: values
                .iter()
                .copied()
                .zip(timestamps_ms.iter().copied())
                .collect(),
        }
    }

    /// Error sentinel: the message travels in `target`, with no data
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            target: message.into(),
            datapoints: Vec::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.datapoints.is_empty() && self.target.starts_with("Error")
    }
}

/// One named column of a tabular result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    pub name: String,
    pub values: Vec<serde_json::Value>,
}

/// Column-oriented tabular result for ranking and summary requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<TableColumn>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column<V: Into<serde_json::Value>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.columns.push(TableColumn {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn column(&self, name: &str) -> Option<&[serde_json::Value]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Number of rows (length of the first column)
    pub fn len(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
