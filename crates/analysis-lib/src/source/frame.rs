//! Column-oriented query results

use crate::error::{AnalysisError, Result};
use crate::models::TelemetryRecord;
use std::collections::BTreeMap;

const JOB_ID: &str = "job_id";
const COMPONENT_ID: &str = "component_id";
const TIMESTAMP: &str = "timestamp";

/// Query result laid out column by column; all columns share one length
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: BTreeMap<String, Vec<f64>>,
    len: usize,
}

impl Frame {
    /// Frame with the given column names and no rows
    pub fn empty<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            columns: names
                .iter()
                .map(|n| (n.as_ref().to_string(), Vec::new()))
                .collect(),
            len: 0,
        }
    }

    /// Build a frame from named columns, rejecting ragged input
    pub fn from_columns(columns: impl IntoIterator<Item = (String, Vec<f64>)>) -> anyhow::Result<Self> {
        let columns: BTreeMap<String, Vec<f64>> = columns.into_iter().collect();
        let len = columns.values().next().map(Vec::len).unwrap_or(0);
        if let Some((name, col)) = columns.iter().find(|(_, c)| c.len() != len) {
            anyhow::bail!(
                "column {} has {} rows, expected {}",
                name,
                col.len(),
                len
            );
        }
        Ok(Self { columns, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Column lookup that treats a missing column as a computation failure
    pub fn require(&self, name: &str) -> Result<&[f64]> {
        self.column(name).ok_or_else(|| {
            AnalysisError::computation(format!("column {} missing from query result", name))
        })
    }

    /// Column of non-negative integer identifiers
    pub fn ids(&self, name: &str) -> Result<Vec<u64>> {
        self.require(name)?.iter().map(|v| to_id(name, *v)).collect()
    }

    /// Column of epoch-second timestamps
    pub fn timestamps(&self, name: &str) -> Result<Vec<i64>> {
        self.require(name)?
            .iter()
            .map(|v| to_timestamp(name, *v))
            .collect()
    }

    /// Convert to typed records; every column other than the keys becomes a
    /// named metric value.
    pub fn to_records(&self) -> Result<Vec<TelemetryRecord>> {
        let job_ids = self.ids(JOB_ID)?;
        let component_ids = self.ids(COMPONENT_ID)?;
        let timestamps = self.timestamps(TIMESTAMP)?;
        let metrics: Vec<(&String, &Vec<f64>)> = self
            .columns
            .iter()
            .filter(|(name, _)| ![JOB_ID, COMPONENT_ID, TIMESTAMP].contains(&name.as_str()))
            .collect();

        Ok((0..self.len)
            .map(|row| TelemetryRecord {
                job_id: job_ids[row],
                component_id: component_ids[row],
                timestamp: timestamps[row],
                values: metrics
                    .iter()
                    .map(|(name, col)| ((*name).clone(), col[row]))
                    .collect(),
            })
            .collect())
    }
}

fn to_timestamp(column: &str, value: f64) -> Result<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Ok(value as i64)
    } else {
        Err(AnalysisError::computation(format!(
            "{} value {} is not a valid timestamp",
            column, value
        )))
    }
}

fn to_id(column: &str, value: f64) -> Result<u64> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as u64)
    } else {
        Err(AnalysisError::computation(format!(
            "{} value {} is not a valid identifier",
            column, value
        )))
    }
}
