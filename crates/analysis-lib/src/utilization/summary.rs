//! Per-job utilization summary with standard-deviation bands

use super::ranking::{reduce_groups, Direction, GroupKey};
use super::ratio::RatioSet;
use crate::error::{AnalysisError, Result};
use crate::models::Table;
use serde::{Deserialize, Serialize};

/// Row labels of a job summary, in output order
pub const SUMMARY_LABELS: [&str; 7] = ["Min", "Max", "Stdd-2", "Stdd-1", "Mean", "Stdd+1", "Stdd+2"];

/// Band offsets (in standard deviations) following the Min/Max rows
const BAND_OFFSETS: [i32; 5] = [-2, -1, 0, 1, 2];

/// One row of a job summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub label: String,
    pub ratio: f64,
    /// Absent on the Mean row
    pub count: Option<usize>,
    pub job_id: u64,
    /// Set on the Min/Max rows only
    pub component_id: Option<u64>,
}

/// Seven-row utilization summary of one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: u64,
    pub mean: f64,
    pub std_dev: f64,
    pub rows: Vec<SummaryRow>,
}

impl JobSummary {
    /// Build the summary from the ratios of a single job
    pub fn from_ratios(job_id: u64, ratios: &RatioSet) -> Result<Self> {
        let mut rows = Vec::with_capacity(SUMMARY_LABELS.len());

        for (label, direction) in [("Min", Direction::Low), ("Max", Direction::High)] {
            let groups = reduce_groups(&ratios.samples, GroupKey::Job, direction);
            let extreme = groups.iter().find(|g| g.key == job_id).ok_or_else(|| {
                AnalysisError::computation(format!("no samples for job {} to summarize", job_id))
            })?;
            rows.push(SummaryRow {
                label: label.to_string(),
                ratio: extreme.ratio,
                count: Some(groups.len()),
                job_id,
                component_id: Some(extreme.component_id),
            });
        }

        for (label, k) in SUMMARY_LABELS[2..].iter().zip(BAND_OFFSETS) {
            let limit = ratios.band(k);
            let count = match k {
                k if k < 0 => Some(ratios.count_below(limit)),
                k if k > 0 => Some(ratios.count_above(limit)),
                _ => None,
            };
            rows.push(SummaryRow {
                label: label.to_string(),
                ratio: limit,
                count,
                job_id,
                component_id: None,
            });
        }

        Ok(Self {
            job_id,
            mean: ratios.mean,
            std_dev: ratios.std_dev,
            rows,
        })
    }

    pub fn row(&self, label: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    pub fn to_table(&self) -> Table {
        Table::new()
            .with_column("Mem_Used_Ratio", self.rows.iter().map(|r| r.ratio))
            .with_column("job_id", self.rows.iter().map(|r| r.job_id))
            .with_column("component_id", self.rows.iter().map(|r| r.component_id))
            .with_column("Analysis", self.rows.iter().map(|r| r.label.clone()))
            .with_column("Count", self.rows.iter().map(|r| r.count.map(|c| c as u64)))
    }
}
