//! Memory-used ratio derivation and population statistics

use crate::error::{AnalysisError, Result};
use crate::models::{TelemetryRecord, UtilizationSample};
use tracing::debug;

pub const MEM_TOTAL: &str = "MemTotal";
pub const MEM_AVAILABLE: &str = "MemAvailable";

/// `(MemTotal - MemAvailable) / MemTotal`, undefined when MemTotal is zero
pub fn utilization_ratio(mem_total: f64, mem_available: f64) -> Option<f64> {
    if mem_total == 0.0 {
        return None;
    }
    let ratio = (mem_total - mem_available) / mem_total;
    ratio.is_finite().then_some(ratio)
}

/// Population mean and standard deviation (divides by N)
pub fn population_stats(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

/// Ratios of one selection together with its population statistics
#[derive(Debug, Clone)]
pub struct RatioSet {
    pub samples: Vec<UtilizationSample>,
    pub mean: f64,
    pub std_dev: f64,
}

impl RatioSet {
    /// Derive ratios from raw meminfo records
    ///
    /// Records with MemTotal = 0 are dropped. A selection with no usable
    /// record has no statistics and is a computation failure.
    pub fn from_records(records: &[TelemetryRecord]) -> Result<Self> {
        let mut samples = Vec::with_capacity(records.len());
        let mut excluded = 0usize;
        for record in records {
            let total = required(record, MEM_TOTAL)?;
            let available = required(record, MEM_AVAILABLE)?;
            match utilization_ratio(total, available) {
                Some(ratio) => samples.push(UtilizationSample {
                    job_id: record.job_id,
                    component_id: record.component_id,
                    timestamp: record.timestamp,
                    ratio,
                }),
                None => excluded += 1,
            }
        }
        if excluded > 0 {
            debug!(excluded, "Dropped samples with zero MemTotal");
        }
        Self::from_samples(samples)
    }

    pub fn from_samples(samples: Vec<UtilizationSample>) -> Result<Self> {
        let ratios: Vec<f64> = samples.iter().map(|s| s.ratio).collect();
        let (mean, std_dev) = population_stats(&ratios)
            .ok_or_else(|| AnalysisError::computation("no memory samples in selection"))?;
        Ok(Self {
            samples,
            mean,
            std_dev,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Threshold band `mean + k * std_dev`
    pub fn band(&self, k: i32) -> f64 {
        self.mean + f64::from(k) * self.std_dev
    }

    pub fn count_below(&self, limit: f64) -> usize {
        self.samples.iter().filter(|s| s.ratio < limit).count()
    }

    pub fn count_above(&self, limit: f64) -> usize {
        self.samples.iter().filter(|s| s.ratio > limit).count()
    }
}

fn required(record: &TelemetryRecord, metric: &str) -> Result<f64> {
    record.value(metric).ok_or_else(|| {
        AnalysisError::computation(format!(
            "{} missing for component {} at {}",
            metric, record.component_id, record.timestamp
        ))
    })
}
