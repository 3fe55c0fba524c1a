//! Cross-component min/mean/max envelopes
//!
//! For one job and one metric, every component that reported during the
//! request window is resampled onto the job's one-second grid and the
//! elementwise min, mean and max are taken across components.

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result, INVALID_JOB_MESSAGE};
use crate::models::{JobWindow, OutputSeries, Series, TimeWindow, IDLE_JOB_ID};
use crate::resample::SeriesResampler;
use crate::source::{Comparator, Query, TelemetrySource};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Min/mean/max of one metric across components, on a shared grid
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub metric: String,
    /// Epoch milliseconds, one per grid point
    pub timestamps_ms: Vec<i64>,
    pub min: Vec<f64>,
    pub mean: Vec<f64>,
    pub max: Vec<f64>,
    /// Components that contributed a series
    pub components: Vec<u64>,
}

impl Envelope {
    pub fn len(&self) -> usize {
        self.timestamps_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps_ms.is_empty()
    }

    /// Labeled series `min_<metric>`, `mean_<metric>`, `max_<metric>`
    pub fn into_output_series(self) -> Vec<OutputSeries> {
        vec![
            OutputSeries::new(format!("min_{}", self.metric), &self.min, &self.timestamps_ms),
            OutputSeries::new(format!("mean_{}", self.metric), &self.mean, &self.timestamps_ms),
            OutputSeries::new(format!("max_{}", self.metric), &self.max, &self.timestamps_ms),
        ]
    }
}

/// Elementwise (min, mean, max) across equal-length aligned series
pub fn envelope(series: &[Series]) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>)> {
    let first = series
        .first()
        .ok_or_else(|| AnalysisError::computation("no component series to aggregate"))?;
    let len = first.len();
    if let Some(bad) = series.iter().find(|s| s.len() != len) {
        return Err(AnalysisError::computation(format!(
            "resampled series lengths differ ({} vs {})",
            len,
            bad.len()
        )));
    }

    let n = series.len() as f64;
    let mut min = Vec::with_capacity(len);
    let mut mean = Vec::with_capacity(len);
    let mut max = Vec::with_capacity(len);
    for i in 0..len {
        let column = series.iter().map(|s| s.values[i]);
        let (lo, hi, sum) = column.fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(lo, hi, sum), v| (lo.min(v), hi.max(v), sum + v),
        );
        min.push(lo);
        mean.push(sum / n);
        max.push(hi);
    }
    Ok((min, mean, max))
}

/// Builds per-job envelopes from a telemetry source
pub struct AggregationEngine {
    source: Arc<dyn TelemetrySource>,
    schema: String,
    accounting_schema: String,
    resampler: SeriesResampler,
}

impl AggregationEngine {
    pub fn new(source: Arc<dyn TelemetrySource>, config: &AnalysisConfig) -> Self {
        Self {
            source,
            schema: config.schema.clone(),
            accounting_schema: config.accounting_schema.clone(),
            resampler: SeriesResampler::default(),
        }
    }

    pub fn with_resampler(mut self, resampler: SeriesResampler) -> Self {
        self.resampler = resampler;
        self
    }

    /// Compute the min/mean/max envelope of `metric` for `job_id`
    pub async fn aggregate(
        &self,
        metric: &str,
        job_id: u64,
        window: TimeWindow,
        max_components: usize,
    ) -> Result<Envelope> {
        if job_id == IDLE_JOB_ID {
            return Err(AnalysisError::invalid_parameter(INVALID_JOB_MESSAGE));
        }

        let component_ids = self.components(job_id, window, max_components).await?;
        if component_ids.is_empty() {
            return Err(AnalysisError::not_found(format!(
                "component_id not found for Job {}",
                job_id
            )));
        }

        let job = self.job_window(job_id).await?;
        let job_end = job.end.or(window.upper_bound()).ok_or_else(|| {
            AnalysisError::computation(format!(
                "Job {} is still running and the request has no end time",
                job_id
            ))
        })?;
        if job_end < job.start {
            return Err(AnalysisError::computation(format!(
                "Job {} ends at {} before it starts at {}",
                job_id, job_end, job.start
            )));
        }

        let mut aligned = Vec::with_capacity(component_ids.len());
        let mut contributing = Vec::with_capacity(component_ids.len());
        for component_id in component_ids {
            let raw = self.component_series(metric, job_id, component_id).await?;
            if raw.is_empty() {
                debug!(job_id, component_id, metric, "Component has no samples, skipping");
                continue;
            }
            aligned.push(self.resampler.resample(&raw, job.start, job_end)?);
            contributing.push(component_id);
        }

        let (min, mean, max) = envelope(&aligned)?;
        let timestamps_ms = aligned[0].timestamps.iter().map(|t| t * 1000).collect();

        Ok(Envelope {
            metric: metric.to_string(),
            timestamps_ms,
            min,
            mean,
            max,
            components: contributing,
        })
    }

    /// Distinct components reporting for the job within the window
    async fn components(
        &self,
        job_id: u64,
        window: TimeWindow,
        max_components: usize,
    ) -> Result<Vec<u64>> {
        let mut query = Query::select(&["component_id"])
            .from(self.schema.as_str())
            .filter("job_id", Comparator::Eq, job_id as f64)
            .filter("timestamp", Comparator::Ge, window.start as f64);
        if let Some(end) = window.upper_bound() {
            query = query.filter("timestamp", Comparator::Le, end as f64);
        }
        let query = query.order_by(&["timestamp", "job_id", "component_id"]);

        let frame = self
            .source
            .select(&query)
            .await
            .map_err(|e| AnalysisError::source("component", e))?;
        let distinct: BTreeSet<u64> = frame.ids("component_id")?.into_iter().collect();
        if distinct.len() > max_components {
            debug!(
                job_id,
                found = distinct.len(),
                max_components,
                "Capping components combined into envelope"
            );
        }
        Ok(distinct.into_iter().take(max_components).collect())
    }

    /// Job start/end from the accounting table
    async fn job_window(&self, job_id: u64) -> Result<JobWindow> {
        let query = Query::select(&["job_start", "job_end"])
            .from(self.accounting_schema.as_str())
            .filter("job_id", Comparator::Eq, job_id as f64)
            .limit(1);
        let frame = self
            .source
            .select(&query)
            .await
            .map_err(|e| AnalysisError::source("job", e))?;

        let not_found = || {
            AnalysisError::not_found(format!(
                "Job {} not found in {} schema",
                job_id, self.accounting_schema
            ))
        };
        let start = *frame.timestamps("job_start")?.first().ok_or_else(not_found)?;
        let end = *frame.timestamps("job_end")?.first().ok_or_else(not_found)?;

        Ok(JobWindow {
            job_id,
            start,
            end: (end > 0).then_some(end),
        })
    }

    /// Raw `(timestamp, metric)` samples for one component of the job
    async fn component_series(&self, metric: &str, job_id: u64, component_id: u64) -> Result<Series> {
        let query = Query::select(&[metric, "timestamp"])
            .from(self.schema.as_str())
            .filter("component_id", Comparator::Eq, component_id as f64)
            .filter("job_id", Comparator::Eq, job_id as f64)
            .order_by(&["timestamp"]);
        let frame = self
            .source
            .select(&query)
            .await
            .map_err(|e| AnalysisError::source("series", e))?;

        Ok(Series {
            timestamps: frame.timestamps("timestamp")?,
            values: frame.require(metric)?.to_vec(),
        })
    }
}
