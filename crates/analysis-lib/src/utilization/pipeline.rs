//! Source-backed ranking and summary pipeline

use super::ranking::{
    attach_job_windows, boundary_filter, reduce_groups, Direction, GroupKey, RankingResult,
};
use super::ratio::{RatioSet, MEM_AVAILABLE, MEM_TOTAL};
use super::summary::JobSummary;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result, INVALID_JOB_MESSAGE};
use crate::models::{TimeWindow, IDLE_JOB_ID};
use crate::params::Activity;
use crate::source::{Comparator, Query, TelemetrySource};
use crate::windows::JobWindowJoiner;
use std::sync::Arc;
use tracing::debug;

const RATIO_LABEL: &str = "Mem_Used_Ratio";

const SELECT_COLUMNS: [&str; 5] = ["job_id", "component_id", "timestamp", MEM_TOTAL, MEM_AVAILABLE];

/// Ranks jobs or idle nodes by memory-used ratio
pub struct UtilizationRatioPipeline {
    source: Arc<dyn TelemetrySource>,
    schema: String,
    ranking_limit: usize,
}

impl UtilizationRatioPipeline {
    pub fn new(source: Arc<dyn TelemetrySource>, config: &AnalysisConfig) -> Self {
        Self {
            source,
            schema: config.schema.clone(),
            ranking_limit: config.ranking_limit,
        }
    }

    /// Ratios of the samples selected by `activity` within `window`
    pub async fn selection(&self, window: TimeWindow, activity: Activity) -> Result<RatioSet> {
        let (job_op, job_value, order) = match activity {
            Activity::Active => (
                Comparator::Ge,
                1.0,
                &["timestamp", "job_id", "component_id"][..],
            ),
            Activity::Idle => (
                Comparator::Eq,
                IDLE_JOB_ID as f64,
                &["timestamp", "component_id"][..],
            ),
        };
        let mut query = Query::select(&SELECT_COLUMNS)
            .from(self.schema.as_str())
            .filter("job_id", job_op, job_value)
            .filter("timestamp", Comparator::Ge, window.start as f64);
        if let Some(end) = window.upper_bound() {
            query = query.filter("timestamp", Comparator::Le, end as f64);
        }
        let query = query.order_by(order).limit(self.ranking_limit);

        self.ratios(&query, "ranking").await
    }

    /// Rank the selection and keep the rows beyond the boundary order statistic
    pub async fn rank(
        &self,
        window: TimeWindow,
        activity: Activity,
        direction: Direction,
        count: usize,
    ) -> Result<RankingResult> {
        let ratios = self.selection(window, activity).await?;

        let (rows, label) = match activity {
            Activity::Active => {
                let mut rows = reduce_groups(&ratios.samples, GroupKey::Job, direction);
                attach_job_windows(&mut rows, &JobWindowJoiner::windows(&ratios.samples));
                (rows, RATIO_LABEL.to_string())
            }
            Activity::Idle => {
                let suffix = match direction {
                    Direction::High => "max",
                    Direction::Low => "min",
                };
                (
                    reduce_groups(&ratios.samples, GroupKey::Component, direction),
                    format!("{}_{}", RATIO_LABEL, suffix),
                )
            }
        };

        let groups = rows.len();
        let (rows, boundary) = boundary_filter(rows, direction, count);
        debug!(
            activity = ?activity,
            direction = direction.as_str(),
            count,
            groups,
            kept = rows.len(),
            boundary = ?boundary,
            "Ranked memory utilization"
        );

        Ok(RankingResult {
            label,
            activity,
            direction,
            count,
            boundary,
            mean: ratios.mean,
            std_dev: ratios.std_dev,
            rows,
        })
    }

    /// Seven-row summary of one job over all of its samples
    pub async fn job_summary(&self, job_id: u64) -> Result<JobSummary> {
        if job_id == IDLE_JOB_ID {
            return Err(AnalysisError::invalid_parameter(INVALID_JOB_MESSAGE));
        }
        let query = Query::select(&SELECT_COLUMNS)
            .from(self.schema.as_str())
            .filter("job_id", Comparator::Eq, job_id as f64)
            .order_by(&["job_id", "timestamp", "component_id"])
            .limit(self.ranking_limit);

        let ratios = self.ratios(&query, "summary").await?;
        JobSummary::from_ratios(job_id, &ratios)
    }

    async fn ratios(&self, query: &Query, step: &str) -> Result<RatioSet> {
        let frame = self
            .source
            .select(query)
            .await
            .map_err(|e| AnalysisError::source(step, e))?;
        RatioSet::from_records(&frame.to_records()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TelemetryRecord;
    use crate::source::MemorySource;

    fn record(job_id: u64, component_id: u64, timestamp: i64, used: f64) -> TelemetryRecord {
        TelemetryRecord {
            job_id,
            component_id,
            timestamp,
            values: [
                (MEM_TOTAL.to_string(), 1000.0),
                (MEM_AVAILABLE.to_string(), 1000.0 - used * 1000.0),
            ]
            .into_iter()
            .collect(),
        }
    }

    /// Jobs 1..=5 peaking at 0.1..0.5, plus idle components 10..=12
    fn cluster() -> MemorySource {
        let mut records = Vec::new();
        for job in 1..=5u64 {
            let peak = job as f64 / 10.0;
            records.push(record(job, job, 100 + job as i64, peak / 2.0));
            records.push(record(job, job, 200 + job as i64, peak));
        }
        for (component, used) in [(10u64, 0.05), (11, 0.3), (12, 0.6)] {
            records.push(record(0, component, 150, used));
            records.push(record(0, component, 160, used / 2.0));
        }
        MemorySource::new().with_records("meminfo", &records)
    }

    fn pipeline(source: MemorySource) -> UtilizationRatioPipeline {
        UtilizationRatioPipeline::new(Arc::new(source), &AnalysisConfig::default())
    }

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[tokio::test]
    async fn test_active_high_ranking() {
        let (direction, count) = Direction::from_threshold(2);
        let result = pipeline(cluster())
            .rank(TimeWindow::since(0), Activity::Active, direction, count)
            .await
            .unwrap();

        assert_eq!(result.label, "Mem_Used_Ratio");
        // count 3 over five peaks: boundary sorted[2] = 0.3
        assert!(close(&[result.boundary.unwrap()], &[0.3]));
        assert!(close(&result.ratios(), &[0.4, 0.5]));
        assert_eq!(result.rows[1].job_id, 5);
        assert_eq!(result.rows[1].job_start, Some(105));
        assert_eq!(result.rows[1].job_end, Some(205));
    }

    #[tokio::test]
    async fn test_active_low_ranking() {
        let (direction, count) = Direction::from_threshold(-2);
        let result = pipeline(cluster())
            .rank(TimeWindow::since(0), Activity::Active, direction, count)
            .await
            .unwrap();
        // group minima are 0.05..0.25, keep those below sorted[2]
        assert!(close(&result.ratios(), &[0.05, 0.1]));
    }

    #[tokio::test]
    async fn test_idle_ranking_groups_by_component() {
        let (direction, count) = Direction::from_threshold(1);
        let result = pipeline(cluster())
            .rank(TimeWindow::since(0), Activity::Idle, direction, count)
            .await
            .unwrap();

        assert_eq!(result.label, "Mem_Used_Ratio_max");
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].key, 12);
        assert_eq!(result.rows[0].job_id, 0);
        assert_eq!(result.rows[0].timestamp, 150);
        assert_eq!(result.rows[0].job_start, None);
    }

    #[tokio::test]
    async fn test_window_bounds_selection() {
        let result = pipeline(cluster())
            .rank(TimeWindow::new(100, 150), Activity::Active, Direction::High, 10)
            .await
            .unwrap();
        // only the first half-peak sample of each job falls inside
        assert!(close(&result.ratios(), &[0.05, 0.1, 0.15, 0.2, 0.25]));
        assert_eq!(result.boundary, None);
    }

    #[tokio::test]
    async fn test_idle_and_active_partition_samples() {
        let pipeline = pipeline(cluster());
        let window = TimeWindow::since(0);
        let active = pipeline.selection(window, Activity::Active).await.unwrap();
        let idle = pipeline.selection(window, Activity::Idle).await.unwrap();

        assert_eq!(active.len() + idle.len(), 16);
        assert!(active.samples.iter().all(|s| s.job_id >= 1));
        assert!(idle.samples.iter().all(|s| s.job_id == 0));
    }

    #[tokio::test]
    async fn test_empty_selection_fails() {
        let err = pipeline(MemorySource::new())
            .rank(TimeWindow::since(0), Activity::Idle, Direction::Low, 3)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "computation");
    }

    #[tokio::test]
    async fn test_job_summary() {
        let summary = pipeline(cluster()).job_summary(4).await.unwrap();
        assert_eq!(summary.rows.len(), 7);
        assert!(close(&[summary.rows[0].ratio, summary.rows[1].ratio], &[0.2, 0.4]));
        assert_eq!(summary.row("Mean").unwrap().count, None);
    }

    #[tokio::test]
    async fn test_job_summary_requires_job() {
        let err = pipeline(cluster()).job_summary(0).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_parameter");
    }
}
