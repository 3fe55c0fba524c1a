//! Request boundary for dashboard queries
//!
//! Pipelines return `Result<_, AnalysisError>`. This is the only place that
//! folds failures into the error sentinel the dashboard expects, after
//! logging them and counting them by kind.

use crate::aggregation::{AggregationEngine, Envelope};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::models::{OutputSeries, Table, TimeWindow};
use crate::observability::{AnalysisMetrics, StructuredLogger};
use crate::params::{AnalysisParams, Mode};
use crate::source::TelemetrySource;
use crate::utilization::{JobSummary, RankingResult, UtilizationRatioPipeline};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

const SERIES_OPERATION: &str = "series";
const RANKING_OPERATION: &str = "ranking";

/// What a ranking request produced
#[derive(Debug, Clone, PartialEq)]
pub enum RankingOutcome {
    Ranking(RankingResult),
    Summary(JobSummary),
}

impl RankingOutcome {
    pub fn to_table(&self) -> Table {
        match self {
            RankingOutcome::Ranking(r) => r.to_table(),
            RankingOutcome::Summary(s) => s.to_table(),
        }
    }
}

/// Response body handed to the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    /// Time-series convention, also used for error sentinels
    Series(Vec<OutputSeries>),
    Table(Table),
}

impl QueryResponse {
    pub fn error(err: &AnalysisError) -> Self {
        QueryResponse::Series(vec![OutputSeries::error(err.to_string())])
    }

    /// Sentinel message, if this response is an error
    pub fn error_message(&self) -> Option<&str> {
        match self {
            QueryResponse::Series(series) => match series.as_slice() {
                [only] if only.is_error() => Some(only.target.as_str()),
                _ => None,
            },
            QueryResponse::Table(_) => None,
        }
    }
}

/// Entry point for series and ranking requests
pub struct AnalysisService {
    config: AnalysisConfig,
    aggregation: AggregationEngine,
    utilization: UtilizationRatioPipeline,
    metrics: AnalysisMetrics,
    logger: StructuredLogger,
}

impl AnalysisService {
    pub fn new(source: Arc<dyn TelemetrySource>, config: AnalysisConfig) -> Self {
        Self {
            aggregation: AggregationEngine::new(source.clone(), &config),
            utilization: UtilizationRatioPipeline::new(source, &config),
            config,
            metrics: AnalysisMetrics::new(),
            logger: StructuredLogger::new("memory-analysis"),
        }
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Min/mean/max envelope of `metric` across the job's components
    pub async fn series(
        &self,
        metric: &str,
        job_id: u64,
        window: TimeWindow,
        max_components: Option<usize>,
    ) -> Result<Envelope> {
        let max_components = max_components.unwrap_or(self.config.max_data_points);
        self.aggregation
            .aggregate(metric, job_id, window, max_components)
            .await
    }

    /// Ranking or job summary, as selected by `params`
    pub async fn ranking(
        &self,
        job_id: u64,
        window: TimeWindow,
        params: AnalysisParams,
    ) -> Result<RankingOutcome> {
        match params.mode {
            Mode::Summary => self
                .utilization
                .job_summary(job_id)
                .await
                .map(RankingOutcome::Summary),
            Mode::Ranking => {
                let (direction, count) = params.direction();
                self.utilization
                    .rank(window, params.activity, direction, count)
                    .await
                    .map(RankingOutcome::Ranking)
            }
        }
    }

    /// Series request answered in the dashboard convention
    pub async fn get_series(
        &self,
        metric: &str,
        job_id: u64,
        window: TimeWindow,
        max_components: Option<usize>,
    ) -> Vec<OutputSeries> {
        let started = self.begin(SERIES_OPERATION);
        match self.series(metric, job_id, window, max_components).await {
            Ok(envelope) => {
                self.finish(SERIES_OPERATION, job_id, envelope.len(), started);
                envelope.into_output_series()
            }
            Err(err) => {
                self.fail(SERIES_OPERATION, job_id, &err, started);
                vec![OutputSeries::error(err.to_string())]
            }
        }
    }

    /// Ranking request with free-form parameters such as `"idle,threshold=-3"`
    pub async fn get_ranking(&self, job_id: u64, window: TimeWindow, params: &str) -> QueryResponse {
        let started = self.begin(RANKING_OPERATION);
        let outcome = match AnalysisParams::parse_with_default(params, self.config.default_threshold) {
            Ok(params) => self.ranking(job_id, window, params).await,
            Err(err) => Err(err),
        };
        self.respond(job_id, outcome, started)
    }

    /// Ranking request with already structured parameters
    pub async fn get_ranking_with(
        &self,
        job_id: u64,
        window: TimeWindow,
        params: AnalysisParams,
    ) -> QueryResponse {
        let started = self.begin(RANKING_OPERATION);
        let outcome = self.ranking(job_id, window, params).await;
        self.respond(job_id, outcome, started)
    }

    fn respond(&self, job_id: u64, outcome: Result<RankingOutcome>, started: Instant) -> QueryResponse {
        match outcome {
            Ok(outcome) => {
                let table = outcome.to_table();
                self.finish(RANKING_OPERATION, job_id, table.len(), started);
                QueryResponse::Table(table)
            }
            Err(err) => {
                self.fail(RANKING_OPERATION, job_id, &err, started);
                QueryResponse::error(&err)
            }
        }
    }

    fn begin(&self, operation: &str) -> Instant {
        self.metrics.inc_requests(operation);
        Instant::now()
    }

    fn finish(&self, operation: &str, job_id: u64, rows: usize, started: Instant) {
        let elapsed = started.elapsed().as_secs_f64();
        self.metrics.observe_latency(operation, elapsed);
        self.metrics.add_rows(operation, rows);
        self.logger.log_request(operation, job_id, rows, elapsed);
    }

    fn fail(&self, operation: &str, job_id: u64, err: &AnalysisError, started: Instant) {
        self.metrics
            .observe_latency(operation, started.elapsed().as_secs_f64());
        self.metrics.inc_failures(operation, err.kind());
        self.logger
            .log_failure(operation, job_id, err.kind(), &err.to_string());
    }
}
