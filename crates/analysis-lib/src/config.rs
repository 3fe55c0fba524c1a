//! Analysis configuration

use serde::{Deserialize, Serialize};

/// Tunables shared by the analysis pipelines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Telemetry table holding meminfo samples
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Accounting table holding job_start/job_end per job
    #[serde(default = "default_accounting_schema")]
    pub accounting_schema: String,

    /// Cap on components combined into one envelope
    #[serde(default = "default_max_data_points")]
    pub max_data_points: usize,

    /// Cap on rows fetched for one ranking selection
    #[serde(default = "default_ranking_limit")]
    pub ranking_limit: usize,

    /// Threshold used when a ranking request names none
    #[serde(default = "default_threshold")]
    pub default_threshold: i64,
}

fn default_schema() -> String {
    "meminfo".to_string()
}

fn default_accounting_schema() -> String {
    "mt-slurm".to_string()
}

fn default_max_data_points() -> usize {
    4096
}

fn default_ranking_limit() -> usize {
    1_000_000
}

fn default_threshold() -> i64 {
    5
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            accounting_schema: default_accounting_schema(),
            max_data_points: default_max_data_points(),
            ranking_limit: default_ranking_limit(),
            default_threshold: default_threshold(),
        }
    }
}
