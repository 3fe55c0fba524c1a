//! Server configuration

use analysis_lib::AnalysisConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration, read from `ANALYSIS_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Instance name reported in structured logs
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// HTTP port for query/health/metrics endpoints
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// JSON telemetry dump served by the file-backed source
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    #[serde(default)]
    pub schema: Option<String>,

    #[serde(default)]
    pub accounting_schema: Option<String>,

    #[serde(default)]
    pub max_data_points: Option<usize>,

    #[serde(default)]
    pub ranking_limit: Option<usize>,

    #[serde(default)]
    pub default_threshold: Option<i64>,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_data_path() -> PathBuf {
    PathBuf::from("telemetry.json")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            api_port: default_api_port(),
            data_path: default_data_path(),
            schema: None,
            accounting_schema: None,
            max_data_points: None,
            ranking_limit: None,
            default_threshold: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("ANALYSIS"))
            .build()
            .context("Failed to read environment configuration")?;

        config
            .try_deserialize()
            .context("Invalid ANALYSIS_* configuration")
    }

    /// Pipeline tunables, with unset values taken from the defaults
    pub fn analysis(&self) -> AnalysisConfig {
        let defaults = AnalysisConfig::default();
        AnalysisConfig {
            schema: self.schema.clone().unwrap_or(defaults.schema),
            accounting_schema: self
                .accounting_schema
                .clone()
                .unwrap_or(defaults.accounting_schema),
            max_data_points: self.max_data_points.unwrap_or(defaults.max_data_points),
            ranking_limit: self.ranking_limit.unwrap_or(defaults.ranking_limit),
            default_threshold: self.default_threshold.unwrap_or(defaults.default_threshold),
        }
    }
}
