//! Request parameters for ranking and summary queries
//!
//! Dashboard panels pass their options as a free-form string such as
//! `"idle,threshold=-3"` or `"summary"`. The string is parsed once at the
//! request boundary into [`AnalysisParams`].

use crate::error::{AnalysisError, Result};
use crate::utilization::Direction;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Ranking over the whole window, or a summary of one job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Summary,
    #[default]
    Ranking,
}

/// Which samples a ranking selects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    /// Samples attributed to a job (job_id >= 1), grouped by job
    #[default]
    Active,
    /// Samples with no job (job_id = 0), grouped by component
    Idle,
}

/// Structured form of the ranking/summary options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisParams {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub activity: Activity,
    /// Signed threshold; negative selects the low end
    #[serde(default = "default_threshold")]
    pub threshold: i64,
}

fn default_threshold() -> i64 {
    5
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            activity: Activity::default(),
            threshold: default_threshold(),
        }
    }
}

impl AnalysisParams {
    /// Parse, falling back to `default_threshold` when none is given
    pub fn parse_with_default(input: &str, default_threshold: i64) -> Result<Self> {
        let mut params = Self {
            threshold: default_threshold,
            ..Self::default()
        };

        for token in input
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            match token.split_once('=') {
                Some(("threshold", value)) => {
                    params.threshold = value.trim().parse().map_err(|_| {
                        AnalysisError::invalid_parameter(format!(
                            "threshold must be an integer, got {:?}",
                            value
                        ))
                    })?;
                }
                Some((key, _)) => {
                    return Err(AnalysisError::invalid_parameter(format!(
                        "unknown parameter {:?}",
                        key
                    )))
                }
                None => match token {
                    "summary" => params.mode = Mode::Summary,
                    "ranking" => params.mode = Mode::Ranking,
                    "idle" => params.activity = Activity::Idle,
                    "active" => params.activity = Activity::Active,
                    other => {
                        return Err(AnalysisError::invalid_parameter(format!(
                            "unknown parameter {:?}",
                            other
                        )))
                    }
                },
            }
        }

        Ok(params)
    }

    /// Ranking direction and boundary count encoded by the threshold
    pub fn direction(&self) -> (Direction, usize) {
        Direction::from_threshold(self.threshold)
    }
}

impl FromStr for AnalysisParams {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_with_default(s, default_threshold())
    }
}
