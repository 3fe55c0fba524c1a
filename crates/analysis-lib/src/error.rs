//! Error kinds for the analysis pipelines
//!
//! Every failure falls into one of three categories. The `Display` text of
//! each variant is the message carried by the error sentinel returned to the
//! dashboard, so it must stay human readable.

use thiserror::Error;

/// Failure raised by a pipeline step
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// A request parameter is unusable (e.g. job_id = 0 where a job is required)
    #[error("Error: {0}")]
    InvalidParameter(String),

    /// The telemetry or accounting data needed for the request does not exist
    #[error("Error: {0}")]
    NotFound(String),

    /// A computation step could not produce a result
    #[error("Error: {0}")]
    Computation(String),
}

impl AnalysisError {
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn computation(message: impl Into<String>) -> Self {
        Self::Computation(message.into())
    }

    /// Wrap a telemetry source failure with the step that issued the query
    pub fn source(step: &str, err: anyhow::Error) -> Self {
        Self::Computation(format!("{} query failed: {:#}", step, err))
    }

    /// Short label used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::NotFound(_) => "not_found",
            Self::Computation(_) => "computation",
        }
    }
}

/// Message returned whenever a job is required but job_id = 0 was passed
pub const INVALID_JOB_MESSAGE: &str = "Please specify valid job_id";

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_sentinel_text() {
        let err = AnalysisError::invalid_parameter(INVALID_JOB_MESSAGE);
        assert_eq!(err.to_string(), "Error: Please specify valid job_id");
        assert_eq!(err.kind(), "invalid_parameter");
    }

    #[test]
    fn test_source_errors_are_computation_failures() {
        let err = AnalysisError::source("component", anyhow::anyhow!("connection reset"));
        assert_eq!(err.kind(), "computation");
        assert!(err.to_string().contains("component query failed: connection reset"));
    }
}
