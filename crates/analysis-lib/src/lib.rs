//! Memory-utilization analysis for cluster telemetry
//!
//! This crate provides the core functionality for:
//! - Resampling irregular per-component series onto a uniform grid
//! - Cross-component min/mean/max envelopes per job
//! - Memory-used ratio rankings of jobs and idle nodes
//! - Per-job summaries with standard-deviation bands
//! - The request boundary turning failures into dashboard error sentinels

pub mod aggregation;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod params;
pub mod resample;
pub mod service;
pub mod source;
pub mod utilization;
pub mod windows;

pub use aggregation::{AggregationEngine, Envelope};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use models::*;
pub use observability::{AnalysisMetrics, StructuredLogger};
pub use params::{Activity, AnalysisParams, Mode};
pub use service::{AnalysisService, QueryResponse, RankingOutcome};
pub use source::{MemorySource, TelemetrySource};
