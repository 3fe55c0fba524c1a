//! Memory utilization ratio rankings and summaries
//!
//! This module provides:
//! - Ratio derivation `(MemTotal - MemAvailable) / MemTotal` with population statistics
//! - Grouped reductions per job or per idle component
//! - Order-statistic boundary filtering for top/bottom rankings
//! - Seven-row job summaries with standard-deviation bands

mod pipeline;
mod ranking;
mod ratio;
mod summary;

pub use pipeline::UtilizationRatioPipeline;
pub use ranking::{
    attach_job_windows, boundary_filter, boundary_value, reduce_groups, Direction, GroupKey,
    RankedRow, RankingResult,
};
pub use ratio::{population_stats, utilization_ratio, RatioSet, MEM_AVAILABLE, MEM_TOTAL};
pub use summary::{JobSummary, SummaryRow, SUMMARY_LABELS};
