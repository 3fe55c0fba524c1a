//! Ranking and summary CLI commands

use analysis_lib::params::{Activity, AnalysisParams, Mode};
use analysis_lib::utilization::{Direction, JobSummary, RankingResult};
use analysis_lib::{AnalysisService, RankingOutcome, TimeWindow};
use anyhow::Result;
use tabled::Tabled;

use crate::output::{
    color_ratio, format_optional_timestamp, format_ratio, format_timestamp, print_info,
    print_json, print_rows, print_warning, OutputFormat,
};

/// Row for the ranking table
#[derive(Tabled)]
struct RankingRow {
    #[tabled(rename = "Job")]
    job_id: u64,
    #[tabled(rename = "Component")]
    component_id: u64,
    #[tabled(rename = "Ratio")]
    ratio: String,
    #[tabled(rename = "Sampled (UTC)")]
    timestamp: String,
    #[tabled(rename = "Job Start")]
    job_start: String,
    #[tabled(rename = "Job End")]
    job_end: String,
}

/// Row for the summary table
#[derive(Tabled)]
struct SummaryTableRow {
    #[tabled(rename = "Analysis")]
    label: String,
    #[tabled(rename = "Ratio")]
    ratio: String,
    #[tabled(rename = "Count")]
    count: String,
    #[tabled(rename = "Component")]
    component_id: String,
}

/// Rank jobs, or idle components, beyond the threshold boundary
pub async fn show_ranking(
    service: &AnalysisService,
    start: i64,
    end: i64,
    idle: bool,
    threshold: i64,
    format: OutputFormat,
) -> Result<()> {
    let params = AnalysisParams {
        mode: Mode::Ranking,
        activity: if idle { Activity::Idle } else { Activity::Active },
        threshold,
    };
    run(service, 0, TimeWindow::new(start, end), params, format).await
}

/// Show the seven-row summary of one job
pub async fn show_summary(service: &AnalysisService, job_id: u64, format: OutputFormat) -> Result<()> {
    let params = AnalysisParams {
        mode: Mode::Summary,
        ..AnalysisParams::default()
    };
    run(service, job_id, TimeWindow::since(0), params, format).await
}

async fn run(
    service: &AnalysisService,
    job_id: u64,
    window: TimeWindow,
    params: AnalysisParams,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let response = service.get_ranking_with(job_id, window, params).await;
            print_json(&response)?;
        }
        OutputFormat::Table => match service.ranking(job_id, window, params).await? {
            RankingOutcome::Ranking(result) => print_ranking(&result),
            RankingOutcome::Summary(summary) => print_summary(&summary),
        },
    }

    Ok(())
}

fn print_ranking(result: &RankingResult) {
    if result.is_empty() {
        print_warning("No rows beyond the ranking boundary");
    } else {
        let rows: Vec<RankingRow> = result
            .rows
            .iter()
            .map(|r| RankingRow {
                job_id: r.job_id,
                component_id: r.component_id,
                ratio: color_ratio(r.ratio),
                timestamp: format_timestamp(r.timestamp),
                job_start: format_optional_timestamp(r.job_start),
                job_end: format_optional_timestamp(r.job_end),
            })
            .collect();
        print_rows(rows);
    }

    let side = match result.direction {
        Direction::High => "above",
        Direction::Low => "below",
    };
    let boundary = result
        .boundary
        .map(format_ratio)
        .unwrap_or_else(|| "none".to_string());
    print_info(&format!(
        "{} rows {} boundary {} (mean {}, std {})",
        result.len(),
        side,
        boundary,
        format_ratio(result.mean),
        format_ratio(result.std_dev)
    ));
}

fn print_summary(summary: &JobSummary) {
    let rows: Vec<SummaryTableRow> = summary
        .rows
        .iter()
        .map(|r| SummaryTableRow {
            label: r.label.clone(),
            ratio: color_ratio(r.ratio),
            count: r.count.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
            component_id: r
                .component_id
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    print_rows(rows);
    print_info(&format!("Job {} memory-used ratio summary", summary.job_id));
}
