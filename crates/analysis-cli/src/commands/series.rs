//! Envelope CLI command

use analysis_lib::{AnalysisService, TimeWindow};
use anyhow::Result;
use tabled::Tabled;

use crate::output::{format_timestamp_ms, print_info, print_json, print_rows, OutputFormat};

/// Row for the envelope table
#[derive(Tabled)]
struct EnvelopeRow {
    #[tabled(rename = "Time (UTC)")]
    time: String,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Max")]
    max: String,
}

/// Show the min/mean/max envelope of `metric` for a job
pub async fn show_series(
    service: &AnalysisService,
    metric: &str,
    job_id: u64,
    start: i64,
    end: i64,
    max_components: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let window = TimeWindow::new(start, end);

    match format {
        OutputFormat::Json => {
            let series = service
                .get_series(metric, job_id, window, max_components)
                .await;
            print_json(&series)?;
        }
        OutputFormat::Table => {
            let envelope = service
                .series(metric, job_id, window, max_components)
                .await?;

            let rows: Vec<EnvelopeRow> = envelope
                .timestamps_ms
                .iter()
                .enumerate()
                .map(|(i, ts)| EnvelopeRow {
                    time: format_timestamp_ms(*ts),
                    min: format!("{:.2}", envelope.min[i]),
                    mean: format!("{:.2}", envelope.mean[i]),
                    max: format!("{:.2}", envelope.max[i]),
                })
                .collect();

            print_rows(rows);
            print_info(&format!(
                "{} of job {} across {} components",
                envelope.metric,
                job_id,
                envelope.components.len()
            ));
        }
    }

    Ok(())
}

