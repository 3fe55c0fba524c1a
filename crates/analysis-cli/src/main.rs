//! Cluster memory analysis CLI
//!
//! Answers the same series, ranking and summary queries as the dashboard
//! backend, straight from a JSON telemetry dump.

mod commands;
mod output;

use analysis_lib::{AnalysisConfig, AnalysisService, MemorySource};
use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{ranking, series};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Cluster memory analysis CLI
#[derive(Parser)]
#[command(name = "graf")]
#[command(author, version, about = "Memory utilization analysis for cluster telemetry", long_about = None)]
pub struct Cli {
    /// JSON telemetry dump (can also be set via GRAF_DATA env var)
    #[arg(long, env = "GRAF_DATA", default_value = "telemetry.json")]
    pub data: PathBuf,

    /// Telemetry table holding meminfo samples
    #[arg(long, default_value = "meminfo")]
    pub schema: String,

    /// Accounting table holding job windows
    #[arg(long, default_value = "mt-slurm")]
    pub accounting_schema: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Min/mean/max envelope of a metric across a job's components
    Series {
        /// Metric column, e.g. MemAvailable
        #[arg(long, short, default_value = "MemAvailable")]
        metric: String,

        /// Job id (must be >= 1)
        #[arg(long, short)]
        job: u64,

        /// Window start, epoch seconds
        #[arg(long)]
        start: i64,

        /// Window end, epoch seconds (0 = open)
        #[arg(long, default_value_t = 0)]
        end: i64,

        /// Cap on components combined into the envelope
        #[arg(long)]
        max_components: Option<usize>,
    },

    /// Rank jobs (or idle nodes) by memory-used ratio
    Rank {
        /// Window start, epoch seconds
        #[arg(long)]
        start: i64,

        /// Window end, epoch seconds (0 = open)
        #[arg(long, default_value_t = 0)]
        end: i64,

        /// Rank idle components instead of jobs
        #[arg(long)]
        idle: bool,

        /// Signed threshold; negative ranks the low end
        #[arg(long, short, allow_hyphen_values = true, default_value_t = 5)]
        threshold: i64,
    },

    /// Seven-row memory summary of one job
    Summary {
        /// Job id (must be >= 1)
        #[arg(long, short)]
        job: u64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    let source = MemorySource::from_path(&cli.data).await?;
    let config = AnalysisConfig {
        schema: cli.schema.clone(),
        accounting_schema: cli.accounting_schema.clone(),
        ..AnalysisConfig::default()
    };
    let service = AnalysisService::new(Arc::new(source), config);

    match cli.command {
        Commands::Series {
            metric,
            job,
            start,
            end,
            max_components,
        } => {
            series::show_series(&service, &metric, job, start, end, max_components, cli.format)
                .await?;
        }
        Commands::Rank {
            start,
            end,
            idle,
            threshold,
        } => {
            ranking::show_ranking(&service, start, end, idle, threshold, cli.format).await?;
        }
        Commands::Summary { job } => {
            ranking::show_summary(&service, job, cli.format).await?;
        }
    }

    Ok(())
}
