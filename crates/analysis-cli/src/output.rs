//! Output formatting utilities

use chrono::{TimeZone, Utc};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format, as served to the dashboard
    Json,
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a table built from rows
pub fn print_rows<T: tabled::Tabled>(rows: Vec<T>) {
    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", table);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format epoch seconds as UTC
pub fn format_timestamp(secs: i64) -> String {
    match Utc.timestamp_opt(secs, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => secs.to_string(),
    }
}

/// Format epoch milliseconds as UTC
pub fn format_timestamp_ms(ms: i64) -> String {
    format_timestamp(ms.div_euclid(1000))
}

/// Format an optional epoch-seconds value
pub fn format_optional_timestamp(secs: Option<i64>) -> String {
    secs.map(format_timestamp).unwrap_or_else(|| "-".to_string())
}

/// Format a ratio as percentage
pub fn format_ratio(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Color a memory-used ratio by pressure
pub fn color_ratio(ratio: f64) -> String {
    let formatted = format_ratio(ratio);
    if ratio >= 0.9 {
        formatted.red().to_string()
    } else if ratio >= 0.7 {
        formatted.yellow().to_string()
    } else {
        formatted.green().to_string()
    }
}
