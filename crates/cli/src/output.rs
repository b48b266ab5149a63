//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print rows as a rounded table
pub fn print_table<T: Tabled>(rows: Vec<T>) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color an alert level
pub fn color_level(level: &str) -> String {
    match level.to_uppercase().as_str() {
        "NORMAL" => level.green().to_string(),
        "WARNING" => level.yellow().bold().to_string(),
        _ => level.to_string(),
    }
}

/// Color a root-cause confidence in `[0, 0.95]`
pub fn color_ratio(confidence: f64) -> String {
    color_percent((confidence * 100.0).round() as u8)
}

/// Color a trend confidence in `[0, 100]`
pub fn color_percent(confidence: u8) -> String {
    let formatted = format!("{}%", confidence);
    if confidence >= 80 {
        formatted.red().to_string()
    } else if confidence >= 60 {
        formatted.yellow().to_string()
    } else {
        formatted.normal().to_string()
    }
}

/// Color a disk usage percent, yellow from 80% and red from 90%
pub fn color_usage(percent: f64) -> String {
    let formatted = format!("{:.1}%", percent);
    if percent >= 90.0 {
        formatted.red().to_string()
    } else if percent >= 80.0 {
        formatted.yellow().to_string()
    } else {
        formatted
    }
}

/// Format an optional number, `-` if absent
pub fn format_opt(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.2}{}", v, unit),
        None => "-".to_string(),
    }
}

/// Format timestamp for display
pub fn format_timestamp(ts: &str) -> String {
    // Try to parse and format nicely, otherwise return as-is
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(ts) {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        ts.to_string()
    }
}
