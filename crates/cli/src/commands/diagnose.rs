//! Trend diagnosis command

use anyhow::{Context, Result};
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, TrendAnalysis};
use crate::output::{color_percent, print_json, print_success, print_table, OutputFormat};

/// Row for the diagnosis table
#[derive(Tabled)]
struct DiagnosisRow {
    #[tabled(rename = "Finding")]
    kind: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Evidence")]
    evidence: String,
}

/// Diagnose the stored history of a component
pub async fn diagnose(
    client: &ApiClient,
    component: &str,
    window: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let query = match window {
        Some(w) => vec![("window_secs", parse_window(w)?.to_string())],
        None => Vec::new(),
    };

    let analysis: TrendAnalysis = client
        .get_with_query(&["api", "v1", "diagnose", component], &query)
        .await?;

    match format {
        OutputFormat::Json => print_json(&analysis)?,
        OutputFormat::Table => {
            if analysis.diagnoses.is_empty() {
                print_success(&format!("No trend issues found for {}", component));
                return Ok(());
            }

            println!("{} {}\n", "Trend diagnosis for".bold(), component.cyan());
            let rows: Vec<DiagnosisRow> = analysis
                .diagnoses
                .iter()
                .map(|d| DiagnosisRow {
                    kind: humanize(&d.kind),
                    confidence: color_percent(d.confidence),
                    evidence: d.evidence.clone(),
                })
                .collect();
            print_table(rows);
        }
    }

    Ok(())
}

/// Parse a window such as `90s`, `30m`, `2h` or `7d` into seconds.
///
/// A bare number is taken as seconds.
pub fn parse_window(window: &str) -> Result<u64> {
    let window = window.trim();
    let (digits, multiplier) = match window.chars().last() {
        Some('s') => (&window[..window.len() - 1], 1),
        Some('m') => (&window[..window.len() - 1], 60),
        Some('h') => (&window[..window.len() - 1], 3600),
        Some('d') => (&window[..window.len() - 1], 86_400),
        _ => (window, 1),
    };

    let value: u64 = digits
        .parse()
        .with_context(|| format!("Invalid window '{}', expected e.g. 30m, 1h or 7d", window))?;
    if value == 0 {
        anyhow::bail!("Window must be greater than zero");
    }

    value
        .checked_mul(multiplier)
        .context("Window is too large")
}

/// `memory_leak_risk` -> `Memory leak risk`
fn humanize(kind: &str) -> String {
    let spaced = kind.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
