//! Root-cause analysis command

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, RootCauseResult};
use crate::output::{color_ratio, format_timestamp, print_json, print_table, print_warning, OutputFormat};

/// Row for the correlation table
#[derive(Tabled)]
struct CorrelationRow {
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Correlation")]
    correlation: String,
    #[tabled(rename = "In Chain")]
    in_chain: String,
}

/// Infer the root cause of an anomaly seen on a component
pub async fn show_root_cause(client: &ApiClient, component: &str, format: OutputFormat) -> Result<()> {
    let result: RootCauseResult = client.get(&["api", "v1", "root-cause", component]).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("{}", "Root Cause Analysis".bold());
            println!("{}", "=".repeat(60));
            println!("Affected:   {}", result.affected_component.cyan());
            println!("Root cause: {}", result.root_cause.bold());
            println!("Confidence: {}", color_ratio(result.confidence));
            println!("Evidence:   {}", result.evidence);
            println!("Analyzed:   {}", format_timestamp(&result.analysis_time));

            if result.degraded {
                print_warning("Analysis ran on incomplete data, result is a fallback");
            }

            if !result.dependency_chain.is_empty() {
                println!("\nDependency chain: {}", result.dependency_chain.join(" -> "));
            }

            if !result.correlations.is_empty() {
                println!();
                let rows: Vec<CorrelationRow> = result
                    .correlations
                    .iter()
                    .map(|(component, correlation)| CorrelationRow {
                        component: component.clone(),
                        correlation: format!("{:.2}", correlation),
                        in_chain: if result.dependency_chain.contains(component) {
                            "✓".to_string()
                        } else {
                            "".to_string()
                        },
                    })
                    .collect();
                print_table(rows);
            }

            if !result.suggestions.is_empty() {
                println!("\n{}", "Suggestions".bold());
                for (i, suggestion) in result.suggestions.iter().enumerate() {
                    println!("  {}. {}", i + 1, suggestion);
                }
            }
        }
    }

    Ok(())
}
