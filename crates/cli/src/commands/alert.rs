//! Threshold check command

use anyhow::Result;
use colored::Colorize;

use crate::client::{AlertCheckRequest, AlertDecision, ApiClient};
use crate::output::{color_level, print_json, print_success, OutputFormat};

/// Check current values of an entity against its baseline without storing them
pub async fn check_alert(
    client: &ApiClient,
    entity: &str,
    cpu: f64,
    mem: f64,
    response_ms: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let request = AlertCheckRequest {
        entity: entity.to_string(),
        cpu,
        mem,
        response_time_ms: response_ms,
    };

    let decision: AlertDecision = client.post(&["api", "v1", "alerts", "check"], &request).await?;

    match format {
        OutputFormat::Json => print_json(&decision)?,
        OutputFormat::Table => {
            if !decision.need_alert {
                print_success(&decision.message);
                return Ok(());
            }

            println!("{} {}", color_level(&decision.level), decision.message.bold());
            if !decision.triggered.is_empty() {
                println!("Triggered: {}", decision.triggered.join(", "));
            }
            if let Some(suggestions) = &decision.suggestions {
                println!("\n{}", suggestions);
            }
        }
    }

    Ok(())
}
