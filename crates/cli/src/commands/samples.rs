//! Stored sample commands

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, Sample};
use crate::output::{format_opt, format_timestamp, print_json, print_table, print_warning, OutputFormat};

/// Row for the samples table
#[derive(Tabled)]
struct SampleRow {
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Disk Used")]
    disk_used: String,
    #[tabled(rename = "Network")]
    network: String,
    #[tabled(rename = "Processes")]
    processes: String,
}

/// Show the newest sample of every component
pub async fn show_latest(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let samples: Vec<Sample> = client.get(&["api", "v1", "metrics", "latest"]).await?;

    match format {
        OutputFormat::Json => print_json(&samples)?,
        OutputFormat::Table => {
            if samples.is_empty() {
                print_warning("No samples recorded yet");
                return Ok(());
            }

            let rows: Vec<SampleRow> = samples.iter().map(to_row).collect();
            print_table(rows);
            println!("\nTotal: {} components", samples.len());
        }
    }

    Ok(())
}

fn to_row(sample: &Sample) -> SampleRow {
    SampleRow {
        component: sample.component.clone(),
        timestamp: format_timestamp(&sample.timestamp),
        cpu: format_opt(sample.cpu_percent, "%"),
        memory: format_opt(sample.mem_percent, "%"),
        disk_used: format_opt(sample.disk_used_gb, " GB"),
        network: format_opt(sample.network_rate_mbps, " MB/s"),
        processes: sample
            .process_count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string()),
    }
}
