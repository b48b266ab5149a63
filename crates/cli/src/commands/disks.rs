//! Disk inventory command

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, DiskInfo};
use crate::output::{color_usage, print_json, print_table, print_warning, OutputFormat};

#[derive(Tabled)]
struct DiskRow {
    #[tabled(rename = "Mount")]
    mount_point: String,
    #[tabled(rename = "Device")]
    name: String,
    #[tabled(rename = "FS")]
    file_system: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Used")]
    used: String,
    #[tabled(rename = "Free")]
    free: String,
    #[tabled(rename = "Usage")]
    usage: String,
}

/// Show the disks the monitor can see right now
pub async fn show_disks(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let disks: Vec<DiskInfo> = client.get(&["api", "v1", "disks"]).await?;

    match format {
        OutputFormat::Json => print_json(&disks)?,
        OutputFormat::Table => {
            if disks.is_empty() {
                print_warning("No disks visible to the monitor");
                return Ok(());
            }

            let rows: Vec<DiskRow> = disks.iter().map(to_row).collect();
            print_table(rows);
        }
    }

    Ok(())
}

fn to_row(disk: &DiskInfo) -> DiskRow {
    DiskRow {
        mount_point: disk.mount_point.clone(),
        name: disk.name.clone(),
        file_system: disk.file_system.clone(),
        total: format!("{:.1} GB", disk.total_gb),
        used: format!("{:.1} GB", disk.used_gb),
        free: format!("{:.1} GB", disk.free_gb),
        usage: color_usage(disk.usage_percent),
    }
}
