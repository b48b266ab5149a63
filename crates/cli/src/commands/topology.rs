//! Dependency topology command

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, DependencyEdge};
use crate::output::{print_info, print_json, print_table, OutputFormat};

#[derive(Tabled)]
struct EdgeRow {
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Depends On")]
    depends_on: String,
}

/// Show the dependency edges for the disks mounted right now
pub async fn show_topology(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let edges: Vec<DependencyEdge> = client.get(&["api", "v1", "topology"]).await?;

    match format {
        OutputFormat::Json => print_json(&edges)?,
        OutputFormat::Table => {
            let rows: Vec<EdgeRow> = edges
                .iter()
                .map(|e| EdgeRow {
                    component: e.component.clone(),
                    depends_on: e.depends_on.clone(),
                })
                .collect();
            print_table(rows);
            print_info("An anomaly on a component may be caused by anything it depends on");
        }
    }

    Ok(())
}
