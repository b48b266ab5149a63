//! Component Monitor CLI
//!
//! A command-line tool for running threshold checks, root-cause and trend
//! analysis against a running component monitor.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{alert, diagnose, disks, root_cause, samples, topology};

/// Component Monitor CLI
#[derive(Parser)]
#[command(name = "cmon")]
#[command(author, version, about = "CLI for the Component Monitor", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via CMON_API_URL env var)
    #[arg(long, env = "CMON_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check current values of an entity against its baseline
    Alert {
        /// Entity key (service name or component such as CPU)
        entity: String,

        /// Current CPU usage in percent
        #[arg(long)]
        cpu: f64,

        /// Current memory usage in percent
        #[arg(long)]
        mem: f64,

        /// Current response time in milliseconds
        #[arg(long)]
        response_ms: Option<u64>,
    },

    /// Infer the root cause of an anomaly on a component
    RootCause {
        /// Affected component (CPU, Memory, Network, Processes or Disk-<mount>)
        component: String,
    },

    /// Diagnose trends in the stored history of a component
    Diagnose {
        /// Component to diagnose
        component: String,

        /// History window (e.g., 30m, 1h, 7d); server default if not specified
        #[arg(long, short)]
        window: Option<String>,
    },

    /// Show the newest sample of every component
    Latest,

    /// Show the component dependency graph
    Topology,

    /// List the disks the monitor can see
    Disks,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize client
    let client = client::ApiClient::new(&cli.api_url)?;

    // Execute command
    match cli.command {
        Commands::Alert {
            entity,
            cpu,
            mem,
            response_ms,
        } => {
            alert::check_alert(&client, &entity, cpu, mem, response_ms, cli.format).await?;
        }
        Commands::RootCause { component } => {
            root_cause::show_root_cause(&client, &component, cli.format).await?;
        }
        Commands::Diagnose { component, window } => {
            diagnose::diagnose(&client, &component, window.as_deref(), cli.format).await?;
        }
        Commands::Latest => {
            samples::show_latest(&client, cli.format).await?;
        }
        Commands::Topology => {
            topology::show_topology(&client, cli.format).await?;
        }
        Commands::Disks => {
            disks::show_disks(&client, cli.format).await?;
        }
    }

    Ok(())
}
