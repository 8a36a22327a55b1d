//! Collector health command

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_status, print_rows, print_warning, OutputFormat};

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Show collector health and the last cycle summary
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&health)?);
        return Ok(());
    }

    println!("{} {}", "Collector:".bold(), color_status(&health.status));

    let mut names: Vec<&String> = health.components.keys().collect();
    names.sort();
    let rows: Vec<ComponentRow> = names
        .into_iter()
        .map(|name| {
            let component = &health.components[name];
            ComponentRow {
                name: name.clone(),
                status: color_status(&component.status),
                message: component.message.clone().unwrap_or_default(),
            }
        })
        .collect();
    print_rows(&rows);

    match &health.last_cycle {
        Some(cycle) => {
            println!("{}", "Last Cycle".bold());
            println!("{}", "-".repeat(40));
            println!("Clusters:         {}", cycle.clusters);
            println!("Snapshots:        {}", cycle.snapshots_persisted);
            println!("Failed clusters:  {}", cycle.failed_clusters);
            println!("Failed jobs:      {}", cycle.failed_jobs);
            println!("Duration:         {}ms", cycle.duration_ms);
        }
        None => print_warning("No collection cycle completed yet"),
    }

    Ok(())
}
