//! NURD query CLI
//!
//! A command-line tool for inspecting job resource snapshots stored by
//! the NURD collector.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{health, jobs};

/// NURD CLI
#[derive(Parser)]
#[command(name = "nurdctl")]
#[command(author, version, about = "CLI for NURD job resource snapshots", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via NURD_API_URL env var)
    #[arg(long, env = "NURD_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List stored job snapshots
    Jobs {
        /// Filter by namespace
        #[arg(long, short)]
        namespace: Option<String>,

        /// Show only the most recent snapshot of each job
        #[arg(long)]
        latest: bool,
    },

    /// Show the snapshot history of one job
    Job {
        /// Job identifier
        id: String,
    },

    /// Show collector health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;

    let client = client::ApiClient::new(&config.resolve_api_url(cli.api_url))?;

    match cli.command {
        Commands::Jobs { namespace, latest } => {
            let namespace = namespace.or(config.default_namespace);
            jobs::list_jobs(&client, namespace, latest, cli.format).await?;
        }
        Commands::Job { id } => {
            jobs::show_job(&client, &id, cli.format).await?;
        }
        Commands::Health => {
            health::show_health(&client, cli.format).await?;
        }
    }

    Ok(())
}
