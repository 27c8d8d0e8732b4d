//! CostWatch CLI
//!
//! A command-line tool for browsing generated cost reports, conversion
//! suggestions and low-utilization findings served by the reporter daemon.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{health, low_used, report, suggestions};

const DEFAULT_SERVER: &str = "http://localhost:8080";

/// CostWatch CLI
#[derive(Parser)]
#[command(name = "cw")]
#[command(author, version, about = "CLI for CostWatch cost-optimization reports", long_about = None)]
pub struct Cli {
    /// Reporter daemon URL (can also be set via COSTWATCH_SERVER env var
    /// or the config file)
    #[arg(long, env = "COSTWATCH_SERVER")]
    pub server: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect generated reports
    #[command(subcommand)]
    Report(ReportCommands),

    /// Show on-demand to reserved conversion suggestions
    Suggestions {
        /// Account to show suggestions for
        #[arg(long, short)]
        account: String,

        /// Show every accepted suggestion, not just the surfaced top
        #[arg(long)]
        all: bool,

        /// Sort order
        #[arg(long, default_value = "delta")]
        sort: suggestions::SortBy,
    },

    /// Show low-used instance aggregates
    LowUsed {
        /// Account to show low-used instances for
        #[arg(long, short)]
        account: String,

        /// Restrict to one resource kind
        #[arg(long)]
        kind: Option<low_used::Kind>,
    },

    /// Show daemon health and readiness
    Health,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// List the latest report per account
    List,

    /// Show one account's latest report
    Show {
        /// Account to show
        #[arg(long, short)]
        account: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Flag and env beat the config file; the config file beats the default
    let server = match cli.server {
        Some(server) => server,
        None => config::Config::load()
            .ok()
            .and_then(|c| c.server)
            .unwrap_or_else(|| DEFAULT_SERVER.to_string()),
    };

    let client = client::ApiClient::new(&server)?;

    match cli.command {
        Commands::Report(report_cmd) => match report_cmd {
            ReportCommands::List => {
                report::list(&client, cli.format).await?;
            }
            ReportCommands::Show { account } => {
                report::show(&client, &account, cli.format).await?;
            }
        },
        Commands::Suggestions { account, all, sort } => {
            suggestions::show(&client, &account, all, sort, cli.format).await?;
        }
        Commands::LowUsed { account, kind } => {
            low_used::show(&client, &account, kind, cli.format).await?;
        }
        Commands::Health => {
            health::show(&client, cli.format).await?;
        }
    }

    Ok(())
}
