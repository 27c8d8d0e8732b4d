//! Conversion suggestion commands

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, SuggestionRow};
use crate::output::{format_currency, format_percent, print_warning, OutputFormat};

/// Sort order for suggestion output
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum SortBy {
    /// Relative saving, largest first (the served order)
    #[default]
    Delta,
    /// Absolute saving, largest first
    Cost,
}

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Type")]
    instance_type: String,
    #[tabled(rename = "Machines")]
    machines: u64,
    #[tabled(rename = "On-demand")]
    on_demand: String,
    #[tabled(rename = "Reserved")]
    reserved: String,
    #[tabled(rename = "Saving")]
    saving: String,
    #[tabled(rename = "Delta")]
    delta: String,
}

/// Show conversion suggestions for an account
pub async fn show(
    client: &ApiClient,
    account: &str,
    all: bool,
    sort: SortBy,
    format: OutputFormat,
) -> Result<()> {
    let response = client.suggestions(account).await?;

    let mut suggestions: Vec<SuggestionRow> = response
        .suggestions
        .into_iter()
        .filter(|s| all || s.surfaced)
        .collect();

    match sort {
        SortBy::Delta => suggestions.sort_by(|a, b| b.delta_percent.total_cmp(&a.delta_percent)),
        SortBy::Cost => suggestions.sort_by(|a, b| b.saving.total_cmp(&a.saving)),
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&suggestions)?);
        }
        OutputFormat::Table => {
            if suggestions.is_empty() {
                print_warning(&format!(
                    "No viable on-demand to reserved conversions for account {account}"
                ));
                return Ok(());
            }

            println!(
                "{}",
                format!("Conversion suggestions for account {account}").bold()
            );
            println!("{}", "=".repeat(60));

            let total_saving: f64 = suggestions.iter().map(|s| s.saving).sum();
            let rows: Vec<Row> = suggestions
                .iter()
                .map(|s| Row {
                    rank: s.rank,
                    instance_type: s.instance_type.clone(),
                    machines: s.machines,
                    on_demand: format_currency(s.on_demand_cost),
                    reserved: format_currency(s.reserved_cost),
                    saving: format_currency(s.saving).green().to_string(),
                    delta: format_percent(s.delta_percent),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!(
                "{} {}",
                "Total saving over the window:".bold(),
                format_currency(total_saving).green().bold()
            );
        }
    }

    Ok(())
}
