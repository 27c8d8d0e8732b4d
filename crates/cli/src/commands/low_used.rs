//! Low-utilization commands

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, LowUsageReport};
use crate::output::{format_currency, format_power, print_warning, OutputFormat};

/// Resource kind filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Kind {
    Ec2,
    Rds,
}

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "Type")]
    instance_type: String,
    #[tabled(rename = "Instances")]
    instances: usize,
    #[tabled(rename = "Power")]
    power: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Names")]
    names: String,
}

/// Show low-used instance aggregates for an account
pub async fn show(
    client: &ApiClient,
    account: &str,
    kind: Option<Kind>,
    format: OutputFormat,
) -> Result<()> {
    let report = client.report(account).await?;

    let sections: Vec<&LowUsageReport> = match kind {
        Some(Kind::Ec2) => vec![&report.low_used_ec2],
        Some(Kind::Rds) => vec![&report.low_used_rds],
        None => vec![&report.low_used_ec2, &report.low_used_rds],
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&sections)?);
        }
        OutputFormat::Table => {
            for section in sections {
                print_section(account, section);
                println!();
            }
        }
    }

    Ok(())
}

fn print_section(account: &str, section: &LowUsageReport) {
    println!(
        "{}",
        format!(
            "Low-used {} instances for account {account}",
            section.kind.to_uppercase()
        )
        .bold()
    );
    println!("{}", "=".repeat(60));

    if section.low_used_instances == 0 {
        print_warning(&format!(
            "None of the {} instances fall under the low-usage thresholds",
            section.total_instances
        ));
        return;
    }

    println!(
        "Low-used:               {} of {} instances",
        section.low_used_instances.to_string().yellow().bold(),
        section.total_instances
    );
    println!(
        "Cost over the window:   {}",
        format_currency(section.low_used_cost).yellow()
    );

    let rows: Vec<Row> = section
        .top
        .iter()
        .map(|a| Row {
            instance_type: a.instance_type.clone(),
            instances: a.names.len(),
            power: format_power(a.power),
            cost: format_currency(a.cost),
            names: join_names(&a.names),
        })
        .collect();

    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", table);
}

/// Keep the names column readable for wide aggregates
fn join_names(names: &[String]) -> String {
    const SHOWN: usize = 4;
    if names.len() <= SHOWN {
        names.join(", ")
    } else {
        format!(
            "{}, … ({} more)",
            names[..SHOWN].join(", "),
            names.len() - SHOWN
        )
    }
}
