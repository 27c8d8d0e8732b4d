//! Report listing and inspection commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, ReportSummary};
use crate::output::{
    format_currency, format_percent, format_power, format_timestamp, print_info, print_warning,
    OutputFormat,
};

/// Row for the report index table
#[derive(Tabled)]
struct IndexRow {
    #[tabled(rename = "Account")]
    account: String,
    #[tabled(rename = "Window")]
    window: String,
    #[tabled(rename = "Generated")]
    generated: String,
    #[tabled(rename = "Reservations")]
    reservations: i64,
    #[tabled(rename = "Low-used")]
    low_used: u64,
    #[tabled(rename = "Suggestions")]
    suggestions: usize,
    #[tabled(rename = "Potential saving")]
    potential_saving: String,
}

/// Row for the expiring-reservations table
#[derive(Tabled)]
struct ExpiringRow {
    #[tabled(rename = "Type")]
    instance_type: String,
    #[tabled(rename = "Count")]
    count: i64,
    #[tabled(rename = "Power")]
    power: String,
    #[tabled(rename = "End dates")]
    dates: String,
}

/// Row for the top-buckets table
#[derive(Tabled)]
struct BucketRow {
    #[tabled(rename = "Bucket")]
    bucket: String,
    #[tabled(rename = "GB-months")]
    gb_months: String,
    #[tabled(rename = "Cost")]
    cost: String,
}

/// List the latest report per account
pub async fn list(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let index = client.report_index().await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&index)?);
        }
        OutputFormat::Table => {
            if index.is_empty() {
                print_warning("No reports generated yet");
                return Ok(());
            }

            let rows: Vec<IndexRow> = index
                .iter()
                .map(|e| IndexRow {
                    account: e.account.clone(),
                    window: e.window.cadence.clone(),
                    generated: format_timestamp(&e.generated_at),
                    reservations: e.total_active_reservations,
                    low_used: e.low_used_instances,
                    suggestions: e.suggestion_count,
                    potential_saving: format_currency(e.potential_saving).green().to_string(),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}

/// Show one account's latest report
pub async fn show(client: &ApiClient, account: &str, format: OutputFormat) -> Result<()> {
    let report = client.report(account).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => print_report(&report),
    }

    Ok(())
}

fn print_report(report: &ReportSummary) {
    println!("{}", format!("Report for account {}", report.account).bold());
    println!("{}", "=".repeat(60));
    println!(
        "Window:                 {} ({} to {})",
        report.window.cadence.cyan(),
        format_timestamp(&report.window.start),
        format_timestamp(&report.window.end)
    );
    println!(
        "Generated:              {}",
        format_timestamp(&report.generated_at).dimmed()
    );
    println!();

    println!("{}", "Reservations".bold());
    println!("{}", "-".repeat(60));
    println!("Active:                 {}", report.reservations.total_active);
    println!(
        "Invested (yearly):      {}",
        format_currency(report.reservations.total_invested)
    );
    match &report.reservations.expiring {
        Some(expiring) => {
            println!(
                "Expiring by {}: {}",
                expiring.horizon.format("%Y-%m-%d"),
                expiring.total_count.to_string().yellow().bold()
            );
            let rows: Vec<ExpiringRow> = expiring
                .by_type
                .iter()
                .map(|t| ExpiringRow {
                    instance_type: t.instance_type.clone(),
                    count: t.count,
                    power: format_power(t.power),
                    dates: t
                        .dates
                        .iter()
                        .map(|d| format!("{} ({})", d.date, d.count))
                        .collect::<Vec<_>>()
                        .join(", "),
                })
                .collect();
            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
        None => print_info("Nothing expiring within the horizon"),
    }
    println!();

    println!("{}", "Usage".bold());
    println!("{}", "-".repeat(60));
    println!(
        "On-demand:              {}",
        format_percent(report.proportions.on_demand_percent)
    );
    println!(
        "Discounted:             {}",
        format_percent(report.proportions.discounted_percent).green()
    );
    if !report.family_power.is_empty() {
        let shares: Vec<String> = report
            .family_power
            .iter()
            .map(|f| format!("{} {}", f.family, format_percent(f.percent)))
            .collect();
        println!("Power by family:        {}", shares.join(", "));
    }
    if let Some(histogram) = &report.cpu_histogram {
        println!(
            "CPU histogram:          {} instances in {} buckets of {:.1}pp ({:.1}%..{:.1}%)",
            histogram.counts.iter().sum::<u64>(),
            histogram.counts.len(),
            histogram.bucket_width,
            histogram.min,
            histogram.max
        );
    }
    println!();

    println!("{}", "Low utilization".bold());
    println!("{}", "-".repeat(60));
    for section in [&report.low_used_ec2, &report.low_used_rds] {
        println!(
            "{}: {} of {} instances, {} per window",
            section.kind.to_uppercase(),
            section.low_used_instances.to_string().yellow(),
            section.total_instances,
            format_currency(section.low_used_cost)
        );
    }
    println!();

    println!("{}", "Storage".bold());
    println!("{}", "-".repeat(60));
    println!("Buckets:                {}", report.storage.bucket_count);
    println!(
        "Usage:                  {:.1} GB-months",
        report.storage.total_gb_months
    );
    println!(
        "Cost:                   {} ({}/day)",
        format_currency(report.storage.total_cost),
        format_currency(report.storage.daily_cost)
    );
    if !report.storage.top.is_empty() {
        let rows: Vec<BucketRow> = report
            .storage
            .top
            .iter()
            .map(|b| BucketRow {
                bucket: b.bucket.clone(),
                gb_months: format!("{:.1}", b.gb_months),
                cost: format_currency(b.cost),
            })
            .collect();
        let table = tabled::Table::new(rows)
            .with(tabled::settings::Style::rounded())
            .to_string();
        println!("{}", table);
    }
    println!();

    println!("{}", "Totals".bold());
    println!("{}", "-".repeat(60));
    println!(
        "EC2:                    {} instances, {}",
        report.totals.ec2.count,
        format_currency(report.totals.ec2.cost)
    );
    println!(
        "RDS:                    {} instances, {}",
        report.totals.rds.count,
        format_currency(report.totals.rds.cost)
    );
    println!(
        "S3:                     {} buckets, {}",
        report.totals.s3.count,
        format_currency(report.totals.s3.cost)
    );

    let suggestion_count = report.suggestions.as_ref().map_or(0, |s| s.len());
    if suggestion_count > 0 {
        println!();
        println!(
            "{} {}",
            format!("{} conversion suggestion(s) available;", suggestion_count).bold(),
            format!("run `cw suggestions --account {}`", report.account).cyan()
        );
    }
}
