//! Status command - summarize the cached snapshot

use chrono::{Duration, Utc};
use clap::Args;
use joinscope_reconciliation::{Collection, ReconciliationReport, SnapshotView};

use crate::commands::Context;
use crate::error::CliResult;
use crate::output::{format_age, print_header, print_key_value, print_warning};

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Whether a snapshot of this age needs a refresh.
pub fn is_stale(age: Duration, max_age_hours: u64) -> bool {
    let max_age = i64::try_from(max_age_hours).map_or(i64::MAX, |h| h.saturating_mul(60));
    max_age_hours > 0 && age.num_minutes() > max_age
}

/// Execute the status command
pub async fn execute(args: StatusArgs, ctx: Context) -> CliResult<()> {
    let view = ctx.cache().view()?;
    let report = ReconciliationReport::generate(&view);
    let age = view.snapshot().age(Utc::now());
    let stale = is_stale(age, ctx.config.max_snapshot_age_hours);

    if args.json {
        let mut value = serde_json::to_value(&report)?;
        value["age_minutes"] = serde_json::json!(age.num_minutes());
        value["stale"] = serde_json::json!(stale);
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print_status(&view, &report, age);
    if stale {
        print_warning(&format!(
            "Snapshot is older than {} hours. Run 'joinscope refresh' to update it.",
            ctx.config.max_snapshot_age_hours
        ));
    }
    Ok(())
}

fn print_status(view: &SnapshotView, report: &ReconciliationReport, age: Duration) {
    print_header("joinscope status");
    print_key_value("Snapshot", &format!("version {}", report.run.version));
    print_key_value(
        "Captured",
        &format!(
            "{} ({})",
            report.run.captured_at.format("%Y-%m-%d %H:%M:%S UTC"),
            format_age(age)
        ),
    );
    for collection in Collection::all() {
        print_key_value(
            &collection.to_string(),
            &view.collection(*collection).len().to_string(),
        );
    }

    println!();
    println!("Categories:");
    for category in &report.categories {
        println!(
            "  {:<28} {:>7}  {}",
            category.category.as_str(),
            category.count,
            category.description
        );
    }
    println!();
}
