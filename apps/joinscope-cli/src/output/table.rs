//! Table display helpers for CLI commands

use joinscope_core::DeviceRecord;
use joinscope_reconciliation::PresenceReport;

/// Truncate a string for table display, handling Unicode safely.
///
/// If the string exceeds `max_len`, it is truncated with "..." appended.
/// Uses character boundaries to avoid panicking on multi-byte characters.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

fn mark(present: bool) -> &'static str {
    if present {
        "yes"
    } else {
        "-"
    }
}

/// One table line per record.
pub fn record_row(record: &DeviceRecord) -> String {
    let flags = record.flags();
    format!(
        "{:<24} {:<38} {:<5} {:<5} {:<5} {}",
        truncate(&record.name, 24),
        record.secondary_id().unwrap_or("-"),
        mark(flags.in_directory()),
        mark(flags.in_identity_service()),
        mark(flags.in_device_management()),
        truncate(
            record
                .attributes
                .get_string("operatingSystem")
                .unwrap_or("-"),
            20
        ),
    )
}

/// Print records as a table, at most `limit` rows.
pub fn print_records(records: &[&DeviceRecord], limit: Option<usize>) {
    println!(
        "{:<24} {:<38} {:<5} {:<5} {:<5} OS",
        "NAME", "SECONDARY ID", "DIR", "IDENT", "MDM"
    );
    println!("{}", "─".repeat(100));
    let shown = limit.unwrap_or(records.len()).min(records.len());
    for record in &records[..shown] {
        println!("{}", record_row(record));
    }
    if shown < records.len() {
        println!("... {} more (use --limit or --json)", records.len() - shown);
    }
}

/// Print a single-name lookup.
pub fn print_presence(report: &PresenceReport) {
    println!("Device: {}", report.name);
    println!("  Directory:          {}", mark(report.in_directory));
    println!("  Identity service:   {}", mark(report.in_identity_service));
    println!("  Device management:  {}", mark(report.in_device_management));
    if report.broken {
        println!("  Broken:             yes (registered, never enrolled, no managed sibling)");
    }
    if !report.records.is_empty() {
        println!();
        let records: Vec<&DeviceRecord> = report.records.iter().collect();
        print_records(&records, None);
    }
}
