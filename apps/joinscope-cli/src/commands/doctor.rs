//! Doctor command - diagnose configuration and source connectivity

use clap::Args;
use joinscope_core::DeviceInventorySource;
use serde::Serialize;

use crate::commands::Context;
use crate::error::{CliError, CliResult};
use crate::sources::build_sources;

const RESET: &str = "\x1b[0m";

/// Arguments for the doctor command
#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Outcome of one diagnostic check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticStatus {
    Pass,
    Warn,
    Fail,
}

impl DiagnosticStatus {
    fn symbol(self) -> &'static str {
        match self {
            DiagnosticStatus::Pass => "✓",
            DiagnosticStatus::Warn => "!",
            DiagnosticStatus::Fail => "✗",
        }
    }

    fn color(self) -> &'static str {
        match self {
            DiagnosticStatus::Pass => "\x1b[32m",
            DiagnosticStatus::Warn => "\x1b[33m",
            DiagnosticStatus::Fail => "\x1b[31m",
        }
    }
}

/// A single diagnostic check
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticCheck {
    pub name: String,
    pub status: DiagnosticStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl DiagnosticCheck {
    pub fn pass(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: DiagnosticStatus::Pass,
            message: message.to_string(),
            suggestion: None,
        }
    }

    pub fn warn(name: &str, message: &str, suggestion: &str) -> Self {
        Self {
            name: name.to_string(),
            status: DiagnosticStatus::Warn,
            message: message.to_string(),
            suggestion: Some(suggestion.to_string()),
        }
    }

    pub fn fail(name: &str, message: &str, suggestion: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            status: DiagnosticStatus::Fail,
            message: message.to_string(),
            suggestion: suggestion.map(str::to_string),
        }
    }
}

async fn check_source(adapter: &dyn DeviceInventorySource) -> DiagnosticCheck {
    let name = adapter.source().label();
    match adapter.test_connection().await {
        Ok(()) => DiagnosticCheck::pass(name, adapter.display_name()),
        Err(e) => {
            let suggestion = if e.is_transient() {
                Some("The source may be busy or unreachable; try again")
            } else {
                None
            };
            DiagnosticCheck::fail(name, &e.to_string(), suggestion)
        }
    }
}

/// Run all diagnostic checks
pub async fn run_all_checks(ctx: Context) -> Vec<DiagnosticCheck> {
    let mut checks = Vec::new();

    checks.push(if ctx.paths.config_file.exists() {
        DiagnosticCheck::pass(
            "Configuration",
            &format!("{} loaded", ctx.paths.config_file.display()),
        )
    } else {
        DiagnosticCheck::warn(
            "Configuration",
            &format!("{} not found, using defaults", ctx.paths.config_file.display()),
            "Create the file with directory/graph sections or file sources",
        )
    });

    let cache = ctx.cache();
    checks.push(match cache.load() {
        Ok(Some(snapshot)) => DiagnosticCheck::pass(
            "Snapshot cache",
            &format!(
                "version {} captured {}",
                snapshot.version,
                snapshot.captured_at.format("%Y-%m-%d %H:%M UTC")
            ),
        ),
        Ok(None) => DiagnosticCheck::warn(
            "Snapshot cache",
            "No snapshot cached",
            "Run 'joinscope refresh'",
        ),
        Err(e) => DiagnosticCheck::fail("Snapshot cache", &e.to_string(), Some("Run 'joinscope refresh'")),
    });

    match build_sources(ctx.config) {
        Ok(sources) => {
            for (_, adapter) in sources.iter() {
                checks.push(check_source(adapter).await);
            }
        }
        Err(e) => checks.push(DiagnosticCheck::fail("Sources", &e.to_string(), None)),
    }

    checks
}

fn print_checks(checks: &[DiagnosticCheck]) {
    let use_color = std::env::var("NO_COLOR").is_err();

    println!();
    println!("joinscope doctor");
    println!("═══════════════════════════════════════════════════════");
    println!();

    for check in checks {
        let status = if use_color {
            format!("{}{}{RESET}", check.status.color(), check.status.symbol())
        } else {
            check.status.symbol().to_string()
        };
        println!("  {status} {:<20} {}", check.name, check.message);
        if let Some(ref suggestion) = check.suggestion {
            println!("      └─ {suggestion}");
        }
    }
    println!();
}

/// Execute the doctor command
pub async fn execute(args: DoctorArgs, ctx: Context) -> CliResult<()> {
    let checks = run_all_checks(ctx).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&checks)?);
    } else {
        print_checks(&checks);
    }

    let failed = checks
        .iter()
        .filter(|c| c.status == DiagnosticStatus::Fail)
        .count();
    if failed > 0 {
        return Err(CliError::ChecksFailed(format!("{failed} check(s) failed")));
    }
    Ok(())
}
