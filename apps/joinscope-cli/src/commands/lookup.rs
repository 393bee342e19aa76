//! Lookup command - presence of one device name across the three sources

use clap::Args;

use crate::commands::Context;
use crate::error::CliResult;
use crate::output::{print_info, print_presence};

/// Arguments for the lookup command
#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Device name (matched with the snapshot's name rules)
    pub name: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the lookup command
pub async fn execute(args: LookupArgs, ctx: Context) -> CliResult<()> {
    let view = ctx.cache().view()?;
    let report = view.lookup_by_name(&args.name);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if !report.found() {
        print_info(&format!("'{}' is not present in any source", args.name));
        return Ok(());
    }
    print_presence(&report);
    Ok(())
}
