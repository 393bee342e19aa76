//! Export command - write the cached snapshot as CSV

use std::path::PathBuf;

use clap::Args;

use crate::commands::Context;
use crate::error::CliResult;
use crate::export::export_view;
use crate::output::{print_key_value, print_success};

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Directory for the CSV files
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

/// Execute the export command
pub async fn execute(args: ExportArgs, ctx: Context) -> CliResult<()> {
    let view = ctx.cache().view()?;
    let written = export_view(&view, &args.dir)?;

    print_success(&format!(
        "Exported snapshot {} to {}",
        view.version(),
        args.dir.display()
    ));
    for file in &written {
        print_key_value(
            file.collection.as_str(),
            &format!("{} records -> {}", file.records, file.path.display()),
        );
    }
    Ok(())
}
