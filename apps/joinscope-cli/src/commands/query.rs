//! Query command - list records by category or ad-hoc filter

use clap::Args;
use joinscope_core::{DeviceFilter, DeviceRecord, DeviceSource};
use joinscope_reconciliation::{Collection, DeviceCategory};

use crate::commands::Context;
use crate::error::{CliError, CliResult};
use crate::output::print_records;

/// Arguments for the query command
#[derive(Args, Debug, Default)]
pub struct QueryArgs {
    /// Standard category (e.g. directory-only, identity-not-managed, broken)
    pub category: Option<String>,

    /// Collection to query when no category is given (directory, identity, mdm, broken)
    #[arg(long, short)]
    pub collection: Option<String>,

    /// Only records present in this source (repeatable)
    #[arg(long, value_name = "SOURCE")]
    pub present_in: Vec<String>,

    /// Only records absent from this source (repeatable)
    #[arg(long, value_name = "SOURCE")]
    pub absent_from: Vec<String>,

    /// Attribute equals value, case-insensitive (repeatable)
    #[arg(long = "where", value_name = "ATTR=VALUE")]
    pub equals: Vec<String>,

    /// Attribute contains value, case-insensitive (repeatable)
    #[arg(long, value_name = "ATTR=VALUE")]
    pub contains: Vec<String>,

    /// Only records carrying a secondary identifier
    #[arg(long)]
    pub with_secondary_id: bool,

    /// Maximum rows to print
    #[arg(long, default_value_t = 200)]
    pub limit: usize,

    /// Print only the number of matches
    #[arg(long)]
    pub count: bool,

    /// List the standard categories and exit
    #[arg(long)]
    pub list_categories: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_source(value: &str) -> CliResult<DeviceSource> {
    value
        .parse()
        .map_err(|e: joinscope_core::ParseDeviceSourceError| CliError::Validation(e.to_string()))
}

fn parse_pair(value: &str) -> CliResult<(&str, &str)> {
    value
        .split_once('=')
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| CliError::Validation(format!("expected ATTR=VALUE, got '{value}'")))
}

impl QueryArgs {
    /// Resolve the arguments to a collection and a filter.
    pub fn selection(&self) -> CliResult<(Collection, DeviceFilter)> {
        let (collection, mut filter) = match (&self.category, &self.collection) {
            (Some(category), None) => {
                let category: DeviceCategory = category.parse()?;
                (category.collection(), category.filter())
            }
            (None, Some(collection)) => (collection.parse::<Collection>()?, DeviceFilter::All),
            (Some(_), Some(_)) => {
                return Err(CliError::Validation(
                    "give either a category or --collection, not both".to_string(),
                ))
            }
            (None, None) => {
                return Err(CliError::Validation(
                    "give a category or --collection (see --list-categories)".to_string(),
                ))
            }
        };

        for source in &self.present_in {
            filter = filter.and_with(DeviceFilter::present_in(parse_source(source)?));
        }
        for source in &self.absent_from {
            filter = filter.and_with(DeviceFilter::absent_from(parse_source(source)?));
        }
        for pair in &self.equals {
            let (attribute, value) = parse_pair(pair)?;
            filter = filter.and_with(DeviceFilter::eq_ignore_case(attribute, value));
        }
        for pair in &self.contains {
            let (attribute, value) = parse_pair(pair)?;
            filter = filter.and_with(DeviceFilter::contains(attribute, value));
        }
        if self.with_secondary_id {
            filter = filter.and_with(DeviceFilter::HasSecondaryId);
        }
        Ok((collection, filter))
    }
}

fn print_categories() {
    for category in DeviceCategory::all() {
        println!("  {:<28} {}", category.as_str(), category.description());
    }
}

/// Execute the query command
pub async fn execute(args: QueryArgs, ctx: Context) -> CliResult<()> {
    if args.list_categories {
        print_categories();
        return Ok(());
    }

    let (collection, filter) = args.selection()?;
    let view = ctx.cache().view()?;
    tracing::debug!(collection = %collection, filter = ?filter, "Running query");
    let records: Vec<&DeviceRecord> = view.filter(collection, &filter);

    if args.count {
        println!("{}", records.len());
    } else if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print_records(&records, Some(args.limit));
        println!("\n{} {collection} record(s)", records.len());
    }
    Ok(())
}
