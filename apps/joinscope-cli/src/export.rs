//! CSV export of a reconciled snapshot
//!
//! One file per collection plus the broken subset. Every record keeps its
//! core fields, all three presence flags and every pass-through attribute;
//! attribute columns are the sorted union of names across the file. An
//! attribute named like a core column is written under `attr.<name>`.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use joinscope_core::{AttributeValue, DeviceRecord};
use joinscope_reconciliation::{Collection, SnapshotView};

use crate::error::{CliError, CliResult};

const CORE_COLUMNS: &[&str] = &[
    "name",
    "secondary_id",
    "origin",
    "in_directory",
    "in_identity_service",
    "in_device_management",
];

/// Prefix for attribute columns that collide with a core column.
const ATTRIBUTE_PREFIX: &str = "attr.";

/// One written export file.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub collection: Collection,
    pub path: PathBuf,
    pub records: usize,
}

/// Render an attribute for a CSV cell without losing structure.
pub fn attribute_cell(value: &AttributeValue) -> CliResult<String> {
    match value {
        AttributeValue::Null => Ok(String::new()),
        AttributeValue::Array(_) | AttributeValue::Object(_) => {
            serde_json::to_string(value).map_err(|e| CliError::Export(e.to_string()))
        }
        other => Ok(other.to_string()),
    }
}

/// Header for an attribute column.
pub fn attribute_header(name: &str) -> String {
    if CORE_COLUMNS.contains(&name) {
        format!("{ATTRIBUTE_PREFIX}{name}")
    } else {
        name.to_string()
    }
}

/// Write records as CSV.
pub fn write_records<W: Write>(writer: W, records: &[DeviceRecord]) -> CliResult<()> {
    let attribute_names: BTreeSet<&str> = records
        .iter()
        .flat_map(|record| record.attributes.names())
        .collect();

    let mut wtr = csv::Writer::from_writer(writer);
    let header: Vec<String> = CORE_COLUMNS
        .iter()
        .map(|column| (*column).to_string())
        .chain(attribute_names.iter().map(|name| attribute_header(name)))
        .collect();
    wtr.write_record(&header)?;

    for record in records {
        let flags = record.flags();
        let mut row = vec![
            record.name.clone(),
            record.secondary_id().unwrap_or_default().to_string(),
            record.origin().to_string(),
            flags.in_directory().to_string(),
            flags.in_identity_service().to_string(),
            flags.in_device_management().to_string(),
        ];
        for name in &attribute_names {
            row.push(match record.attributes.get(name) {
                Some(value) => attribute_cell(value)?,
                None => String::new(),
            });
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// File name used for a collection's export.
pub fn file_name(collection: Collection) -> String {
    format!("{}.csv", collection.as_str())
}

/// Export every collection of the view into `dir`.
pub fn export_view(view: &SnapshotView, dir: &Path) -> CliResult<Vec<ExportedFile>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for collection in Collection::all() {
        let records = view.collection(*collection);
        let path = dir.join(file_name(*collection));
        let file = std::fs::File::create(&path)?;
        write_records(std::io::BufWriter::new(file), records)?;
        tracing::debug!(path = %path.display(), records = records.len(), "Exported collection");
        written.push(ExportedFile {
            collection: *collection,
            path,
            records: records.len(),
        });
    }
    Ok(written)
}
