//! Refresh command - fetch all three inventories, reconcile and cache

use std::path::PathBuf;

use clap::Args;
use joinscope_core::DeviceSource;
use joinscope_reconciliation::{ReconciliationEngine, ReconciliationReport, SnapshotStore, SnapshotView};

use crate::commands::Context;
use crate::config::FileSourceConfig;
use crate::error::CliResult;
use crate::output::{print_key_value, print_success};
use crate::sources::build_sources;

/// Arguments for the refresh command
#[derive(Args, Debug)]
pub struct RefreshArgs {
    /// Read directory computers from a JSON export instead of LDAP
    #[arg(long, value_name = "FILE")]
    pub directory_file: Option<PathBuf>,

    /// Read identity-service devices from a JSON export instead of Graph
    #[arg(long, value_name = "FILE")]
    pub identity_file: Option<PathBuf>,

    /// Read managed devices from a JSON export instead of Graph
    #[arg(long, value_name = "FILE")]
    pub mdm_file: Option<PathBuf>,

    /// Output the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl RefreshArgs {
    fn file_overrides(&self) -> [(DeviceSource, Option<&PathBuf>); 3] {
        [
            (DeviceSource::Directory, self.directory_file.as_ref()),
            (DeviceSource::IdentityService, self.identity_file.as_ref()),
            (DeviceSource::DeviceManagement, self.mdm_file.as_ref()),
        ]
    }
}

/// Execute the refresh command
pub async fn execute(args: RefreshArgs, mut ctx: Context) -> CliResult<()> {
    for (source, path) in args.file_overrides() {
        if let Some(path) = path {
            ctx.config.files.set(source, FileSourceConfig::new(path.clone()));
        }
    }

    let cache = ctx.cache();
    let store = SnapshotStore::new();
    // An unreadable cache only loses the version counter; this pass replaces it.
    if let Err(e) = cache.restore_into(&store) {
        tracing::warn!(
            path = %cache.path().display(),
            error = %e,
            "Ignoring unreadable snapshot cache"
        );
    }
    let engine = ReconciliationEngine::with_store(ctx.config.reconciliation.to_engine_config(), store);

    let sources = build_sources(ctx.config)?;
    for (source, adapter) in sources.iter() {
        tracing::info!(source = %source, adapter = adapter.display_name(), "Fetching inventory");
    }

    let outcome = engine.refresh(&sources).await?;
    cache.save(&outcome.snapshot)?;

    let report = ReconciliationReport::generate(&SnapshotView::new(outcome.snapshot));
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let stats = &report.run.statistics;
    print_success(&format!("Snapshot {} captured", report.run.version));
    print_key_value("Directory", &stats.directory_total.to_string());
    print_key_value("Identity service", &stats.identity_total.to_string());
    print_key_value("Device management", &stats.device_management_total.to_string());
    print_key_value(
        "Directory in identity service",
        &stats.directory_in_identity.to_string(),
    );
    print_key_value(
        "Directory fully managed",
        &stats.directory_in_device_management.to_string(),
    );
    print_key_value("Broken", &stats.broken_total.to_string());
    print_key_value("Cache", &cache.path().display().to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SnapshotCache;
    use crate::commands::test_support::file_context;

    fn args() -> RefreshArgs {
        RefreshArgs {
            directory_file: None,
            identity_file: None,
            mdm_file: None,
            json: true,
        }
    }

    #[tokio::test]
    async fn test_refresh_from_files_writes_cache() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = file_context(&dir);
        let cache = ctx.cache();

        execute(args(), ctx).await.unwrap();

        let view = cache.view().unwrap();
        assert_eq!(view.version(), 1);
        let broken: Vec<&str> = view.snapshot().broken.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(broken, vec!["PC3"]);
        assert!(view.lookup_by_name("PC1").in_device_management);
    }

    #[tokio::test]
    async fn test_refresh_continues_version_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        execute(args(), file_context(&dir)).await.unwrap();
        execute(args(), file_context(&dir)).await.unwrap();

        let view = file_context(&dir).cache().view().unwrap();
        assert_eq!(view.version(), 2);
    }

    #[tokio::test]
    async fn test_refresh_replaces_corrupt_cache() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot_path = dir.path().join("snapshot.json");
        std::fs::write(&snapshot_path, "{not json").unwrap();
        assert!(SnapshotCache::new(&snapshot_path).view().is_err());

        execute(args(), file_context(&dir)).await.unwrap();

        let view = SnapshotCache::new(&snapshot_path).view().unwrap();
        assert_eq!(view.version(), 1);
        assert_eq!(view.snapshot().directory.len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_file_flag_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = file_context(&dir);
        let cache = ctx.cache();
        let extra = dir.path().join("more-ad.json");
        std::fs::write(
            &extra,
            r#"[{"name": "PC1"}, {"name": "PC8", "operatingSystem": "Windows"}]"#,
        )
        .unwrap();

        let mut args = args();
        args.directory_file = Some(extra);
        execute(args, ctx).await.unwrap();

        assert_eq!(cache.view().unwrap().snapshot().directory.len(), 2);
    }
}
