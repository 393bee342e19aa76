//! Snapshot cache between CLI invocations
//!
//! `refresh` writes the reconciled snapshot as JSON; every other command
//! restores it into a [`SnapshotStore`] and queries through the store, so a
//! missing cache surfaces as the store's "not refreshed" precondition.

use std::path::{Path, PathBuf};

use joinscope_reconciliation::{Snapshot, SnapshotStore, SnapshotView};

use crate::error::{CliError, CliResult};

/// Snapshot cache file.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    path: PathBuf,
}

impl SnapshotCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the snapshot, replacing any previous cache atomically.
    pub fn save(&self, snapshot: &Snapshot) -> CliResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_vec(snapshot)?;
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), version = snapshot.version, "Snapshot cached");
        Ok(())
    }

    /// Read the cached snapshot, if any.
    pub fn load(&self) -> CliResult<Option<Snapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read(&self.path)?;
        let snapshot = serde_json::from_slice(&content).map_err(|e| {
            CliError::Config(format!(
                "Snapshot cache {} is corrupt ({e}); run 'joinscope refresh' again",
                self.path.display()
            ))
        })?;
        Ok(Some(snapshot))
    }

    /// Restore the cache into a store, keeping its version.
    pub fn restore_into(&self, store: &SnapshotStore) -> CliResult<()> {
        if let Some(snapshot) = self.load()? {
            store.restore(snapshot);
        }
        Ok(())
    }

    /// Query view over the cached snapshot.
    ///
    /// Fails with [`CliError::NoSnapshot`] when nothing was cached yet.
    pub fn view(&self) -> CliResult<SnapshotView> {
        let store = SnapshotStore::new();
        self.restore_into(&store)?;
        Ok(SnapshotView::new(store.current()?))
    }
}
