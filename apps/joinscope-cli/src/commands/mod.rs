//! CLI command implementations

pub mod doctor;
pub mod export;
pub mod lookup;
pub mod query;
pub mod refresh;
pub mod status;

use std::path::Path;

use crate::cache::SnapshotCache;
use crate::config::{Config, ConfigPaths};
use crate::error::CliResult;

/// Paths and configuration shared by every command.
#[derive(Debug)]
pub struct Context {
    pub paths: ConfigPaths,
    pub config: Config,
}

impl Context {
    pub fn load(config_file: Option<&Path>) -> CliResult<Self> {
        let paths = ConfigPaths::new(config_file)?;
        let config = Config::load(&paths)?;
        Ok(Self { paths, config })
    }

    pub fn cache(&self) -> SnapshotCache {
        SnapshotCache::new(self.config.snapshot_file(&self.paths))
    }
}
