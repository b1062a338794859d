//! Builder for creating and configuring Tracker instances.

use std::path::{Path, PathBuf};

use super::Tracker;
use crate::{
    config::EngineConfig,
    error::{ProgressError, Result},
};

/// Builder for creating and configuring Tracker instances.
#[derive(Debug, Clone, Default)]
pub struct TrackerBuilder {
    database_path: Option<PathBuf>,
    config: EngineConfig,
}

impl TrackerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/stepwise/stepwise.db` or
    /// `~/.local/share/stepwise/stepwise.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.database_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Replaces the engine configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the configured tracker instance.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::FileSystem` if the database directory cannot be created
    /// Returns `ProgressError::Database` if database initialization fails
    pub async fn build(self) -> Result<Tracker> {
        let db_path = match self.database_path {
            Some(path) => path,
            None => Self::default_database_path()?,
        };

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ProgressError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let tracker = Tracker::new(db_path, self.config);
        // Opening once applies the schema and migrations
        tracker.with_database(|_| Ok(())).await?;

        Ok(tracker)
    }

    /// Returns the default database path following XDG Base Directory
    /// specification.
    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("stepwise")
            .place_data_file("stepwise.db")
            .map_err(|e| ProgressError::XdgDirectory(e.to_string()))
    }
}
