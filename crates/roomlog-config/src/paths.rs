//! File system paths for roomlog.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Store filename under the base directory.
const DATABASE_FILE_NAME: &str = "roomlog.sqlite";
/// JSONL log filename under the logs directory.
const LOG_FILE_NAME: &str = "roomlog.jsonl";

/// Manages file system paths.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for config, store, and logs (~/.roomlog)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.roomlog`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".roomlog"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.roomlog).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.roomlog/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the shared store path (~/.roomlog/roomlog.sqlite).
    ///
    /// Every room in the fleet writes into this one file.
    pub fn database_file(&self) -> PathBuf {
        self.base_dir.join(DATABASE_FILE_NAME)
    }

    /// Get the logs directory (~/.roomlog/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the JSONL log file path (~/.roomlog/logs/roomlog.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join(LOG_FILE_NAME)
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_layout() {
        let paths = Paths::with_base_dir(PathBuf::from("/tmp/roomlog-test"));
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/roomlog-test/config.json"));
        assert_eq!(
            paths.database_file(),
            PathBuf::from("/tmp/roomlog-test/roomlog.sqlite")
        );
        assert_eq!(
            paths.log_file(),
            PathBuf::from("/tmp/roomlog-test/logs/roomlog.jsonl")
        );
    }

    #[test]
    fn test_ensure_dirs_creates_tree() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().join("nested").join("base"));

        paths.ensure_dirs().unwrap();

        assert!(paths.base_dir().is_dir());
        assert!(paths.logs_dir().is_dir());
    }
}
