use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".library-roster-manager";
/// Environment variable that relocates the whole data directory.
pub const DATA_DIR_ENV: &str = "LIBRARY_ROSTER_DATA_DIR";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "library.sqlite";

/// Filesystem locations shared by both binaries.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Resolve the data directory from the environment or the user's home and
    /// make sure it exists.
    pub fn load() -> Result<Self> {
        let data_dir = match env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => default_data_dir()?,
        };
        Self::at(data_dir)
    }

    /// Build a config rooted at an explicit directory.
    pub fn at(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).context("failed to create data directory")?;
        Ok(Self { data_dir })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    /// Log file for the named binary, e.g. `library.log`.
    pub fn log_path(&self, app_name: &str) -> PathBuf {
        self.data_dir.join(format!("{app_name}.log"))
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_directory_is_created_and_used() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("nested").join("data");

        let config = AppConfig::at(&root).unwrap();

        assert!(root.is_dir());
        assert_eq!(config.db_path(), root.join("library.sqlite"));
        assert_eq!(config.log_path("roster"), root.join("roster.log"));
    }
}
