//! Runtime configuration.
//!
//! Resolved once at process startup and passed into core services; nothing
//! below the binary reads environment variables.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "NUTRIAPP_DATA_DIR";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DATABASE_FILE_NAME: &str = "nutriapp.db";
pub const DEFAULT_PAGE_LINES: usize = 60;

/// Smallest page that still fits the document header.
pub const MIN_PAGE_LINES: usize = 10;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("data directory cannot be empty")]
    EmptyDataDir,

    #[error("page length must be 0 (no pagination) or at least 10 lines, got {0}")]
    PageLength(usize),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    data_dir: PathBuf,
    page_lines: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            page_lines: DEFAULT_PAGE_LINES,
        }
    }
}

impl AppConfig {
    pub fn new(data_dir: PathBuf, page_lines: usize) -> Result<Self, ConfigError> {
        if data_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDataDir);
        }
        if page_lines != 0 && page_lines < MIN_PAGE_LINES {
            return Err(ConfigError::PageLength(page_lines));
        }
        Ok(Self {
            data_dir,
            page_lines,
        })
    }

    /// Resolve the data directory: explicit override, then the environment
    /// value, then [`DEFAULT_DATA_DIR`]. Blank values are skipped.
    pub fn resolve(
        override_dir: Option<PathBuf>,
        env_value: Option<String>,
        page_lines: Option<usize>,
    ) -> Result<Self, ConfigError> {
        let data_dir = override_dir
            .filter(|dir| !dir.as_os_str().is_empty())
            .or_else(|| {
                env_value
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from)
            })
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        Self::new(data_dir, page_lines.unwrap_or(DEFAULT_PAGE_LINES))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE_NAME)
    }

    pub fn page_lines(&self) -> usize {
        self.page_lines
    }
}
