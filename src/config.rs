//! Application directories and user settings.
//!
//! Everything lives under one versioned home directory:
//!
//! ```text
//! <data dir>/Accountant@<version>/
//!     config.toml
//!     Database/Accountant_DB.csv
//!     Log@<version>/
//! ```
//!
//! `ACCOUNTANT_HOME` replaces the home directory when set.

use std::fs::{self, OpenOptions};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::form::DEFAULT_TAGS;
use crate::theme::ThemeMode;

pub const APP_NAME: &str = "Accountant";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const HOME_ENV: &str = "ACCOUNTANT_HOME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    base_dir: PathBuf,
}

impl AppPaths {
    /// Resolves the home directory from `ACCOUNTANT_HOME` or the platform data directory.
    pub fn new() -> Result<Self, ConfigError> {
        let base_dir = match std::env::var_os(HOME_ENV) {
            Some(custom) => PathBuf::from(custom),
            None => dirs::data_dir()
                .ok_or(ConfigError::NoDataDir)?
                .join(format!("{APP_NAME}@{VERSION}")),
        };
        Ok(Self { base_dir })
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn database_dir(&self) -> PathBuf {
        self.base_dir.join("Database")
    }

    pub fn ledger_file(&self) -> PathBuf {
        self.database_dir().join(format!("{APP_NAME}_DB.csv"))
    }

    pub fn log_dir(&self) -> PathBuf {
        self.base_dir.join(format!("Log@{VERSION}"))
    }

    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.toml")
    }

    /// Creates the directory tree and an empty ledger file if they are missing.
    pub fn ensure_store(&self) -> Result<PathBuf, ConfigError> {
        for dir in [self.database_dir(), self.log_dir()] {
            if !dir.exists() {
                fs::create_dir_all(&dir).map_err(|source| ConfigError::Write {
                    path: dir.clone(),
                    source,
                })?;
                tracing::debug!(path = %dir.display(), "created directory");
            }
        }

        let ledger = self.ledger_file();
        if !ledger.exists() {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&ledger)
                .map_err(|source| ConfigError::Write {
                    path: ledger.clone(),
                    source,
                })?;
            tracing::info!(path = %ledger.display(), "created ledger file");
        }
        Ok(ledger)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_page_size")]
    pub page_size: NonZeroUsize,
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub theme: ThemeMode,
    /// Overrides the ledger location inside the application home.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_path: Option<PathBuf>,
}

fn default_page_size() -> NonZeroUsize {
    NonZeroUsize::new(5).unwrap_or(NonZeroUsize::MIN)
}

fn default_tags() -> Vec<String> {
    DEFAULT_TAGS.iter().map(|tag| tag.to_string()).collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            tags: default_tags(),
            theme: ThemeMode::default(),
            ledger_path: None,
        }
    }
}

impl Settings {
    /// Missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!("Loaded config from {}: {:?}", path.display(), settings);
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn ledger_path(&self, paths: &AppPaths) -> PathBuf {
        self.ledger_path
            .clone()
            .unwrap_or_else(|| paths.ledger_file())
    }
}
