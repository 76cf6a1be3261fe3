//! Configuration Module
//!
//! Loads the optional `config.toml`, applies `LOGWARD_*` environment
//! overrides and turns the result plus command-line flags into the
//! settings structs each tool runs with.

use crate::aggregate::{AggregateSettings, DEFAULT_ACCESS_LOG, DEFAULT_TOP_N};
use crate::archive::select::{default_exclude_extensions, default_include_extensions};
use crate::archive::{default_archive_dir, ArchiveFormat, ArchiveSettings, SelectionFilter, DEFAULT_MAX_AGE_DAYS};
use crate::snapshot::{SnapshotSettings, DEFAULT_MOUNT_POINT, DEFAULT_TOP_PROCESSES};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_PATH_ENV: &str = "LOGWARD_CONFIG";

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LogwardConfig {
    pub archive: ArchiveSection,
    pub aggregate: AggregateSection,
    pub snapshot: SnapshotSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArchiveSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_dir: Option<PathBuf>,
    pub max_age_days: u64,
    pub format: ArchiveFormat,
    pub delete_originals: bool,
    pub include_extensions: Vec<String>,
    pub exclude_extensions: Vec<String>,
}

impl Default for ArchiveSection {
    fn default() -> Self {
        Self {
            archive_dir: None,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            format: ArchiveFormat::default(),
            delete_originals: false,
            include_extensions: default_include_extensions(),
            exclude_extensions: default_exclude_extensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AggregateSection {
    pub default_log: PathBuf,
    pub top_n: usize,
}

impl Default for AggregateSection {
    fn default() -> Self {
        Self {
            default_log: PathBuf::from(DEFAULT_ACCESS_LOG),
            top_n: DEFAULT_TOP_N,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SnapshotSection {
    pub mount_point: PathBuf,
    pub top_processes: usize,
}

impl Default for SnapshotSection {
    fn default() -> Self {
        Self {
            mount_point: PathBuf::from(DEFAULT_MOUNT_POINT),
            top_processes: DEFAULT_TOP_PROCESSES,
        }
    }
}

/// Archive flags as given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct ArchiveOverrides {
    pub archive_dir: Option<PathBuf>,
    pub max_age_days: Option<u64>,
    pub format: Option<ArchiveFormat>,
    pub delete_originals: bool,
    pub dry_run: bool,
}

impl LogwardConfig {
    /// Serialize to TOML string
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Deserialize from TOML string
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("Failed to parse configuration")
    }

    /// Apply `LOGWARD_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| env::var(key).ok())
    }

    /// Apply overrides from any key/value source.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = lookup("LOGWARD_ARCHIVE_DIR") {
            self.archive.archive_dir = Some(PathBuf::from(dir));
        }

        if let Some(days) = lookup("LOGWARD_MAX_AGE_DAYS") {
            self.archive.max_age_days = days
                .trim()
                .parse()
                .with_context(|| format!("LOGWARD_MAX_AGE_DAYS must be a whole number of days, got '{}'", days))?;
        }

        if let Some(format) = lookup("LOGWARD_ARCHIVE_FORMAT") {
            self.archive.format = format.trim().parse()?;
        }

        if let Some(log) = lookup("LOGWARD_ACCESS_LOG") {
            self.aggregate.default_log = PathBuf::from(log);
        }

        if let Some(top) = lookup("LOGWARD_TOP_N") {
            self.aggregate.top_n = top
                .trim()
                .parse()
                .with_context(|| format!("LOGWARD_TOP_N must be a positive number, got '{}'", top))?;
        }

        if let Some(mount) = lookup("LOGWARD_MOUNT_POINT") {
            self.snapshot.mount_point = PathBuf::from(mount);
        }

        Ok(())
    }

    pub fn aggregate_settings(&self, log_file: Option<PathBuf>, top_n: Option<usize>) -> AggregateSettings {
        AggregateSettings {
            log_file: log_file.unwrap_or_else(|| self.aggregate.default_log.clone()),
            top_n: top_n.unwrap_or(self.aggregate.top_n),
        }
    }

    pub fn archive_settings(&self, log_dir: PathBuf, overrides: ArchiveOverrides) -> ArchiveSettings {
        let archive_dir = overrides
            .archive_dir
            .or_else(|| self.archive.archive_dir.clone())
            .unwrap_or_else(|| default_archive_dir(&log_dir));

        ArchiveSettings {
            log_dir,
            archive_dir,
            format: overrides.format.unwrap_or(self.archive.format),
            filter: SelectionFilter {
                include_extensions: self.archive.include_extensions.clone(),
                exclude_extensions: self.archive.exclude_extensions.clone(),
                max_age_days: overrides.max_age_days.unwrap_or(self.archive.max_age_days),
            },
            delete_originals: overrides.delete_originals || self.archive.delete_originals,
            dry_run: overrides.dry_run,
        }
    }

    pub fn snapshot_settings(&self, mount_point: Option<PathBuf>, top: Option<usize>) -> SnapshotSettings {
        SnapshotSettings {
            mount_point: mount_point.unwrap_or_else(|| self.snapshot.mount_point.clone()),
            top_processes: top.unwrap_or(self.snapshot.top_processes),
        }
    }
}

/// Configuration manager
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Locate the config file: `$LOGWARD_CONFIG`, else
    /// `<config dir>/logward/config.toml`.
    pub fn new() -> Result<Self> {
        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            return Ok(Self::with_path(path));
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("logward");

        Ok(Self::with_path(config_dir.join("config.toml")))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn config_exists(&self) -> bool {
        self.config_path.exists()
    }

    /// Load the file (defaults when it does not exist) and apply
    /// environment overrides.
    pub fn load(&self) -> Result<LogwardConfig> {
        let mut config = self.load_file()?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load only the file, without environment overrides.
    pub fn load_file(&self) -> Result<LogwardConfig> {
        if !self.config_exists() {
            debug!("No configuration at {}, using defaults", self.config_path.display());
            return Ok(LogwardConfig::default());
        }

        let content = std::fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read configuration file {}", self.config_path.display()))?;
        LogwardConfig::from_toml_str(&content)
            .with_context(|| format!("Invalid configuration file {}", self.config_path.display()))
    }

    /// Write a config file holding the defaults. Refuses to overwrite.
    pub fn create_default_config(&self) -> Result<()> {
        if self.config_exists() {
            return Err(anyhow::anyhow!(
                "Configuration file already exists at {}",
                self.config_path.display()
            ));
        }

        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = LogwardConfig::default().to_toml_string()?;
        std::fs::write(&self.config_path, toml_string).context("Failed to write default configuration")?;
        Ok(())
    }
}
