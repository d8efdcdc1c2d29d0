//! HidroPal configuration
//!
//! TOML-backed settings for storage, data entry and logging. Every section
//! and field has a default, so an empty file is a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};

use hidropal_store::{
    DatasetStore, FileBackend, InMemoryContentApi, RemoteBackend, StorageBackend, TokenPolicy,
    DEFAULT_PRIMARY_NAME, DEFAULT_TRASH_NAME,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Fixed instrument offset subtracted from every entered level (meters)
pub const DEFAULT_LEVEL_OFFSET: f64 = 0.17;

/// Depth the level is measured from, for depth-style series (meters)
pub const DEFAULT_REFERENCE_DEPTH: f64 = 6.5;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HidropalConfig {
    pub storage: StorageConfig,
    pub entry: EntryConfig,
    pub logging: LoggingConfig,
}

impl HidropalConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate TOML text
    ///
    /// # Errors
    /// Returns error if the text is not valid TOML or a value is out of range
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is invalid
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// With storage section
    #[inline]
    #[must_use]
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    /// With entry section
    #[inline]
    #[must_use]
    pub fn with_entry(mut self, entry: EntryConfig) -> Self {
        self.entry = entry;
        self
    }

    /// With logging section
    #[inline]
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns the first out-of-range value found
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.storage.validate()?;
        self.entry.validate()
    }
}

/// Which storage backend to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Plain files under `data_dir`
    #[default]
    File,
    /// Optimistic-concurrency backend over a process-local content API
    MemoryRemote,
}

/// Storage section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: BackendKind,
    pub data_dir: PathBuf,
    pub primary_name: String,
    pub trash_name: String,
    /// Version source for remote writes
    pub token_policy: TokenPolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::File,
            data_dir: PathBuf::from("."),
            primary_name: DEFAULT_PRIMARY_NAME.to_string(),
            trash_name: DEFAULT_TRASH_NAME.to_string(),
            token_policy: TokenPolicy::default(),
        }
    }
}

impl StorageConfig {
    /// File storage under a directory
    #[inline]
    #[must_use]
    pub fn file(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Process-local remote storage
    #[inline]
    #[must_use]
    pub fn memory_remote() -> Self {
        Self {
            backend: BackendKind::MemoryRemote,
            ..Self::default()
        }
    }

    /// With object names
    #[inline]
    #[must_use]
    pub fn with_names(mut self, primary: impl Into<String>, trash: impl Into<String>) -> Self {
        self.primary_name = primary.into();
        self.trash_name = trash.into();
        self
    }

    /// With token policy
    #[inline]
    #[must_use]
    pub fn with_token_policy(mut self, policy: TokenPolicy) -> Self {
        self.token_policy = policy;
        self
    }

    /// Build the configured backend
    ///
    /// The only place the backend kind is branched on.
    #[must_use]
    pub fn build_backend(&self) -> Box<dyn StorageBackend> {
        match self.backend {
            BackendKind::File => Box::new(FileBackend::new(&self.data_dir)),
            BackendKind::MemoryRemote => Box::new(RemoteBackend::with_policy(
                InMemoryContentApi::new(),
                self.token_policy,
            )),
        }
    }

    /// Build a dataset store over the configured backend
    #[must_use]
    pub fn build_store(&self) -> DatasetStore {
        DatasetStore::new(self.build_backend(), &self.primary_name, &self.trash_name)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.primary_name.trim().is_empty() || self.trash_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "storage object names cannot be empty".to_string(),
            ));
        }
        if self.primary_name == self.trash_name {
            return Err(ConfigError::Invalid(format!(
                "primary and trash cannot share the object name '{}'",
                self.primary_name
            )));
        }
        Ok(())
    }
}

/// Data entry and derived-series section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryConfig {
    /// Subtracted from every entered or edited level
    pub level_offset: f64,
    /// Depth reference for the depth series
    pub reference_depth: f64,
    /// Rows returned by `recent` when no limit is given
    pub recent_limit: usize,
    /// Trailing window of the rolling rainfall series
    pub rolling_window_days: usize,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            level_offset: DEFAULT_LEVEL_OFFSET,
            reference_depth: DEFAULT_REFERENCE_DEPTH,
            recent_limit: 10,
            rolling_window_days: 7,
        }
    }
}

impl EntryConfig {
    /// With level offset
    #[inline]
    #[must_use]
    pub fn with_level_offset(mut self, offset: f64) -> Self {
        self.level_offset = offset;
        self
    }

    /// With rolling window
    #[inline]
    #[must_use]
    pub fn with_rolling_window(mut self, days: usize) -> Self {
        self.rolling_window_days = days;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.level_offset.is_finite() || self.level_offset < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "level_offset must be a non-negative number (got {})",
                self.level_offset
            )));
        }
        if !self.reference_depth.is_finite() {
            return Err(ConfigError::Invalid("reference_depth must be finite".to_string()));
        }
        if self.recent_limit == 0 {
            return Err(ConfigError::Invalid("recent_limit must be at least 1".to_string()));
        }
        if self.rolling_window_days == 0 {
            return Err(ConfigError::Invalid(
                "rolling_window_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}
