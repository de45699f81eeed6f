//! Database configuration.
//!
//! Settings are read from a TOML file; every field has a default so an empty
//! file (or no file at all) yields a working configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{DatabaseError, core::types::BooleanMode};

/// Runtime settings for a [`Database`](crate::Database) and the shell around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Directory holding the catalog and the per-table documents.
    pub data_dir: PathBuf,

    /// File name of the catalog document inside `data_dir`.
    pub catalog_file: String,

    /// Whether SELECT results are memoized between mutations.
    pub cache_enabled: bool,

    /// Reject boolean literals outside the known true/false spellings.
    pub strict_booleans: bool,

    /// Ask before running `drop_table` and `delete`.
    pub confirm_destructive: bool,

    /// Report how long each command took.
    pub timing: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./db"),
            catalog_file: String::from("db_meta.json"),
            cache_enabled: true,
            strict_booleans: false,
            confirm_destructive: true,
            timing: true,
        }
    }
}

impl DatabaseConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, DatabaseError> {
        let content = std::fs::read_to_string(path).map_err(|e| DatabaseError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_toml(&content).map_err(|reason| DatabaseError::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Loads `path` when given, otherwise falls back to the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, DatabaseError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Sets the data directory.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// How boolean literals are admitted.
    pub fn boolean_mode(&self) -> BooleanMode {
        if self.strict_booleans {
            BooleanMode::Strict
        } else {
            BooleanMode::Permissive
        }
    }
}
