use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::debug;

use super::{DocumentKey, DocumentStore};
use crate::{DatabaseConfig, DatabaseError};

/// Directory (under the data directory) holding per-table documents.
const TABLE_DIR: &str = "data";

/// Documents stored as JSON files under a data directory.
///
/// Layout:
/// - `<data_dir>/<catalog_file>`: the catalog
/// - `<data_dir>/data/<table>.json`: one file per table
///
/// Writes go to a sibling temporary file that is then renamed over the
/// target, so a reader never sees a half-written document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_directory: PathBuf,
    catalog_file: String,
}

impl JsonFileStore {
    /// Creates a store rooted at `data_directory` using the default catalog
    /// file name.
    pub fn new<P: AsRef<Path>>(data_directory: P) -> Self {
        Self {
            data_directory: data_directory.as_ref().to_path_buf(),
            catalog_file: DatabaseConfig::default().catalog_file,
        }
    }

    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            data_directory: config.data_dir.clone(),
            catalog_file: config.catalog_file.clone(),
        }
    }

    /// The file backing `key`.
    pub fn path_for(&self, key: &DocumentKey) -> PathBuf {
        match key {
            DocumentKey::Catalog => self.data_directory.join(&self.catalog_file),
            DocumentKey::Table(name) => self
                .data_directory
                .join(TABLE_DIR)
                .join(format!("{name}.json")),
        }
    }
}

impl DocumentStore for JsonFileStore {
    fn read(&self, key: &DocumentKey) -> Result<Option<String>, DatabaseError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &DocumentKey, contents: &str) -> Result<(), DatabaseError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let staging = path.with_extension("json.tmp");
        fs::write(&staging, contents)?;
        fs::rename(&staging, &path)?;

        debug!(%key, path = %path.display(), bytes = contents.len(), "document saved");
        Ok(())
    }

    fn remove(&mut self, key: &DocumentKey) -> Result<(), DatabaseError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
