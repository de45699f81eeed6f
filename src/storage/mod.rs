//! Durable documents behind the engine.
//!
//! A [`DocumentStore`] holds whole JSON documents under a [`DocumentKey`]:
//! one catalog document and one record document per table. Saving always
//! replaces the full document.

use std::fmt;

use serde::{Serialize, de::DeserializeOwned};

use crate::DatabaseError;

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Identifies one stored document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentKey {
    /// The catalog of table schemas.
    Catalog,

    /// The records of one table.
    Table(String),
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKey::Catalog => write!(f, "catalog"),
            DocumentKey::Table(name) => write!(f, "table:{name}"),
        }
    }
}

/// Load/save of whole documents.
///
/// Implementors only move raw text; encoding lives in the provided
/// [`load`](DocumentStore::load) and [`save`](DocumentStore::save).
pub trait DocumentStore {
    /// Reads a document, `None` if it has never been written.
    fn read(&self, key: &DocumentKey) -> Result<Option<String>, DatabaseError>;

    /// Replaces a document.
    fn write(&mut self, key: &DocumentKey, contents: &str) -> Result<(), DatabaseError>;

    /// Deletes a document. Deleting a missing document succeeds.
    fn remove(&mut self, key: &DocumentKey) -> Result<(), DatabaseError>;

    /// Decodes a document, or returns `T::default()` when it is absent.
    fn load<T>(&self, key: &DocumentKey) -> Result<T, DatabaseError>
    where
        Self: Sized,
        T: DeserializeOwned + Default,
    {
        match self.read(key)? {
            Some(contents) => {
                serde_json::from_str(&contents).map_err(|e| DatabaseError::StorageCorrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            }
            None => Ok(T::default()),
        }
    }

    /// Encodes and writes a document.
    fn save<T>(&mut self, key: &DocumentKey, document: &T) -> Result<(), DatabaseError>
    where
        Self: Sized,
        T: Serialize,
    {
        let contents =
            serde_json::to_string_pretty(document).map_err(|e| DatabaseError::StorageCorrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        self.write(key, &contents)
    }
}
