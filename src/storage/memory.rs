use std::collections::HashMap;

use super::{DocumentKey, DocumentStore};
use crate::DatabaseError;

/// Documents kept in a map. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: HashMap<DocumentKey, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self, key: &DocumentKey) -> Result<Option<String>, DatabaseError> {
        Ok(self.documents.get(key).cloned())
    }

    fn write(&mut self, key: &DocumentKey, contents: &str) -> Result<(), DatabaseError> {
        self.documents.insert(key.clone(), contents.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &DocumentKey) -> Result<(), DatabaseError> {
        self.documents.remove(key);
        Ok(())
    }
}
