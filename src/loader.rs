//! Sources of schema documents.

use std::collections::BTreeMap;
use std::fs;

use thiserror::Error;

use crate::schema::{DocumentError, Schema, parse_document};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("no document registered as {0}")]
    NotFound(String),
}

/// Loads the schema document identified by `source`.
pub trait SchemaLoader {
    fn load(&self, source: &str) -> Result<Schema, LoadError>;
}

/// Reads documents from the filesystem; the source identity is the path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl SchemaLoader for FsLoader {
    fn load(&self, source: &str) -> Result<Schema, LoadError> {
        let bytes = fs::read(source)?;
        Ok(parse_document(&bytes)?)
    }
}

/// Serves documents held in memory, keyed by source identity.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    documents: BTreeMap<String, Vec<u8>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.documents.insert(source.into(), bytes.into());
    }
}

impl SchemaLoader for MemoryLoader {
    fn load(&self, source: &str) -> Result<Schema, LoadError> {
        let bytes = self
            .documents
            .get(source)
            .ok_or_else(|| LoadError::NotFound(source.to_string()))?;
        Ok(parse_document(bytes)?)
    }
}
