//! Storage factory for runtime backend selection

use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::storage::{Storage, StorageEntity};
use crate::domain::DomainError;

use super::in_memory::InMemoryStorage;
use super::json_file::JsonFileStorage;

/// Supported storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// Process-local storage, lost on exit
    InMemory,
    /// One JSON file per entity
    JsonFile,
}

impl StorageType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "json" | "file" | "json-file" | "json_file" => Some(Self::JsonFile),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    InMemory,
    /// JSON files under the given root; each entity kind gets a subdirectory
    JsonFile { root: PathBuf },
}

impl StorageConfig {
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    pub fn json_file(root: impl Into<PathBuf>) -> Self {
        Self::JsonFile { root: root.into() }
    }

    /// Builds a configuration from a backend name and a root path
    pub fn from_backend(backend: &str, root: impl Into<PathBuf>) -> Result<Self, DomainError> {
        match StorageType::parse(backend) {
            Some(StorageType::InMemory) => Ok(Self::InMemory),
            Some(StorageType::JsonFile) => Ok(Self::json_file(root)),
            None => Err(DomainError::configuration(format!(
                "Unknown storage backend '{}', expected 'memory' or 'json'",
                backend
            ))),
        }
    }

    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::JsonFile { .. } => StorageType::JsonFile,
        }
    }
}

/// Factory for creating storage instances
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates a storage instance based on the configuration
    ///
    /// `collection` names the subdirectory used by file-backed storage.
    pub async fn create<E>(
        config: &StorageConfig,
        collection: &str,
    ) -> Result<Arc<dyn Storage<E>>, DomainError>
    where
        E: StorageEntity + 'static,
    {
        match config {
            StorageConfig::InMemory => Ok(Arc::new(InMemoryStorage::<E>::new())),
            StorageConfig::JsonFile { root } => {
                let storage = JsonFileStorage::<E>::new(root.join(collection)).await?;
                Ok(Arc::new(storage))
            }
        }
    }
}
