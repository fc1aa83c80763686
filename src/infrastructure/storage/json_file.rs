//! JSON file storage implementation
//!
//! Each entity is written as a pretty-printed `<key>.json` file in a single
//! directory. Writes go to a temporary file first and are renamed into place.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::storage::{Storage, StorageEntity, StorageKey};
use crate::domain::DomainError;

const EXTENSION: &str = "json";

/// Storage keeping one JSON document per entity on disk
#[derive(Debug)]
pub struct JsonFileStorage<E>
where
    E: StorageEntity,
{
    directory: PathBuf,
    // Serializes writers so create/update existence checks are not raced
    write_lock: Mutex<()>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> JsonFileStorage<E>
where
    E: StorageEntity,
{
    /// Opens storage in the given directory, creating it if needed
    pub async fn new(directory: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let directory = directory.into();

        fs::create_dir_all(&directory).await.map_err(|e| {
            DomainError::storage(format!(
                "Failed to create storage directory '{}': {}",
                directory.display(),
                e
            ))
        })?;

        Ok(Self {
            directory,
            write_lock: Mutex::new(()),
            _entity: PhantomData,
        })
    }

    /// Directory holding the entity files
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}.{}", key, EXTENSION))
    }

    async fn read_entity(&self, path: &Path) -> Result<Option<E>, DomainError> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DomainError::storage(format!(
                    "Failed to read '{}': {}",
                    path.display(),
                    e
                )));
            }
        };

        serde_json::from_str(&content).map(Some).map_err(|e| {
            DomainError::storage(format!("Failed to parse '{}': {}", path.display(), e))
        })
    }

    async fn write_entity(&self, entity: &E) -> Result<(), DomainError> {
        let path = self.path_for(entity.key().as_str());
        let tmp_path = path.with_extension("json.tmp");

        let content = serde_json::to_string_pretty(entity)
            .map_err(|e| DomainError::storage(format!("Failed to serialize entity: {}", e)))?;

        fs::write(&tmp_path, content).await.map_err(|e| {
            DomainError::storage(format!("Failed to write '{}': {}", tmp_path.display(), e))
        })?;

        fs::rename(&tmp_path, &path).await.map_err(|e| {
            DomainError::storage(format!("Failed to replace '{}': {}", path.display(), e))
        })?;

        debug!(path = %path.display(), "Wrote entity file");
        Ok(())
    }

    async fn entity_paths(&self) -> Result<Vec<PathBuf>, DomainError> {
        let mut entries = fs::read_dir(&self.directory).await.map_err(|e| {
            DomainError::storage(format!(
                "Failed to list '{}': {}",
                self.directory.display(),
                e
            ))
        })?;

        let mut paths = Vec::new();

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to read directory entry: {}", e)))?
        {
            let path = entry.path();

            if path.extension().and_then(|ext| ext.to_str()) == Some(EXTENSION) {
                paths.push(path);
            }
        }

        paths.sort();
        Ok(paths)
    }
}

#[async_trait]
impl<E> Storage<E> for JsonFileStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        self.read_entity(&self.path_for(key.as_str())).await
    }

    /// Lists all readable entities; unreadable files are skipped with a warning
    async fn list(&self) -> Result<Vec<E>, DomainError> {
        let mut entities = Vec::new();

        for path in self.entity_paths().await? {
            match self.read_entity(&path).await {
                Ok(Some(entity)) => entities.push(entity),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable entity file"),
            }
        }

        Ok(entities)
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        let _guard = self.write_lock.lock().await;
        let key = entity.key().as_str().to_string();

        if fs::try_exists(self.path_for(&key)).await.unwrap_or(false) {
            return Err(DomainError::conflict(format!(
                "Entity with key '{}' already exists",
                key
            )));
        }

        self.write_entity(&entity).await?;
        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        let _guard = self.write_lock.lock().await;
        let key = entity.key().as_str().to_string();

        if !fs::try_exists(self.path_for(&key)).await.unwrap_or(false) {
            return Err(DomainError::not_found(format!(
                "Entity with key '{}' not found",
                key
            )));
        }

        self.write_entity(&entity).await?;
        Ok(entity)
    }

    async fn save(&self, entity: E) -> Result<E, DomainError> {
        let _guard = self.write_lock.lock().await;
        self.write_entity(&entity).await?;
        Ok(entity)
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        let _guard = self.write_lock.lock().await;

        match fs::remove_file(self.path_for(key.as_str())).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DomainError::storage(format!(
                "Failed to delete entity '{}': {}",
                key.as_str(),
                e
            ))),
        }
    }

    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(fs::try_exists(self.path_for(key.as_str()))
            .await
            .unwrap_or(false))
    }

    async fn clear(&self) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().await;

        for path in self.entity_paths().await? {
            fs::remove_file(&path).await.map_err(|e| {
                DomainError::storage(format!("Failed to delete '{}': {}", path.display(), e))
            })?;
        }

        Ok(())
    }
}
