//! In-memory storage implementation

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::domain::storage::{Storage, StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Thread-safe in-memory storage
///
/// Entities are kept ordered by key, so `list` is deterministic. Data is lost
/// when the process terminates.
#[derive(Debug)]
pub struct InMemoryStorage<E>
where
    E: StorageEntity,
{
    entities: RwLock<BTreeMap<String, E>>,
}

impl<E> Default for InMemoryStorage<E>
where
    E: StorageEntity,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> InMemoryStorage<E>
where
    E: StorageEntity,
{
    /// Creates a new empty in-memory storage
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(BTreeMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, E>>, DomainError> {
        self.entities
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, E>>, DomainError> {
        self.entities
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }
}

#[async_trait]
impl<E> Storage<E> for InMemoryStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        Ok(self.read()?.get(key.as_str()).cloned())
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        Ok(self.read()?.values().cloned().collect())
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let mut entities = self.write()?;

        if entities.contains_key(&key) {
            return Err(DomainError::conflict(format!(
                "Entity with key '{}' already exists",
                key
            )));
        }

        entities.insert(key, entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let mut entities = self.write()?;

        match entities.get_mut(&key) {
            Some(slot) => {
                *slot = entity.clone();
                Ok(entity)
            }
            None => Err(DomainError::not_found(format!(
                "Entity with key '{}' not found",
                key
            ))),
        }
    }

    async fn save(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        self.write()?.insert(key, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.write()?.remove(key.as_str()).is_some())
    }

    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.read()?.contains_key(key.as_str()))
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.read()?.len())
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.write()?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::experiment::{ExperimentId, ExperimentStatus, ExperimentTest, Variant};

    fn experiment(id: &str) -> ExperimentTest {
        ExperimentTest::new(
            ExperimentId::new(id).unwrap(),
            format!("Test {}", id),
            Variant::new("a", "A", "Prompt A").unwrap(),
            Variant::new("b", "B", "Prompt B").unwrap(),
        )
        .unwrap()
    }

    fn key(id: &str) -> ExperimentId {
        ExperimentId::new(id).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let storage: InMemoryStorage<ExperimentTest> = InMemoryStorage::new();

        storage.create(experiment("t1")).await.unwrap();

        let loaded = storage.get(&key("t1")).await.unwrap().unwrap();
        assert_eq!(loaded.name(), "Test t1");
        assert!(storage.get(&key("t2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_conflict() {
        let storage: InMemoryStorage<ExperimentTest> = InMemoryStorage::new();

        storage.create(experiment("t1")).await.unwrap();
        let result = storage.create(experiment("t1")).await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_update() {
        let storage: InMemoryStorage<ExperimentTest> = InMemoryStorage::new();
        let mut test = experiment("t1");
        storage.create(test.clone()).await.unwrap();

        test.start_test().unwrap();
        storage.update(test).await.unwrap();

        let loaded = storage.get(&key("t1")).await.unwrap().unwrap();
        assert_eq!(loaded.status(), ExperimentStatus::Running);
    }

    #[tokio::test]
    async fn test_update_not_found() {
        let storage: InMemoryStorage<ExperimentTest> = InMemoryStorage::new();
        let result = storage.update(experiment("t1")).await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_save_upserts() {
        let storage: InMemoryStorage<ExperimentTest> = InMemoryStorage::new();

        storage.save(experiment("t1")).await.unwrap();
        storage.save(experiment("t1")).await.unwrap();

        assert_eq!(storage.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_key() {
        let storage: InMemoryStorage<ExperimentTest> = InMemoryStorage::new();

        for id in ["t3", "t1", "t2"] {
            storage.create(experiment(id)).await.unwrap();
        }

        let ids: Vec<String> = storage
            .list()
            .await
            .unwrap()
            .iter()
            .map(|t| t.id().to_string())
            .collect();
        assert_eq!(ids, vec!["t1", "t2", "t3"]);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let storage: InMemoryStorage<ExperimentTest> = InMemoryStorage::new();

        storage.create(experiment("t1")).await.unwrap();
        storage.create(experiment("t2")).await.unwrap();

        assert!(storage.delete(&key("t1")).await.unwrap());
        assert!(!storage.delete(&key("t1")).await.unwrap());
        assert!(!storage.exists(&key("t1")).await.unwrap());

        storage.clear().await.unwrap();
        assert_eq!(storage.count().await.unwrap(), 0);
    }
}
