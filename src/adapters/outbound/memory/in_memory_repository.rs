use crate::ports::outbound::Repository;
use crate::scan_orchestration::domain::Entity;
use crate::shared::Result;
use async_trait::async_trait;
use dashmap::DashMap;

/// InMemoryRepository keeps entities in a concurrent map for the lifetime of the process.
///
/// Used when no storage directory is configured, and by tests that need a real
/// repository without touching the filesystem.
pub struct InMemoryRepository<T: Entity> {
    entries: DashMap<String, T>,
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Creates a repository pre-populated with `entities`
    pub fn with_entities(entities: impl IntoIterator<Item = T>) -> Self {
        let repository = Self::new();
        for entity in entities {
            repository.entries.insert(entity.id().to_string(), entity);
        }
        repository
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for InMemoryRepository<T> {
    async fn load(&self, id: &str) -> Result<Option<T>> {
        Ok(self.entries.get(id).map(|entry| entry.clone()))
    }

    async fn load_all(&self) -> Result<Vec<T>> {
        Ok(self.entries.iter().map(|entry| entry.clone()).collect())
    }

    async fn save(&self, entity: &T) -> Result<()> {
        self.entries.insert(entity.id().to_string(), entity.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.entries.remove(id).is_some())
    }
}
