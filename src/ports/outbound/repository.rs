use crate::scan_orchestration::domain::Entity;
use crate::shared::Result;
use async_trait::async_trait;

/// Repository port for persisting aggregates keyed by id
///
/// Durability is the adapter's concern; the core only relies on
/// get/list/put/delete semantics.
///
/// # Async Support
/// Implementations must be `Send + Sync` so one repository can be shared
/// between the scheduler loop and concurrently running scans.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Loads one entity, `None` when the id is unknown
    async fn load(&self, id: &str) -> Result<Option<T>>;

    /// Loads every stored entity, in no particular order
    async fn load_all(&self) -> Result<Vec<T>>;

    /// Inserts or replaces the entity under its id
    async fn save(&self, entity: &T) -> Result<()>;

    /// Removes the entity; returns whether it existed
    async fn delete(&self, id: &str) -> Result<bool>;
}
