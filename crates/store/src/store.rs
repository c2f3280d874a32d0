use async_trait::async_trait;

use crate::{EntityId, PersistedEntity, Result, Version};

/// Relational primitives a bounded context needs from its backing store.
///
/// A store value is a connection handle: cloning it shares the same
/// underlying pool. Every method is a single unit of work and holds nothing
/// across calls. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EntityStore<T: PersistedEntity>: Clone + Send + Sync + 'static {
    /// Inserts a new entity.
    ///
    /// Fails with `UniqueViolation` if a unique constraint rejects the row.
    async fn insert(&self, entity: &T) -> Result<()>;

    /// Fetches an entity by identifier.
    ///
    /// Returns None if no row matches.
    async fn fetch(&self, id: EntityId) -> Result<Option<T>>;

    /// Fetches every entity, ordered by creation time then identifier.
    async fn fetch_all(&self) -> Result<Vec<T>>;

    /// Writes all fields of `entity` and moves its version to `observed.next()`,
    /// but only if the stored row still has version `observed`.
    ///
    /// The compare and the write happen atomically in one step. Returns the
    /// number of rows affected: 0 means the row was modified or deleted since
    /// `observed` was read.
    async fn update_versioned(&self, entity: &T, observed: Version) -> Result<u64>;

    /// Deletes the entity with the given identifier, returning rows affected.
    async fn delete(&self, id: EntityId) -> Result<u64>;

    /// Counts stored entities.
    async fn count(&self) -> Result<u64>;
}

/// Extension trait providing convenience methods for entity stores.
#[async_trait]
pub trait EntityStoreExt<T: PersistedEntity>: EntityStore<T> {
    /// Checks if an entity exists.
    async fn exists(&self, id: EntityId) -> Result<bool> {
        Ok(self.fetch(id).await?.is_some())
    }

    /// Gets the current version of an entity, or None if it doesn't exist.
    async fn current_version(&self, id: EntityId) -> Result<Option<Version>> {
        Ok(self.fetch(id).await?.map(|entity| entity.version()))
    }
}

// Blanket implementation for all EntityStore implementations
impl<T: PersistedEntity, S: EntityStore<T> + ?Sized> EntityStoreExt<T> for S {}
