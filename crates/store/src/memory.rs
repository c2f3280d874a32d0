use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{EntityId, EntityStore, PersistedEntity, Result, StoreError, Version};

type KeyFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// In-memory entity store implementation for testing.
///
/// Clones share the same rows, so a clone can stand in for a read-only
/// handle onto the same database. Named unique constraints emulate the
/// relational ones so conflicts surface the same way as in PostgreSQL.
pub struct InMemoryStore<T: PersistedEntity> {
    rows: Arc<RwLock<HashMap<EntityId, T>>>,
    unique: Arc<Vec<(String, KeyFn<T>)>>,
    /// Table name used for the primary key constraint, `{table}_pkey`.
    table: Arc<str>,
}

impl<T: PersistedEntity> Clone for InMemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            unique: Arc::clone(&self.unique),
            table: Arc::clone(&self.table),
        }
    }
}

impl<T: PersistedEntity> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
            unique: Arc::new(Vec::new()),
            table: Arc::from(T::ENTITY_TYPE),
        }
    }
}

impl<T: PersistedEntity> InMemoryStore<T> {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names the emulated table, so a duplicate id reports `{table}_pkey`
    /// as PostgreSQL does. Defaults to the entity type name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Arc::from(table.into());
        self
    }

    /// Adds a named unique constraint over the key produced by `key`.
    ///
    /// Must be called before the store is cloned.
    pub fn with_unique_constraint(
        mut self,
        name: impl Into<String>,
        key: impl Fn(&T) -> String + Send + Sync + 'static,
    ) -> Self {
        let mut unique: Vec<_> = self.unique.iter().cloned().collect();
        unique.push((name.into(), Arc::new(key)));
        self.unique = Arc::new(unique);
        self
    }

    /// Clears all rows.
    pub async fn clear(&self) {
        self.rows.write().await.clear();
    }

    fn check_unique(&self, rows: &HashMap<EntityId, T>, candidate: &T) -> Result<()> {
        for (name, key) in self.unique.iter() {
            let wanted = key(candidate);
            let taken = rows
                .values()
                .any(|row| row.id() != candidate.id() && key(row) == wanted);
            if taken {
                return Err(StoreError::UniqueViolation {
                    constraint: name.clone(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<T: PersistedEntity> EntityStore<T> for InMemoryStore<T> {
    async fn insert(&self, entity: &T) -> Result<()> {
        let mut rows = self.rows.write().await;

        if rows.contains_key(&entity.id()) {
            return Err(StoreError::UniqueViolation {
                constraint: format!("{}_pkey", self.table),
            });
        }
        self.check_unique(&rows, entity)?;

        rows.insert(entity.id(), entity.clone());
        Ok(())
    }

    async fn fetch(&self, id: EntityId) -> Result<Option<T>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn fetch_all(&self) -> Result<Vec<T>> {
        let rows = self.rows.read().await;
        let mut all: Vec<_> = rows.values().cloned().collect();
        all.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then(a.id().cmp(&b.id()))
        });
        Ok(all)
    }

    async fn update_versioned(&self, entity: &T, observed: Version) -> Result<u64> {
        // Compare and write under one write lock
        let mut rows = self.rows.write().await;

        let matches = rows
            .get(&entity.id())
            .is_some_and(|current| current.version() == observed);
        if !matches {
            return Ok(0);
        }
        self.check_unique(&rows, entity)?;

        let mut updated = entity.clone();
        updated.set_version(observed.next());
        rows.insert(updated.id(), updated);
        Ok(1)
    }

    async fn delete(&self, id: EntityId) -> Result<u64> {
        Ok(u64::from(self.rows.write().await.remove(&id).is_some()))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.rows.read().await.len() as u64)
    }
}
