//! Handler capabilities, one per message kind.
//!
//! Each handler binds exactly one concrete message type through its
//! associated type. Command handlers are pure mappings; the bounded context
//! does all store access for them. Query handlers run their own reads against
//! the read-only store they are given.

use async_trait::async_trait;
use common::EntityId;
use store::{EntityStore, PersistedEntity};

use crate::error::DispatchError;
use crate::message::{CreateCommand, DeleteCommand, ManyQuery, OneQuery, UpdateCommand};

/// Maps a create command onto a blank entity.
pub trait CreateHandler<T: PersistedEntity>: Send + Sync {
    type Command: CreateCommand;

    /// Fills the fields of `shell` from the command.
    ///
    /// `shell` already carries a fresh id, `created_at`, and the initial version.
    fn populate(&self, command: &Self::Command, shell: T) -> T;
}

/// Merges an update command into the current state of an entity.
pub trait UpdateHandler<T: PersistedEntity>: Send + Sync {
    type Command: UpdateCommand;

    /// Overwrites only the fields present in the command.
    ///
    /// Must leave `id`, `version` and `created_at` as they are.
    fn merge(&self, command: &Self::Command, current: T) -> T;
}

/// Resolves which entity a delete command removes.
pub trait DeleteHandler<T: PersistedEntity>: Send + Sync {
    type Command: DeleteCommand;

    fn target(&self, command: &Self::Command) -> EntityId {
        command.target_id()
    }
}

/// Reads zero or one entity.
#[async_trait]
pub trait OneQueryHandler<S, T>: Send + Sync
where
    S: EntityStore<T>,
    T: PersistedEntity,
{
    type Query: OneQuery;

    async fn run(&self, query: &Self::Query, store: &S) -> Result<Option<T>, DispatchError>;
}

/// Reads zero or more entities.
#[async_trait]
pub trait ManyQueryHandler<S, T>: Send + Sync
where
    S: EntityStore<T>,
    T: PersistedEntity,
{
    type Query: ManyQuery;

    async fn run(&self, query: &Self::Query, store: &S) -> Result<Vec<T>, DispatchError>;
}
