//! Bounded context: the dispatcher binding one entity type to its handlers.

use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use common::{EntityId, MessageId};
use store::{ConnectionRouter, EntityStore, PersistedEntity, Version};

use crate::error::DispatchError;
use crate::handler::{
    CreateHandler, DeleteHandler, ManyQueryHandler, OneQueryHandler, UpdateHandler,
};
use crate::message::{CreateCommand, DeleteCommand, ManyQuery, OneQuery, UpdateCommand};
use crate::notification::{
    DomainNotification, NoopProducer, NotificationKind, NotificationProducer,
};
use crate::registry::HandlerRegistry;

/// Dispatches commands and queries for entity type `T` stored in `S`.
///
/// Mutations run against the router's read-write store and queries against
/// its read-only store. The registry is frozen once the context is built, so
/// concurrent dispatch needs no synchronization. The context holds no entity
/// state between calls.
pub struct BoundedContext<S, T>
where
    S: EntityStore<T>,
    T: PersistedEntity,
{
    router: ConnectionRouter<S>,
    producer: Arc<dyn NotificationProducer>,
    registry: HandlerRegistry<S, T>,
}

impl<S, T> BoundedContext<S, T>
where
    S: EntityStore<T>,
    T: PersistedEntity,
{
    /// Starts building a context over the given router.
    pub fn builder(router: ConnectionRouter<S>) -> BoundedContextBuilder<S, T> {
        BoundedContextBuilder::new(router)
    }

    pub fn router(&self) -> &ConnectionRouter<S> {
        &self.router
    }

    /// Read access to the frozen handler registry.
    pub fn registry(&self) -> &HandlerRegistry<S, T> {
        &self.registry
    }

    /// Creates and persists a new entity.
    ///
    /// A uniqueness violation surfaces as `PersistenceConflict` and is not retried.
    #[tracing::instrument(
        skip(self, command),
        fields(entity_type = T::ENTITY_TYPE, message_id = %command.message_id())
    )]
    pub async fn create<C: CreateCommand>(&self, command: C) -> Result<T, DispatchError> {
        metrics::counter!("cqrs_commands_total", "kind" => "create").increment(1);
        let handler = self.registry.resolve_create::<C>()?;

        // Relational timestamps keep microseconds
        let shell = T::shell(EntityId::new(), Utc::now().trunc_subsecs(6));
        let mut entity = handler.populate(&command, shell);
        entity.set_version(Version::initial());

        if let Err(e) = self.router.read_write().insert(&entity).await {
            if e.is_unique_violation() {
                tracing::warn!(error = %e, "create rejected by store");
            }
            return Err(e.into());
        }

        tracing::debug!(entity_id = %entity.id(), "entity created");
        self.notify(command.message_id(), entity.id(), NotificationKind::Created)
            .await;

        Ok(entity)
    }

    /// Applies an update to one entity under optimistic locking.
    ///
    /// Every successful update writes and moves the version forward by one,
    /// even when the command leaves every field as it is; such an update is
    /// still announced as `Updated`.
    ///
    /// Returns `Ok(None)` if the entity doesn't exist. If the entity changed
    /// or vanished between the read and the version-conditioned write, fails
    /// with `ConcurrentModification`.
    #[tracing::instrument(
        skip(self, command),
        fields(
            entity_type = T::ENTITY_TYPE,
            message_id = %command.message_id(),
            entity_id = %command.target_id()
        )
    )]
    pub async fn update_one<C: UpdateCommand>(
        &self,
        command: C,
    ) -> Result<Option<T>, DispatchError> {
        metrics::counter!("cqrs_commands_total", "kind" => "update").increment(1);
        let handler = self.registry.resolve_update::<C>()?;
        let store = self.router.read_write();
        let entity_id = command.target_id();

        let Some(current) = store.fetch(entity_id).await? else {
            tracing::debug!("update target not found");
            return Ok(None);
        };

        let observed = current.version();
        if let Some(expected) = command.expected_version()
            && expected != observed
        {
            return Err(self.conflict(entity_id, expected));
        }

        let mut merged = handler.merge(&command, current);
        merged.set_version(observed);

        let affected = store.update_versioned(&merged, observed).await?;
        if affected == 0 {
            return Err(self.conflict(entity_id, observed));
        }

        merged.set_version(observed.next());
        tracing::debug!(version = %merged.version(), "entity updated");
        self.notify(command.message_id(), entity_id, NotificationKind::Updated)
            .await;

        Ok(Some(merged))
    }

    /// Deletes one entity. Deleting a missing entity succeeds.
    #[tracing::instrument(
        skip(self, command),
        fields(entity_type = T::ENTITY_TYPE, message_id = %command.message_id())
    )]
    pub async fn delete_one<C: DeleteCommand>(&self, command: C) -> Result<(), DispatchError> {
        metrics::counter!("cqrs_commands_total", "kind" => "delete").increment(1);
        let handler = self.registry.resolve_delete::<C>()?;
        let entity_id = handler.target(&command);

        let removed = self.router.read_write().delete(entity_id).await?;
        if removed == 0 {
            tracing::debug!(%entity_id, "delete target already absent");
            return Ok(());
        }

        tracing::debug!(%entity_id, "entity deleted");
        self.notify(command.message_id(), entity_id, NotificationKind::Deleted)
            .await;

        Ok(())
    }

    /// Runs a single-entity query against the read-only store.
    #[tracing::instrument(
        skip(self, query),
        fields(entity_type = T::ENTITY_TYPE, message_id = %query.message_id())
    )]
    pub async fn query_one<Q: OneQuery>(&self, query: Q) -> Result<Option<T>, DispatchError> {
        metrics::counter!("cqrs_queries_total", "kind" => "one").increment(1);
        let handler = self.registry.resolve_one::<Q>()?;
        handler.run(&query, self.router.read_only()).await
    }

    /// Runs a multi-entity query against the read-only store.
    #[tracing::instrument(
        skip(self, query),
        fields(entity_type = T::ENTITY_TYPE, message_id = %query.message_id())
    )]
    pub async fn query_many<Q: ManyQuery>(&self, query: Q) -> Result<Vec<T>, DispatchError> {
        metrics::counter!("cqrs_queries_total", "kind" => "many").increment(1);
        let handler = self.registry.resolve_many::<Q>()?;
        handler.run(&query, self.router.read_only()).await
    }

    fn conflict(&self, entity_id: EntityId, expected: Version) -> DispatchError {
        metrics::counter!("cqrs_conflicts_total").increment(1);
        tracing::warn!(%entity_id, %expected, "concurrent modification detected");
        DispatchError::ConcurrentModification {
            entity_type: T::ENTITY_TYPE,
            entity_id,
            expected,
        }
    }

    async fn notify(&self, message_id: MessageId, entity_id: EntityId, kind: NotificationKind) {
        let notification = DomainNotification::new(message_id, entity_id, T::ENTITY_TYPE, kind);

        // The write is already committed; a failed publish is only reported.
        if let Err(e) = self.producer.publish(notification).await {
            metrics::counter!("cqrs_notification_failures_total").increment(1);
            tracing::warn!(error = %e, %entity_id, %kind, "failed to publish domain notification");
        }
    }
}

impl<S, T> std::fmt::Debug for BoundedContext<S, T>
where
    S: EntityStore<T>,
    T: PersistedEntity,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedContext")
            .field("entity_type", &T::ENTITY_TYPE)
            .field("has_replica", &self.router.has_replica())
            .field("registry", &self.registry)
            .finish()
    }
}

/// Collects handlers for a [`BoundedContext`].
///
/// Every registration fails fast with `DuplicateHandler` if its message type
/// is already bound.
pub struct BoundedContextBuilder<S, T>
where
    S: EntityStore<T>,
    T: PersistedEntity,
{
    router: ConnectionRouter<S>,
    producer: Arc<dyn NotificationProducer>,
    registry: HandlerRegistry<S, T>,
}

impl<S, T> BoundedContextBuilder<S, T>
where
    S: EntityStore<T>,
    T: PersistedEntity,
{
    /// Creates a builder with a no-op notification producer.
    pub fn new(router: ConnectionRouter<S>) -> Self {
        Self {
            router,
            producer: Arc::new(NoopProducer),
            registry: HandlerRegistry::new(),
        }
    }

    /// Sets the notification producer.
    pub fn producer(mut self, producer: Arc<dyn NotificationProducer>) -> Self {
        self.producer = producer;
        self
    }

    pub fn create<H>(mut self, handler: H) -> Result<Self, DispatchError>
    where
        H: CreateHandler<T> + 'static,
    {
        self.registry.register_create(handler)?;
        Ok(self)
    }

    pub fn update<H>(mut self, handler: H) -> Result<Self, DispatchError>
    where
        H: UpdateHandler<T> + 'static,
    {
        self.registry.register_update(handler)?;
        Ok(self)
    }

    pub fn delete<H>(mut self, handler: H) -> Result<Self, DispatchError>
    where
        H: DeleteHandler<T> + 'static,
    {
        self.registry.register_delete(handler)?;
        Ok(self)
    }

    pub fn query_one<H>(mut self, handler: H) -> Result<Self, DispatchError>
    where
        H: OneQueryHandler<S, T> + 'static,
    {
        self.registry.register_one(handler)?;
        Ok(self)
    }

    pub fn query_many<H>(mut self, handler: H) -> Result<Self, DispatchError>
    where
        H: ManyQueryHandler<S, T> + 'static,
    {
        self.registry.register_many(handler)?;
        Ok(self)
    }

    /// Freezes the registry and returns the context.
    pub fn build(self) -> BoundedContext<S, T> {
        tracing::debug!(
            entity_type = T::ENTITY_TYPE,
            handlers = self.registry.len(),
            has_replica = self.router.has_replica(),
            "bounded context built"
        );
        BoundedContext {
            router: self.router,
            producer: self.producer,
            registry: self.registry,
        }
    }
}
