//! Handler registry keyed by message type.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::marker::PhantomData;
use std::sync::Arc;

use store::{EntityStore, PersistedEntity};

use crate::error::DispatchError;
use crate::handler::{
    CreateHandler, DeleteHandler, ManyQueryHandler, OneQueryHandler, UpdateHandler,
};
use crate::message::{
    CreateCommand, DeleteCommand, DomainMessage, ManyQuery, OneQuery, UpdateCommand,
};

/// Which handler trait a registration satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Create,
    Update,
    Delete,
    QueryOne,
    QueryMany,
}

struct Registration {
    message_type: &'static str,
    capability: Capability,
    /// Holds an `Arc<dyn ...Handler<.., Command/Query = M>>` for the keyed message type `M`.
    handler: Box<dyn Any + Send + Sync>,
}

/// Maps each message type to exactly one handler.
///
/// Keys are the `TypeId` of the concrete message type, fixed at registration
/// time. A message type can be bound once, whatever the handler capability.
pub struct HandlerRegistry<S, T> {
    handlers: HashMap<TypeId, Registration>,
    _phantom: PhantomData<fn() -> (S, T)>,
}

impl<S, T> HandlerRegistry<S, T>
where
    S: EntityStore<T>,
    T: PersistedEntity,
{
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            _phantom: PhantomData,
        }
    }

    pub fn register_create<H>(&mut self, handler: H) -> Result<(), DispatchError>
    where
        H: CreateHandler<T> + 'static,
    {
        let handler: Arc<dyn CreateHandler<T, Command = H::Command>> = Arc::new(handler);
        self.insert::<H::Command>(Capability::Create, Box::new(handler))
    }

    pub fn register_update<H>(&mut self, handler: H) -> Result<(), DispatchError>
    where
        H: UpdateHandler<T> + 'static,
    {
        let handler: Arc<dyn UpdateHandler<T, Command = H::Command>> = Arc::new(handler);
        self.insert::<H::Command>(Capability::Update, Box::new(handler))
    }

    pub fn register_delete<H>(&mut self, handler: H) -> Result<(), DispatchError>
    where
        H: DeleteHandler<T> + 'static,
    {
        let handler: Arc<dyn DeleteHandler<T, Command = H::Command>> = Arc::new(handler);
        self.insert::<H::Command>(Capability::Delete, Box::new(handler))
    }

    pub fn register_one<H>(&mut self, handler: H) -> Result<(), DispatchError>
    where
        H: OneQueryHandler<S, T> + 'static,
    {
        let handler: Arc<dyn OneQueryHandler<S, T, Query = H::Query>> = Arc::new(handler);
        self.insert::<H::Query>(Capability::QueryOne, Box::new(handler))
    }

    pub fn register_many<H>(&mut self, handler: H) -> Result<(), DispatchError>
    where
        H: ManyQueryHandler<S, T> + 'static,
    {
        let handler: Arc<dyn ManyQueryHandler<S, T, Query = H::Query>> = Arc::new(handler);
        self.insert::<H::Query>(Capability::QueryMany, Box::new(handler))
    }

    pub fn resolve_create<C: CreateCommand>(
        &self,
    ) -> Result<Arc<dyn CreateHandler<T, Command = C>>, DispatchError> {
        self.resolve::<C, _>()
    }

    pub fn resolve_update<C: UpdateCommand>(
        &self,
    ) -> Result<Arc<dyn UpdateHandler<T, Command = C>>, DispatchError> {
        self.resolve::<C, _>()
    }

    pub fn resolve_delete<C: DeleteCommand>(
        &self,
    ) -> Result<Arc<dyn DeleteHandler<T, Command = C>>, DispatchError> {
        self.resolve::<C, _>()
    }

    pub fn resolve_one<Q: OneQuery>(
        &self,
    ) -> Result<Arc<dyn OneQueryHandler<S, T, Query = Q>>, DispatchError> {
        self.resolve::<Q, _>()
    }

    pub fn resolve_many<Q: ManyQuery>(
        &self,
    ) -> Result<Arc<dyn ManyQueryHandler<S, T, Query = Q>>, DispatchError> {
        self.resolve::<Q, _>()
    }

    /// Returns the capability bound to message type `M`, if any.
    pub fn capability_of<M: DomainMessage>(&self) -> Option<Capability> {
        self.handlers
            .get(&TypeId::of::<M>())
            .map(|registration| registration.capability)
    }

    pub fn contains<M: DomainMessage>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<M>())
    }

    /// Returns the number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn insert<M: DomainMessage>(
        &mut self,
        capability: Capability,
        handler: Box<dyn Any + Send + Sync>,
    ) -> Result<(), DispatchError> {
        match self.handlers.entry(TypeId::of::<M>()) {
            Entry::Occupied(_) => Err(DispatchError::DuplicateHandler {
                message_type: type_name::<M>(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Registration {
                    message_type: type_name::<M>(),
                    capability,
                    handler,
                });
                Ok(())
            }
        }
    }

    fn resolve<M: DomainMessage, H: Clone + 'static>(&self) -> Result<H, DispatchError> {
        // A type bound under a different capability has no handler of the requested shape.
        self.handlers
            .get(&TypeId::of::<M>())
            .and_then(|registration| registration.handler.downcast_ref::<H>())
            .cloned()
            .ok_or(DispatchError::NoHandler {
                message_type: type_name::<M>(),
            })
    }
}

impl<S, T> Default for HandlerRegistry<S, T>
where
    S: EntityStore<T>,
    T: PersistedEntity,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, T> std::fmt::Debug for HandlerRegistry<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut entries: Vec<_> = self
            .handlers
            .values()
            .map(|registration| (registration.message_type, registration.capability))
            .collect();
        entries.sort_by_key(|(message_type, _)| *message_type);
        f.debug_map().entries(entries).finish()
    }
}
