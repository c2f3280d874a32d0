//! User queries and their handlers.

use async_trait::async_trait;
use common::EntityId;
use store::EntityStore;

use crate::error::DispatchError;
use crate::handler::{ManyQueryHandler, OneQueryHandler};
use crate::message::{DomainMessage, DomainQuery, ManyQuery, MessageMeta, OneQuery};

use super::User;

/// Query for one user by ID.
#[derive(Debug, Clone)]
pub struct GetUser {
    meta: MessageMeta,
    pub id: EntityId,
}

impl GetUser {
    pub fn new(id: EntityId) -> Self {
        Self {
            meta: MessageMeta::new(),
            id,
        }
    }
}

impl DomainMessage for GetUser {
    fn meta(&self) -> &MessageMeta {
        &self.meta
    }
}

impl DomainQuery for GetUser {}
impl OneQuery for GetUser {}

/// Query for every user, oldest first.
#[derive(Debug, Clone, Default)]
pub struct GetAllUsers {
    meta: MessageMeta,
}

impl GetAllUsers {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainMessage for GetAllUsers {
    fn meta(&self) -> &MessageMeta {
        &self.meta
    }
}

impl DomainQuery for GetAllUsers {}
impl ManyQuery for GetAllUsers {}

#[derive(Debug, Clone, Copy, Default)]
pub struct GetUserHandler;

#[async_trait]
impl<S: EntityStore<User>> OneQueryHandler<S, User> for GetUserHandler {
    type Query = GetUser;

    async fn run(&self, query: &GetUser, store: &S) -> Result<Option<User>, DispatchError> {
        Ok(store.fetch(query.id).await?)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GetAllUsersHandler;

#[async_trait]
impl<S: EntityStore<User>> ManyQueryHandler<S, User> for GetAllUsersHandler {
    type Query = GetAllUsers;

    async fn run(&self, _query: &GetAllUsers, store: &S) -> Result<Vec<User>, DispatchError> {
        Ok(store.fetch_all().await?)
    }
}
