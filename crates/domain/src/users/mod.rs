//! Users bounded context.
//!
//! The reference wiring of the engine: one entity type, three commands
//! and two queries, each bound to its own handler.

mod commands;
mod entity;
mod queries;

use std::sync::Arc;

use store::{ConnectionRouter, EntityStore, InMemoryStore, PgEntity};

use crate::context::BoundedContext;
use crate::error::DispatchError;
use crate::notification::NotificationProducer;

pub use commands::{
    CreateUser, CreateUserHandler, DeleteUser, DeleteUserHandler, UpdateUser, UpdateUserHandler,
};
pub use entity::{User, UserView};
pub use queries::{GetAllUsers, GetAllUsersHandler, GetUser, GetUserHandler};

/// Bounded context managing [`User`] entities.
pub type UsersContext<S> = BoundedContext<S, User>;

/// Builds the users bounded context over the given stores.
pub fn bounded_context<S: EntityStore<User>>(
    router: ConnectionRouter<S>,
    producer: Arc<dyn NotificationProducer>,
) -> Result<UsersContext<S>, DispatchError> {
    let context = BoundedContext::builder(router)
        .producer(producer)
        .create(CreateUserHandler)?
        .query_one(GetUserHandler)?
        .query_many(GetAllUsersHandler)?
        .update(UpdateUserHandler)?
        .delete(DeleteUserHandler)?
        .build();

    Ok(context)
}

/// In-memory user store with the same constraints as the `users` table.
pub fn in_memory_store() -> InMemoryStore<User> {
    InMemoryStore::new()
        .with_table(<User as PgEntity>::TABLE)
        .with_unique_constraint("users_username_key", |user: &User| user.username.clone())
        .with_unique_constraint("users_email_key", |user: &User| user.email.clone())
}
