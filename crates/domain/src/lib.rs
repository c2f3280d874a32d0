//! CQRS dispatch engine for bounded contexts backed by a relational store.
//!
//! This crate provides:
//! - Message model ([`DomainMessage`], command and query capability traits)
//! - Handler traits and the [`HandlerRegistry`] binding one handler per message type
//! - [`BoundedContext`], the dispatcher with optimistic locking on update
//! - Domain notifications emitted after successful writes
//! - The `users` bounded context as reference wiring

pub mod context;
pub mod error;
pub mod field;
pub mod handler;
pub mod message;
pub mod notification;
pub mod registry;
pub mod users;

pub use context::{BoundedContext, BoundedContextBuilder};
pub use error::DispatchError;
pub use field::FieldUpdate;
pub use handler::{CreateHandler, DeleteHandler, ManyQueryHandler, OneQueryHandler, UpdateHandler};
pub use message::{
    CreateCommand, DeleteCommand, DomainCommand, DomainMessage, DomainQuery, ManyQuery,
    MessageMeta, OneQuery, UpdateCommand,
};
pub use notification::{
    ChannelProducer, DomainNotification, LoggingProducer, NoopProducer, NotificationError,
    NotificationKind, NotificationProducer,
};
pub use registry::{Capability, HandlerRegistry};
pub use users::{
    CreateUser, DeleteUser, GetAllUsers, GetUser, UpdateUser, User, UserView, UsersContext,
};
