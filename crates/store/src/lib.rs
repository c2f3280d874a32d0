//! Backing-store layer for the CQRS bounded-context engine.
//!
//! This crate provides:
//! - [`PersistedEntity`] and [`Version`], the contract every managed entity satisfies
//! - [`EntityStore`], the relational primitives a bounded context relies on,
//!   including the atomic version-conditioned update
//! - [`ConnectionRouter`] for read-write / read-only routing
//! - [`InMemoryStore`] and [`PgStore`] implementations

pub mod entity;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod router;
pub mod store;

pub use common::EntityId;
pub use entity::{PersistedEntity, Version};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::{PgEntity, PgStore};
pub use router::ConnectionRouter;
pub use store::{EntityStore, EntityStoreExt};
