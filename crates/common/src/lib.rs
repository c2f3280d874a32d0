//! Shared identifier types for the CQRS bounded-context engine.

pub mod types;

pub use types::{EntityId, MessageId};
