//! Dispatch error types.

use common::EntityId;
use store::{StoreError, Version};
use thiserror::Error;

/// Errors that can occur while constructing or dispatching messages.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A command or query was built from malformed input.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No handler is registered for the message type.
    #[error("No handler registered for {message_type}")]
    NoHandler { message_type: &'static str },

    /// A handler is already registered for the message type.
    #[error("Handler already registered for {message_type}")]
    DuplicateHandler { message_type: &'static str },

    /// The entity changed between read and write.
    #[error(
        "Concurrent modification of {entity_type} {entity_id}: expected version {expected}"
    )]
    ConcurrentModification {
        entity_type: &'static str,
        entity_id: EntityId,
        expected: Version,
    },

    /// The store rejected the write, e.g. a uniqueness violation.
    #[error("Persistence conflict: {constraint}")]
    PersistenceConflict { constraint: String },

    /// The backing store failed.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl DispatchError {
    /// Shorthand for an `InvalidArgument` error.
    pub fn invalid(message: impl Into<String>) -> Self {
        DispatchError::InvalidArgument(message.into())
    }

    /// Returns true for conflicts a caller may resolve by retrying with fresh state.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DispatchError::ConcurrentModification { .. }
                | DispatchError::PersistenceConflict { .. }
        )
    }
}

impl From<StoreError> for DispatchError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation { constraint } => {
                DispatchError::PersistenceConflict { constraint }
            }
            other => DispatchError::Store(other),
        }
    }
}
