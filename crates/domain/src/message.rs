//! Message model: commands and queries.

use chrono::{DateTime, Utc};
use common::{EntityId, MessageId};
use serde::{Deserialize, Serialize};
use store::Version;

/// Identity and issue time carried by every message.
///
/// Fields are private so they cannot change after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMeta {
    message_id: MessageId,
    created_at: DateTime<Utc>,
}

impl MessageMeta {
    /// Creates metadata with a fresh message ID issued now.
    pub fn new() -> Self {
        Self {
            message_id: MessageId::new(),
            created_at: Utc::now(),
        }
    }

    /// Creates metadata from known parts, e.g. when replaying a logged message.
    pub fn from_parts(message_id: MessageId, created_at: DateTime<Utc>) -> Self {
        Self {
            message_id,
            created_at,
        }
    }

    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Default for MessageMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Base trait of every command and query.
///
/// Handlers are resolved by the concrete type implementing this trait.
pub trait DomainMessage: Send + Sync + 'static {
    fn meta(&self) -> &MessageMeta;

    fn message_id(&self) -> MessageId {
        self.meta().message_id()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.meta().created_at()
    }
}

/// A message that mutates state.
pub trait DomainCommand: DomainMessage {}

/// Command populating a brand-new entity.
pub trait CreateCommand: DomainCommand {}

/// Command changing some fields of one existing entity.
pub trait UpdateCommand: DomainCommand {
    /// Entity to update.
    fn target_id(&self) -> EntityId;

    /// Version the caller last observed, if it wants the write pinned to it.
    ///
    /// When None, the version read just before the write is used.
    fn expected_version(&self) -> Option<Version> {
        None
    }
}

/// Command removing one existing entity.
pub trait DeleteCommand: DomainCommand {
    fn target_id(&self) -> EntityId;
}

/// A message that reads state.
pub trait DomainQuery: DomainMessage {}

/// Query expecting zero or one entity.
pub trait OneQuery: DomainQuery {}

/// Query expecting zero or more entities.
pub trait ManyQuery: DomainQuery {}
